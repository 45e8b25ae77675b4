use std::time::Duration;

/// Points a question is worth when its record does not say otherwise
pub const DEFAULT_QUESTION_POINTS: f64 = 1.0;

/// SQS refuses to return more than ten messages per receive call
pub const SQS_MAX_BATCH_SIZE: usize = 10;

/// Upper bound SQS accepts for long-poll wait time
pub const SQS_MAX_WAIT_SECONDS: u64 = 20;

/// Upper bound SQS accepts for a visibility timeout (12 hours)
pub const SQS_MAX_VISIBILITY_TIMEOUT_SECONDS: u64 = 43_200;

pub const DLQ_SUFFIX: &str = "_dlq";

/// First pause between acknowledge attempts; doubles on every retry
pub const ACK_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(200);

pub const ACK_RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
