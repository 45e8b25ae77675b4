use std::str::FromStr;
use std::time::Duration;

use crate::cli::ServiceParams;
use crate::types::constant::{SQS_MAX_BATCH_SIZE, SQS_MAX_VISIBILITY_TIMEOUT_SECONDS, SQS_MAX_WAIT_SECONDS};
use crate::worker::evaluator::rules::GradingRules;
use crate::GraderError;

/// Validated worker parameters
#[derive(Debug, Clone)]
pub struct WorkerParams {
    pub max_batch_size: usize,
    pub poll_wait: Duration,
    pub visibility_timeout: Duration,
    pub concurrency_limit: usize,
    pub idle_backoff_initial: Duration,
    pub idle_backoff_max: Duration,
    pub ack_max_attempts: u32,
    pub answer_key_ttl: Duration,
    pub grading_rules: GradingRules,
    pub graceful_shutdown_timeout: Duration,
}

impl Default for WorkerParams {
    fn default() -> Self {
        Self {
            max_batch_size: SQS_MAX_BATCH_SIZE,
            poll_wait: Duration::from_secs(SQS_MAX_WAIT_SECONDS),
            visibility_timeout: Duration::from_secs(60),
            concurrency_limit: 8,
            idle_backoff_initial: Duration::from_millis(500),
            idle_backoff_max: Duration::from_secs(30),
            ack_max_attempts: 3,
            answer_key_ttl: Duration::from_secs(300),
            grading_rules: GradingRules::default(),
            graceful_shutdown_timeout: Duration::from_secs(120),
        }
    }
}

impl TryFrom<ServiceParams> for WorkerParams {
    type Error = GraderError;
    fn try_from(args: ServiceParams) -> Result<Self, Self::Error> {
        if args.max_batch_size == 0 || args.max_batch_size > SQS_MAX_BATCH_SIZE {
            return Err(GraderError::ConfigError(format!(
                "Max batch size must be between 1 and {}, got {}",
                SQS_MAX_BATCH_SIZE, args.max_batch_size
            )));
        }
        if args.poll_wait_seconds > SQS_MAX_WAIT_SECONDS {
            return Err(GraderError::ConfigError(format!(
                "Poll wait must be at most {} seconds, got {}",
                SQS_MAX_WAIT_SECONDS, args.poll_wait_seconds
            )));
        }
        if args.visibility_timeout_seconds == 0 || args.visibility_timeout_seconds > SQS_MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(GraderError::ConfigError(format!(
                "Visibility timeout must be between 1 and {} seconds, got {}",
                SQS_MAX_VISIBILITY_TIMEOUT_SECONDS, args.visibility_timeout_seconds
            )));
        }
        if args.concurrency_limit == 0 {
            return Err(GraderError::ConfigError("Concurrency limit must be at least 1".to_string()));
        }
        if args.idle_backoff_initial_ms == 0 || args.idle_backoff_initial_ms > args.idle_backoff_max_ms {
            return Err(GraderError::ConfigError(format!(
                "Idle backoff must satisfy 0 < initial ({}) <= max ({})",
                args.idle_backoff_initial_ms, args.idle_backoff_max_ms
            )));
        }
        if args.ack_max_attempts == 0 {
            return Err(GraderError::ConfigError("Acknowledge attempts must be at least 1".to_string()));
        }
        let grading_rules = GradingRules::from_str(&args.grading_rules)
            .map_err(|e| GraderError::ConfigError(format!("Invalid grading rules: {e}")))?;

        Ok(Self {
            max_batch_size: args.max_batch_size,
            poll_wait: Duration::from_secs(args.poll_wait_seconds),
            visibility_timeout: Duration::from_secs(args.visibility_timeout_seconds),
            concurrency_limit: args.concurrency_limit,
            idle_backoff_initial: Duration::from_millis(args.idle_backoff_initial_ms),
            idle_backoff_max: Duration::from_millis(args.idle_backoff_max_ms),
            ack_max_attempts: args.ack_max_attempts,
            answer_key_ttl: Duration::from_secs(args.answer_key_ttl_seconds),
            grading_rules,
            graceful_shutdown_timeout: Duration::from_secs(args.graceful_shutdown_timeout_seconds),
        })
    }
}
