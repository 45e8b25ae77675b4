use clap::Args;

/// Tuning knobs of the grading worker.
#[derive(Debug, Clone, Args)]
pub struct ServiceCliArgs {
    /// Maximum number of jobs pulled per poll (1-10).
    #[arg(env = "QUIZ_GRADER_MAX_BATCH_SIZE", long, default_value_t = 10)]
    pub max_batch_size: usize,

    /// Long-poll wait in seconds (0-20).
    #[arg(env = "QUIZ_GRADER_POLL_WAIT_SECONDS", long, default_value_t = 20)]
    pub poll_wait_seconds: u64,

    /// How long a received job stays hidden from other consumers.
    #[arg(env = "QUIZ_GRADER_VISIBILITY_TIMEOUT_SECONDS", long, default_value_t = 60)]
    pub visibility_timeout_seconds: u64,

    /// Maximum number of jobs graded concurrently.
    #[arg(env = "QUIZ_GRADER_CONCURRENCY_LIMIT", long, default_value_t = 8)]
    pub concurrency_limit: usize,

    /// First delay after an empty or failed poll, in milliseconds.
    #[arg(env = "QUIZ_GRADER_IDLE_BACKOFF_INITIAL_MS", long, default_value_t = 500)]
    pub idle_backoff_initial_ms: u64,

    /// Cap of the delay between empty or failed polls, in milliseconds.
    #[arg(env = "QUIZ_GRADER_IDLE_BACKOFF_MAX_MS", long, default_value_t = 30_000)]
    pub idle_backoff_max_ms: u64,

    /// Attempts made to acknowledge a job before leaving it to expire.
    #[arg(env = "QUIZ_GRADER_ACK_MAX_ATTEMPTS", long, default_value_t = 3)]
    pub ack_max_attempts: u32,

    /// How long a cached canonical answer stays fresh.
    #[arg(env = "QUIZ_GRADER_ANSWER_KEY_TTL_SECONDS", long, default_value_t = 300)]
    pub answer_key_ttl_seconds: u64,

    /// Per-subject answer rules, e.g. `default=case-insensitive,math=numeric:0.001`.
    #[arg(env = "QUIZ_GRADER_GRADING_RULES", long, default_value = "default=case-insensitive")]
    pub grading_rules: String,

    /// Time given to in-flight jobs to finish after a shutdown signal.
    #[arg(env = "QUIZ_GRADER_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS", long, default_value_t = 120)]
    pub graceful_shutdown_timeout_seconds: u64,
}
