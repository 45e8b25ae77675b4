pub mod grading;

use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::queue::QueueError;
pub use grading::GradingError;

/// Result type for grader operations
pub type GraderResult<T> = Result<T, GraderError>;

/// Errors that can stop the grader.
///
/// Only startup and setup paths return these. Per-job failures are
/// [`GradingError`]s and never leave the poll loop.
#[derive(Error, Debug)]
pub enum GraderError {
    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Resource Setup error
    #[error("Resource setup error: {0}")]
    ResourceSetupError(String),

    /// Worker error
    #[error("Worker error: {0}")]
    WorkerError(String),

    #[error("Grader Error: {0}")]
    GraderAnyHowError(#[from] anyhow::Error),
}
