pub mod error;
pub mod sqs;

use crate::types::Job;
use async_trait::async_trait;
pub use error::QueueError;
use std::time::Duration;

/// Trait defining queue operations
///
/// Implementations hold no state across calls besides their transport handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Long-polls for up to `max_batch` jobs, waiting at most `wait`.
    ///
    /// Returns an empty vector when nothing arrived before the wait elapsed.
    /// Every returned job is leased for the queue's visibility window and
    /// reappears for other consumers unless acknowledged before it ends.
    async fn poll(&self, max_batch: usize, wait: Duration) -> Result<Vec<Job>, QueueError>;

    /// Removes the job from the queue permanently.
    async fn acknowledge(&self, job: &Job) -> Result<(), QueueError>;

    /// Perform a health check on the queue service
    ///
    /// This method verifies that the queue exists and the necessary permissions are in place.
    async fn health_check(&self) -> Result<(), QueueError>;
}
