pub mod constant;
pub mod error;
pub mod mongodb;

use crate::types::{CanonicalQuestion, GradingResult};
use async_trait::async_trait;
pub use error::DatabaseError;

/// Durable storage of grading results, keyed by submission id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// exists - Idempotency check: has this submission already been graded?
    ///
    /// Best-effort only. Two workers can both see `false` for the same id; the
    /// unique key behind [`ResultStore::save`] settles that race.
    async fn exists(&self, submission_id: &str) -> Result<bool, DatabaseError>;

    /// save - Persist a result.
    ///
    /// Returns [`DatabaseError::DuplicateKey`] when a result for the same
    /// submission id is already stored. Any other error leaves nothing stored.
    async fn save(&self, result: &GradingResult) -> Result<(), DatabaseError>;

    /// Perform a health check on the store
    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Read access to the canonical questions owned by the CRUD layer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerKeyProvider: Send + Sync {
    /// Fetches the canonical questions for the given ids.
    /// Unknown ids are simply absent from the returned vector.
    async fn fetch_questions(&self, question_ids: &[String]) -> Result<Vec<CanonicalQuestion>, DatabaseError>;
}
