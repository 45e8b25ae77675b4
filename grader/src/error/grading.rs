use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::worker::decoder::DecodeError;

/// Why a single job could not be graded.
///
/// The variant decides what happens to the job: poison payloads are acknowledged
/// and dropped, everything else is left unacknowledged so the queue redelivers it
/// once the visibility timeout expires.
#[derive(Error, Debug)]
pub enum GradingError {
    #[error("Poison payload: {0}")]
    Poison(#[from] DecodeError),

    #[error("Failed to resolve answer key: {0}")]
    AnswerKey(#[source] DatabaseError),

    #[error("Result store error: {0}")]
    Store(#[source] DatabaseError),
}

impl GradingError {
    /// Whether a redelivery of the same job can succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GradingError::Poison(_))
    }
}
