use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The unique index on `submission_id` rejected the write
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Database unavailable: {0}")]
    Unavailable(String),
}

impl DatabaseError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DatabaseError::DuplicateKey(_))
    }
}
