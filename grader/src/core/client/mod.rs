pub mod database;
pub mod queue;

pub use database::{mongodb::MongoDbClient, AnswerKeyProvider, ResultStore};
pub use queue::{sqs::SQS, QueueClient};
