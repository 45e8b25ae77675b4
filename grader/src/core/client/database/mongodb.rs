use super::error::DatabaseError;
use crate::core::client::database::constant::{
    DUPLICATE_KEY_ERROR_CODE, QUIZZES_COLLECTION, RESULTS_COLLECTION, SUBMISSION_ID_INDEX_NAME,
};
use crate::core::client::database::{AnswerKeyProvider, ResultStore};
use crate::types::constant::DEFAULT_QUESTION_POINTS;
use crate::types::params::DatabaseArgs;
use crate::types::{CanonicalQuestion, GradingResult};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{AggregateOptions, CountOptions, IndexOptions};
use mongodb::{bson, Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Shape of one task after the answer-key aggregation pipeline
#[derive(Debug, Deserialize)]
struct QuestionDocument {
    question_id: String,
    #[serde(default)]
    task_text: Option<String>,
    #[serde(default)]
    correct_answers: Option<Vec<String>>,
    /// Older quizzes store a single answer
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    points: Option<f64>,
}

impl From<QuestionDocument> for CanonicalQuestion {
    fn from(document: QuestionDocument) -> Self {
        let mut correct_answers = document.correct_answers.unwrap_or_default();
        if let Some(answer) = document.correct_answer {
            if !correct_answers.contains(&answer) {
                correct_answers.push(answer);
            }
        }
        Self {
            question_id: document.question_id,
            task_text: document.task_text.unwrap_or_default(),
            correct_answers,
            points: document.points.unwrap_or(DEFAULT_QUESTION_POINTS),
        }
    }
}

/// Hex ids are matched both as ObjectIds and as plain strings
fn question_id_filter_values(question_ids: &[String]) -> Vec<Bson> {
    let mut values = Vec::with_capacity(question_ids.len() * 2);
    for id in question_ids {
        if let Ok(object_id) = ObjectId::parse_str(id) {
            values.push(Bson::ObjectId(object_id));
        }
        values.push(Bson::String(id.clone()));
    }
    values
}

fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_ERROR_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_ERROR_CODE,
        _ => false,
    }
}

/// Drains an aggregation cursor into `R`. Transport errors stay `MongoError`;
/// only documents that do not fit `R` are reported as serialization failures.
async fn collect_documents<R, S>(documents: S) -> Result<Vec<R>, DatabaseError>
where
    R: DeserializeOwned,
    S: Stream<Item = Result<Document, mongodb::error::Error>>,
{
    documents
        .map_err(|e| {
            error!(error = %e, "Error reading pipeline cursor");
            DatabaseError::MongoError(e)
        })
        .and_then(|doc| {
            futures::future::ready(bson::from_document::<R>(doc).map_err(|e| {
                error!(error = %e, "Deserialization error");
                DatabaseError::FailedToSerializeDocument(format!("Failed to deserialize: {}", e))
            }))
        })
        .try_collect()
        .await
}

/// MongoDB client implementation
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseArgs) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = Arc::new(client.database(&config.database_name));
        Ok(Self { client, database })
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    fn results_collection(&self) -> Collection<GradingResult> {
        self.database.collection(RESULTS_COLLECTION)
    }

    fn quizzes_collection(&self) -> Collection<Document> {
        self.database.collection(QUIZZES_COLLECTION)
    }

    /// Creates the unique index on `submission_id` if it is missing.
    /// Idempotent: MongoDB accepts re-creating an identical index.
    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        let options = IndexOptions::builder().unique(true).name(SUBMISSION_ID_INDEX_NAME.to_string()).build();
        let index = IndexModel::builder().keys(doc! { "submission_id": 1 }).options(options).build();
        self.results_collection().create_index(index, None).await?;
        debug!(collection = RESULTS_COLLECTION, index = SUBMISSION_ID_INDEX_NAME, "Ensured unique index");
        Ok(())
    }

    /// execute_pipeline - Execute a custom aggregation pipeline on a collection
    /// # Arguments
    /// * `collection` - The collection to execute the pipeline on
    /// * `pipeline` - The aggregation pipeline to execute
    /// * `options` - Optional aggregation options
    /// # Returns
    /// * `Result<Vec<R>, DatabaseError>` - A Result containing the pipeline results or an error
    pub async fn execute_pipeline<T, R>(
        &self,
        collection: Collection<T>,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> Result<Vec<R>, DatabaseError>
    where
        T: DeserializeOwned + Unpin + Send + Sync + Sized,
        R: DeserializeOwned + Unpin + Send + Sync + Sized,
    {
        let start = Instant::now();

        let cursor = collection.aggregate(pipeline, options).await?;
        let vec_items: Vec<R> = collect_documents(cursor).await?;

        debug!(
            result_count = vec_items.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline execution completed"
        );
        Ok(vec_items)
    }
}

#[async_trait]
impl ResultStore for MongoDbClient {
    async fn exists(&self, submission_id: &str) -> Result<bool, DatabaseError> {
        let options = CountOptions::builder().limit(1).build();
        let count = self.results_collection().count_documents(doc! { "submission_id": submission_id }, options).await?;
        Ok(count > 0)
    }

    async fn save(&self, result: &GradingResult) -> Result<(), DatabaseError> {
        let start = Instant::now();
        match self.results_collection().insert_one(result, None).await {
            Ok(_) => {
                debug!(duration_ms = start.elapsed().as_millis() as u64, "Grading result stored");
                Ok(())
            }
            Err(e) if is_duplicate_key_error(&e) => {
                warn!(submission_id = %result.submission_id, "Grading result already stored");
                Err(DatabaseError::DuplicateKey(result.submission_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[async_trait]
impl AnswerKeyProvider for MongoDbClient {
    async fn fetch_questions(&self, question_ids: &[String]) -> Result<Vec<CanonicalQuestion>, DatabaseError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = question_id_filter_values(question_ids);
        let pipeline = vec![
            doc! { "$match": { "tasks._id": { "$in": ids.clone() } } },
            doc! { "$unwind": "$tasks" },
            doc! { "$match": { "tasks._id": { "$in": ids } } },
            doc! {
                "$project": {
                    "_id": 0,
                    "question_id": { "$toString": "$tasks._id" },
                    "task_text": "$tasks.taskText",
                    "correct_answers": "$tasks.correctAnswers",
                    "correct_answer": "$tasks.correctAnswer",
                    "points": "$tasks.points",
                }
            },
        ];

        let documents: Vec<QuestionDocument> = self.execute_pipeline(self.quizzes_collection(), pipeline, None).await?;
        Ok(documents.into_iter().map(CanonicalQuestion::from).collect())
    }
}
