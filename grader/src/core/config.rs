use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::RunCmd;
use crate::core::client::database::mongodb::MongoDbClient;
use crate::core::client::database::{AnswerKeyProvider, ResultStore};
use crate::core::client::queue::sqs::SQS;
use crate::core::client::queue::QueueClient;
use crate::types::params::{AWSCredentials, DatabaseArgs, QueueArgs, WorkerParams};
use crate::worker::answer_key_cache::AnswerKeyCache;
use crate::GraderResult;

/// The dependencies of the grading worker.
///
/// Everything is constructed once at startup and handed to the worker, so tests
/// build a `Config` from in-memory doubles through [`Config::new`].
pub struct Config {
    params: WorkerParams,
    queue: Arc<dyn QueueClient>,
    store: Arc<dyn ResultStore>,
    answer_keys: Arc<AnswerKeyCache>,
}

impl Config {
    pub fn new(
        params: WorkerParams,
        queue: Arc<dyn QueueClient>,
        store: Arc<dyn ResultStore>,
        answer_key_provider: Arc<dyn AnswerKeyProvider>,
    ) -> Self {
        let answer_keys = Arc::new(AnswerKeyCache::new(answer_key_provider, params.answer_key_ttl));
        Self { params, queue, store, answer_keys }
    }

    /// Builds the production configuration: SQS queue, MongoDB store and the answer-key cache.
    ///
    /// Fails fast on any configuration problem. The queue URL must resolve, the
    /// database must answer a ping and the unique index on `submission_id` must exist
    /// before a single message is polled.
    pub async fn from_run_cmd(run_cmd: &RunCmd) -> GraderResult<Self> {
        let params = WorkerParams::try_from(run_cmd.service_args.clone())?;
        let queue_args = QueueArgs::try_from(run_cmd.clone())?;
        let database_args = DatabaseArgs::try_from(run_cmd.mongodb_args.clone())?;
        debug!(?params, "Worker parameters validated");

        let aws_config = AWSCredentials::from(run_cmd.aws_config_args.clone()).get_aws_config().await?;
        let queue = SQS::create(&queue_args, params.visibility_timeout, &aws_config).await?;
        queue.health_check().await?;
        info!(queue_url = %queue.queue_url(), "Submission queue reachable");

        let database = Arc::new(MongoDbClient::new(&database_args).await?);
        database.health_check().await?;
        database.ensure_indexes().await?;
        info!(database = %database.database_name(), "Result store reachable");

        Ok(Self::new(params, Arc::new(queue), database.clone(), database))
    }

    pub fn params(&self) -> &WorkerParams {
        &self.params
    }

    pub fn queue(&self) -> &Arc<dyn QueueClient> {
        &self.queue
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn answer_keys(&self) -> &AnswerKeyCache {
        &self.answer_keys
    }
}
