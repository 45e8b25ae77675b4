use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::core::config::Config;
use crate::worker::controller::grading_worker::{GradingWorker, WorkerStats};
use crate::{GraderError, GraderResult};

/// Owns the running poll loop and stops it on shutdown
pub struct WorkerController {
    worker: Arc<GradingWorker>,
    handle: Option<JoinHandle<WorkerStats>>,
    cancellation_token: CancellationToken,
}

impl WorkerController {
    /// new - Create a new WorkerController
    /// # Arguments
    /// * `config` - The configuration for the worker
    /// * `cancellation_token` - Token for coordinated shutdown; the worker gets a child of it
    pub fn new(config: Arc<Config>, cancellation_token: CancellationToken) -> Self {
        let worker = Arc::new(GradingWorker::new(config, cancellation_token.child_token()));
        Self { worker, handle: None, cancellation_token }
    }

    /// Spawns the poll loop in the background. Calling it twice is an error.
    pub fn start(&mut self) -> GraderResult<()> {
        if self.handle.is_some() {
            return Err(GraderError::WorkerError("Grading worker already started".to_string()));
        }
        let worker = self.worker.clone();
        self.handle = Some(tokio::spawn(async move { worker.run().await }.instrument(info_span!("grading_worker"))));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// shutdown - Stop polling and wait until every in-flight job finished.
    /// # Returns
    /// * `GraderResult<WorkerStats>` - Counters of the finished run
    pub async fn shutdown(mut self) -> GraderResult<WorkerStats> {
        info!("Shutting down grading worker");
        self.cancellation_token.cancel();
        let Some(handle) = self.handle.take() else {
            return Ok(WorkerStats::default());
        };
        handle.await.map_err(|e| GraderError::WorkerError(format!("Grading worker task failed: {e}")))
    }
}
