pub mod answer_key_cache;
pub mod backoff;
pub mod controller;
pub mod decoder;
pub mod evaluator;
pub mod service;

use std::sync::Arc;

use controller::worker_controller::WorkerController;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::config::Config;
use crate::GraderResult;

/// Initializes the grading worker with the provided configuration
///
/// Starts the poll loop in the background and returns the controller used to
/// shut it down. Cancelling `shutdown_token` stops polling as well.
///
/// # Arguments
/// * `config` - The configuration for the worker
/// * `shutdown_token` - A cancellation token to signal application shutdown
///
/// # Returns
/// * `GraderResult<WorkerController>` - The worker controller
pub async fn initialize_worker(config: Arc<Config>, shutdown_token: CancellationToken) -> GraderResult<WorkerController> {
    info!("Initializing grading worker");

    let mut controller = WorkerController::new(config, shutdown_token);
    controller.start()?;

    info!("Grading worker started");
    Ok(controller)
}
