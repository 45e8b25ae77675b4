use std::sync::Arc;

use futures::FutureExt;
use tokio::task::{JoinError, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::config::Config;
use crate::worker::backoff::Backoff;
use crate::worker::service::{GradingService, JobOutcome};

/// Counters for one run of the poll loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub polled: usize,
    pub acknowledged: usize,
    pub acknowledge_failed: usize,
    pub left_for_redelivery: usize,
    pub panicked: usize,
}

impl WorkerStats {
    /// Counts a finished task and reports whether its job was acknowledged
    fn record(&mut self, result: Result<JobOutcome, JoinError>) -> bool {
        match result {
            Ok(JobOutcome::Acknowledged(_)) => {
                self.acknowledged += 1;
                return true;
            }
            Ok(JobOutcome::AcknowledgeFailed(_)) => self.acknowledge_failed += 1,
            Ok(JobOutcome::LeftForRedelivery) => self.left_for_redelivery += 1,
            Err(e) => {
                error!(error = ?e, "Grading task panicked or was cancelled, job left for redelivery");
                self.panicked += 1;
            }
        }
        false
    }
}

/// Finished jobs seen since the last poll decision
#[derive(Debug, Default)]
struct RoundHealth {
    acknowledged: usize,
    failed: usize,
}

impl RoundHealth {
    fn observe(&mut self, acknowledged: bool) {
        if acknowledged {
            self.acknowledged += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Every job that finished this round failed, e.g. while the result store is down
    fn all_failed(&self) -> bool {
        self.failed > 0 && self.acknowledged == 0
    }
}

/// The poll loop.
///
/// Pulls batches only while the pool has free slots and never asks for more jobs
/// than it can start, so at most `concurrency_limit` jobs are in flight. Empty
/// and failed polls back off exponentially, and so does a round in which every
/// finished job failed, so a backlog is not drained into a down dependency.
/// The backoff resets only once a job is acknowledged. On cancellation it stops
/// polling and drains the jobs already in flight.
pub struct GradingWorker {
    config: Arc<Config>,
    cancellation_token: CancellationToken,
}

impl GradingWorker {
    pub fn new(config: Arc<Config>, cancellation_token: CancellationToken) -> Self {
        Self { config, cancellation_token }
    }

    /// Triggers a graceful shutdown
    pub fn shutdown(&self) {
        info!("Triggering shutdown for grading worker");
        self.cancellation_token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// run - Run the poll loop until cancelled, then wait for in-flight jobs.
    pub async fn run(&self) -> WorkerStats {
        let params = self.config.params();
        let concurrency_limit = params.concurrency_limit.max(1);
        let mut tasks: JoinSet<JobOutcome> = JoinSet::new();
        let mut backoff = Backoff::new(params.idle_backoff_initial, params.idle_backoff_max);
        let mut stats = WorkerStats::default();
        let mut round = RoundHealth::default();

        info!(
            concurrency_limit,
            max_batch_size = params.max_batch_size,
            poll_wait_secs = params.poll_wait.as_secs(),
            "Starting grading worker"
        );

        loop {
            // Reap whatever finished since the last round without waiting.
            while let Some(Some(result)) = tasks.join_next().now_or_never() {
                round.observe(stats.record(result));
            }

            if self.is_shutdown_requested() {
                info!("Shutdown requested, stopping polling");
                break;
            }

            if tasks.len() >= concurrency_limit {
                debug!(in_flight = tasks.len(), "Worker pool saturated, waiting for a free slot");
                tokio::select! {
                    biased;
                    _ = self.cancellation_token.cancelled() => break,
                    Some(result) = tasks.join_next() => round.observe(stats.record(result)),
                }
                continue;
            }

            if round.all_failed() {
                let delay = backoff.next_delay();
                warn!(
                    failed_jobs = round.failed,
                    consecutive_failures = backoff.consecutive_idle(),
                    delay_ms = delay.as_millis() as u64,
                    "Every finished job failed, backing off before the next poll"
                );
                round = RoundHealth::default();
                tokio::select! {
                    biased;
                    _ = self.cancellation_token.cancelled() => break,
                    _ = sleep(delay) => {}
                }
                continue;
            }
            if round.acknowledged > 0 {
                backoff.reset();
            }
            round = RoundHealth::default();

            let free_slots = concurrency_limit - tasks.len();
            let request = free_slots.min(params.max_batch_size);
            let polled = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => break,
                polled = self.config.queue().poll(request, params.poll_wait) => polled,
            };

            let delay = match polled {
                Ok(jobs) if !jobs.is_empty() => {
                    stats.polled += jobs.len();
                    debug!(count = jobs.len(), in_flight = tasks.len(), "Dispatching polled jobs");
                    for job in jobs {
                        tasks.spawn(GradingService::handle_job(job, self.config.clone()));
                    }
                    continue;
                }
                Ok(_) => {
                    let delay = backoff.next_delay();
                    debug!(delay_ms = delay.as_millis() as u64, "No jobs available, backing off");
                    delay
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        consecutive_failures = backoff.consecutive_idle(),
                        delay_ms = delay.as_millis() as u64,
                        "Failed to poll queue, backing off"
                    );
                    delay
                }
            };

            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        info!(in_flight = tasks.len(), "Waiting for in-flight jobs to complete");
        while let Some(result) = tasks.join_next().await {
            stats.record(result);
        }
        info!(?stats, "Grading worker stopped");
        stats
    }
}
