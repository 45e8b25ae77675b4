use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::core::client::queue::QueueError;
use crate::core::config::Config;
use crate::error::GradingError;
use crate::types::constant::{ACK_RETRY_INITIAL_DELAY, ACK_RETRY_MAX_DELAY};
use crate::types::Job;
use crate::worker::backoff::Backoff;
use crate::worker::decoder::decode;
use crate::worker::evaluator::evaluate;

/// Terminal state of a job that needs no further processing.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDisposition {
    /// A new result was persisted
    Graded { submission_id: String, score: f64, max_score: f64 },
    /// The existence check found an existing result
    AlreadyGraded { submission_id: String },
    /// Another delivery persisted the result between the existence check and the save
    DuplicateResult { submission_id: String },
    /// The payload can never be decoded
    Poison,
}

/// What happened to a job once the pipeline finished with it.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Acknowledged(JobDisposition),
    /// Processing finished but every acknowledge attempt failed; the queue will
    /// redeliver the job and the idempotency guard collapses the retry.
    AcknowledgeFailed(JobDisposition),
    /// A retryable failure; the job reappears after its visibility timeout.
    LeftForRedelivery,
}

pub struct GradingService;

impl GradingService {
    /// Runs one job through decode, idempotency check, evaluation, persistence and
    /// acknowledgement, inside a span carrying the job's identifiers.
    ///
    /// Never fails: every error is classified into a [`JobOutcome`] so sibling jobs
    /// and the poll loop are unaffected.
    pub async fn handle_job(job: Job, config: Arc<Config>) -> JobOutcome {
        let span = Self::create_job_span(&job);
        async move {
            if job.is_redelivery() {
                warn!(receive_count = job.receive_count(), "Job redelivered");
            }

            let disposition = match Self::grade(&job, &config).await {
                Ok(disposition) => disposition,
                Err(err) if !err.is_retryable() => {
                    error!(error = %err, raw_payload = %job.raw_body(), "Dropping poison payload");
                    JobDisposition::Poison
                }
                Err(err) => {
                    warn!(error = %err, "Grading failed, leaving job for redelivery");
                    return JobOutcome::LeftForRedelivery;
                }
            };

            match Self::acknowledge_with_retry(&job, &config).await {
                Ok(()) => {
                    debug!(?disposition, "Job acknowledged");
                    JobOutcome::Acknowledged(disposition)
                }
                Err(err) => {
                    error!(
                        error = %err,
                        attempts = config.params().ack_max_attempts,
                        "Failed to acknowledge job, it will be redelivered"
                    );
                    JobOutcome::AcknowledgeFailed(disposition)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// grade - Everything up to, but not including, acknowledgement.
    ///
    /// The result is persisted before this returns `Ok`, so acknowledging
    /// afterwards can never lose a grade.
    pub async fn grade(job: &Job, config: &Config) -> Result<JobDisposition, GradingError> {
        let submission = decode(job.body(), job.message_id())?;
        Span::current().record("submission_id", submission.submission_id.as_str());

        let store = config.store();
        if store.exists(&submission.submission_id).await.map_err(GradingError::Store)? {
            info!("Submission already graded");
            return Ok(JobDisposition::AlreadyGraded { submission_id: submission.submission_id });
        }

        let answer_key =
            config.answer_keys().resolve(&submission.question_ids()).await.map_err(GradingError::AnswerKey)?;
        let unknown = submission.answers.len() - answer_key.len();
        if unknown > 0 {
            warn!(unknown_questions = unknown, "Submission references unknown questions");
        }

        let result = evaluate(&submission, &answer_key, &config.params().grading_rules, Utc::now());

        match store.save(&result).await {
            Ok(()) => {
                info!(score = result.score, max_score = result.max_score, "Submission graded");
                Ok(JobDisposition::Graded {
                    submission_id: result.submission_id,
                    score: result.score,
                    max_score: result.max_score,
                })
            }
            Err(err) if err.is_duplicate_key() => {
                info!("Result already persisted by another delivery");
                Ok(JobDisposition::DuplicateResult { submission_id: result.submission_id })
            }
            Err(err) => Err(GradingError::Store(err)),
        }
    }

    async fn acknowledge_with_retry(job: &Job, config: &Config) -> Result<(), QueueError> {
        let max_attempts = config.params().ack_max_attempts.max(1);
        let mut backoff = Backoff::new(ACK_RETRY_INITIAL_DELAY, ACK_RETRY_MAX_DELAY);
        let mut attempt = 1;
        loop {
            match config.queue().acknowledge(job).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < max_attempts => {
                    let delay = backoff.next_delay();
                    warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "Acknowledge failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn create_job_span(job: &Job) -> Span {
        let correlation_id = Uuid::new_v4();
        info_span!(
            "grading_job",
            message_id = %job.message_id(),
            submission_id = tracing::field::Empty,
            receive_count = job.receive_count(),
            correlation_id = %correlation_id,
        )
    }
}
