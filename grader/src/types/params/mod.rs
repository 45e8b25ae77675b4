pub mod cloud_provider;
pub mod database;
pub mod service;

pub use cloud_provider::AWSCredentials;
pub use database::DatabaseArgs;
pub use service::WorkerParams;

use crate::cli::{RunCmd, SetupCmd};
use crate::types::constant::{DLQ_SUFFIX, SQS_MAX_VISIBILITY_TIMEOUT_SECONDS};
use crate::{GraderError, GraderResult};
use std::fmt;

/// How the submission queue is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueIdentifier {
    /// A queue URL, used as is
    Url(String),
    /// A queue name, resolved to a URL through the SQS API
    Name(String),
}

impl QueueIdentifier {
    pub fn parse(identifier: &str) -> GraderResult<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(GraderError::ConfigError("Queue identifier is empty".to_string()));
        }
        if identifier.starts_with("https://") || identifier.starts_with("http://") {
            Ok(Self::Url(identifier.to_string()))
        } else {
            Ok(Self::Name(identifier.to_string()))
        }
    }

    /// Name of the queue, taken from the last path segment for URLs
    pub fn queue_name(&self) -> &str {
        match self {
            Self::Url(url) => url.trim_end_matches('/').rsplit('/').next().unwrap_or(url),
            Self::Name(name) => name,
        }
    }

    pub fn dead_letter_queue_name(&self) -> String {
        format!("{}{}", self.queue_name(), DLQ_SUFFIX)
    }
}

impl fmt::Display for QueueIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// QueueArgs - Arguments used to reach (and set up) the submission queue
#[derive(Debug, Clone)]
pub struct QueueArgs {
    pub queue_identifier: QueueIdentifier,
}

fn queue_identifier_from(identifier: Option<&String>) -> GraderResult<QueueIdentifier> {
    let identifier = identifier
        .ok_or_else(|| GraderError::ConfigError("Queue identifier is required (QUIZ_GRADER_AWS_SQS_QUEUE_IDENTIFIER)".to_string()))?;
    QueueIdentifier::parse(identifier)
}

impl TryFrom<RunCmd> for QueueArgs {
    type Error = GraderError;
    fn try_from(run_cmd: RunCmd) -> Result<Self, Self::Error> {
        Ok(Self { queue_identifier: queue_identifier_from(run_cmd.aws_sqs_args.queue_identifier.as_ref())? })
    }
}

/// QueueSetupArgs - Arguments used to create the submission queue
#[derive(Debug, Clone)]
pub struct QueueSetupArgs {
    pub queue_identifier: QueueIdentifier,
    pub visibility_timeout_seconds: u64,
    pub dlq_max_receive_count: Option<u32>,
}

impl TryFrom<SetupCmd> for QueueSetupArgs {
    type Error = GraderError;
    fn try_from(setup_cmd: SetupCmd) -> Result<Self, Self::Error> {
        let queue_identifier = queue_identifier_from(setup_cmd.aws_sqs_args.queue_identifier.as_ref())?;
        if setup_cmd.visibility_timeout_seconds == 0
            || setup_cmd.visibility_timeout_seconds > SQS_MAX_VISIBILITY_TIMEOUT_SECONDS
        {
            return Err(GraderError::ConfigError(format!(
                "Visibility timeout must be between 1 and {} seconds, got {}",
                SQS_MAX_VISIBILITY_TIMEOUT_SECONDS, setup_cmd.visibility_timeout_seconds
            )));
        }
        if setup_cmd.dlq_max_receive_count == Some(0) {
            return Err(GraderError::ConfigError("Dead-letter max receive count must be at least 1".to_string()));
        }
        Ok(Self {
            queue_identifier,
            visibility_timeout_seconds: setup_cmd.visibility_timeout_seconds,
            dlq_max_receive_count: setup_cmd.dlq_max_receive_count,
        })
    }
}
