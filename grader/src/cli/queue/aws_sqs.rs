use clap::Args;

/// Parameters used to config AWS SQS.
#[derive(Debug, Clone, Args)]
pub struct AWSSQSCliArgs {
    /// The name or URL of the submission queue.
    /// A bare name is resolved to its URL at startup.
    #[arg(env = "QUIZ_GRADER_AWS_SQS_QUEUE_IDENTIFIER", long = "aws-sqs-queue-identifier")]
    pub queue_identifier: Option<String>,
}
