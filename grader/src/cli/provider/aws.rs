use clap::Args;
use url::Url;

/// Parameters used to config AWS.
#[derive(Debug, Clone, Args)]
pub struct AWSConfigCliArgs {
    /// Region of the queue. Falls back to the standard AWS environment chain.
    #[arg(env = "QUIZ_GRADER_AWS_REGION", long)]
    pub aws_region: Option<String>,

    /// Endpoint override, e.g. a localstack URL.
    #[arg(env = "QUIZ_GRADER_AWS_ENDPOINT_URL", long)]
    pub aws_endpoint_url: Option<Url>,
}
