use clap::{Parser, Subcommand};

pub mod database;
pub mod provider;
pub mod queue;
pub mod service;

pub use service::ServiceCliArgs as ServiceParams;

#[derive(Parser, Debug)]
#[command(
    name = "quiz-grader",
    about = "Quiz Grader - queue-backed grading worker",
    long_about = "Quiz Grader consumes quiz submissions from an SQS queue, grades them against the stored \
    answer key and persists one durable result per submission.\n\n\
    Quick Start:\n  \
    quiz-grader setup --aws-sqs-queue-identifier quiz_submissions\n  \
    quiz-grader run --aws-sqs-queue-identifier quiz_submissions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the grading worker
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// Create the queue and the result-store index the worker relies on
    Setup {
        #[command(flatten)]
        setup_command: Box<SetupCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten)]
    pub aws_config_args: provider::aws::AWSConfigCliArgs,

    #[clap(flatten)]
    pub aws_sqs_args: queue::aws_sqs::AWSSQSCliArgs,

    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub service_args: service::ServiceCliArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct SetupCmd {
    #[clap(flatten)]
    pub aws_config_args: provider::aws::AWSConfigCliArgs,

    #[clap(flatten)]
    pub aws_sqs_args: queue::aws_sqs::AWSSQSCliArgs,

    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    /// Visibility timeout given to the queue when it is created.
    #[arg(env = "QUIZ_GRADER_VISIBILITY_TIMEOUT_SECONDS", long, default_value_t = 60)]
    pub visibility_timeout_seconds: u64,

    /// Receives after which a message moves to the dead-letter queue.
    /// No dead-letter queue is created when unset.
    #[arg(env = "QUIZ_GRADER_DLQ_MAX_RECEIVE_COUNT", long)]
    pub dlq_max_receive_count: Option<u32>,
}
