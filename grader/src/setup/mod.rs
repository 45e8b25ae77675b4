use std::collections::HashMap;

use aws_sdk_sqs::types::QueueAttributeName;
use tracing::{debug, info};

use crate::cli::SetupCmd;
use crate::core::client::database::mongodb::MongoDbClient;
use crate::core::client::database::ResultStore;
use crate::core::client::queue::sqs::InnerSQS;
use crate::types::params::{AWSCredentials, DatabaseArgs, QueueIdentifier, QueueSetupArgs};
use crate::{GraderError, GraderResult};

/// Setup function that creates every resource the worker relies on
pub async fn setup(setup_cmd: &SetupCmd) -> GraderResult<()> {
    let queue_args = QueueSetupArgs::try_from(setup_cmd.clone())?;
    let database_args = DatabaseArgs::try_from(setup_cmd.mongodb_args.clone())?;
    debug!("Queue Params: {:?}", queue_args);

    info!("Setting up resources for Quiz Grader...");

    let aws_config = AWSCredentials::from(setup_cmd.aws_config_args.clone()).get_aws_config().await?;
    setup_queue(&InnerSQS::new(&aws_config), &queue_args).await?;
    setup_result_store(&database_args).await?;

    info!("Quiz Grader setup completed");
    Ok(())
}

async fn queue_exists(sqs: &InnerSQS, queue_name: &str) -> bool {
    sqs.client().get_queue_url().queue_name(queue_name).send().await.is_ok()
}

/// Creates a queue by name and returns its URL
async fn create_queue(sqs: &InnerSQS, queue_name: &str) -> GraderResult<String> {
    let output = sqs.client().create_queue().queue_name(queue_name).send().await.map_err(|e| {
        GraderError::ResourceSetupError(format!("Failed to create SQS queue '{}': {}", queue_name, e))
    })?;
    output
        .queue_url()
        .map(str::to_string)
        .ok_or_else(|| GraderError::ResourceSetupError(format!("No queue url returned for '{}'", queue_name)))
}

/// setup_queue - Create the submission queue
///
/// An existing queue is left untouched. When a max receive count is given, a dead
/// letter queue named `<queue>_dlq` is created too and attached through a redrive
/// policy. Queues addressed by URL are only checked for existence.
pub async fn setup_queue(sqs: &InnerSQS, args: &QueueSetupArgs) -> GraderResult<()> {
    let queue_name = match &args.queue_identifier {
        QueueIdentifier::Url(url) => {
            sqs.client()
                .get_queue_attributes()
                .queue_url(url)
                .attribute_names(QueueAttributeName::QueueArn)
                .send()
                .await
                .map_err(|e| GraderError::ResourceSetupError(format!("Queue '{}' is not reachable: {}", url, e)))?;
            info!(" ⏭️️ Queue url provided and reachable, skipping creation: {}", url);
            return Ok(());
        }
        QueueIdentifier::Name(name) => name,
    };

    if queue_exists(sqs, queue_name).await {
        info!(" ⏭️️ SQS queue already exists: {}", queue_name);
        return Ok(());
    }

    let queue_url = create_queue(sqs, queue_name).await?;
    info!("Queue created: {}", queue_name);

    let mut attributes = HashMap::new();
    attributes.insert(QueueAttributeName::VisibilityTimeout, args.visibility_timeout_seconds.to_string());

    if let Some(max_receive_count) = args.dlq_max_receive_count {
        let dlq_name = args.queue_identifier.dead_letter_queue_name();
        let dlq_url = match sqs.get_queue_url_from_client(&dlq_name).await {
            Ok(url) => {
                info!(" ⏭️️ DL queue already exists: {}", dlq_name);
                url
            }
            Err(_) => {
                let url = create_queue(sqs, &dlq_name).await?;
                info!("DL queue created: {}", dlq_name);
                url
            }
        };
        let dlq_arn = sqs.get_queue_arn_from_url(&dlq_url).await?;
        attributes.insert(QueueAttributeName::RedrivePolicy, redrive_policy(&dlq_arn, max_receive_count));
    }

    sqs.client()
        .set_queue_attributes()
        .queue_url(&queue_url)
        .set_attributes(Some(attributes))
        .send()
        .await
        .map_err(|e| GraderError::ResourceSetupError(format!("Failed to configure queue '{}': {}", queue_name, e)))?;
    info!("Setup completed for queue: {}", queue_name);
    Ok(())
}

fn redrive_policy(dlq_arn: &str, max_receive_count: u32) -> String {
    format!(r#"{{"deadLetterTargetArn":"{}","maxReceiveCount":"{}"}}"#, dlq_arn, max_receive_count)
}

/// Verifies the database is reachable and creates the unique index on `submission_id`
pub async fn setup_result_store(args: &DatabaseArgs) -> GraderResult<()> {
    let database = MongoDbClient::new(args).await?;
    database.health_check().await?;
    database.ensure_indexes().await?;
    info!("Result store ready: {}", database.database_name());
    Ok(())
}
