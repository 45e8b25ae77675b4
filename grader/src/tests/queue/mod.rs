use std::time::Duration;

use rstest::*;
use uuid::Uuid;

use crate::core::client::queue::sqs::{InnerSQS, SQS};
use crate::core::client::queue::QueueClient;
use crate::setup::setup_queue;
use crate::tests::common::submission_payload;
use crate::types::params::{AWSCredentials, QueueArgs, QueueIdentifier, QueueSetupArgs};

/// Region and endpoint come from `AWS_REGION` and `QUIZ_GRADER_AWS_ENDPOINT_URL`,
/// e.g. a LocalStack container.
fn aws_credentials() -> color_eyre::Result<AWSCredentials> {
    let endpoint_url = std::env::var("QUIZ_GRADER_AWS_ENDPOINT_URL").ok().map(|url| url.parse::<url::Url>()).transpose()?;
    Ok(AWSCredentials { region: std::env::var("AWS_REGION").ok(), endpoint_url })
}

#[rstest]
#[tokio::test]
#[ignore] // Requires AWS credentials and a reachable SQS endpoint
async fn polled_job_disappears_once_acknowledged() -> color_eyre::Result<()> {
    let aws_config = aws_credentials()?.get_aws_config().await?;
    let queue_identifier = QueueIdentifier::Name(format!("quiz_grader_test_{}", Uuid::new_v4().simple()));
    let setup_args = QueueSetupArgs {
        queue_identifier: queue_identifier.clone(),
        visibility_timeout_seconds: 30,
        dlq_max_receive_count: Some(3),
    };
    let inner = InnerSQS::new(&aws_config);
    setup_queue(&inner, &setup_args).await?;
    // A second run finds the queue and leaves it alone
    setup_queue(&inner, &setup_args).await?;

    let queue = SQS::create(&QueueArgs { queue_identifier: queue_identifier.clone() }, Duration::from_secs(30), &aws_config)
        .await?;
    queue.health_check().await?;
    let payload = submission_payload("s1", &[("q1", "4")]);
    inner.client().send_message().queue_url(queue.queue_url()).message_body(&payload).send().await?;

    let jobs = queue.poll(10, Duration::from_secs(5)).await?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].raw_body(), payload);
    assert_eq!(jobs[0].receive_count(), 1);

    queue.acknowledge(&jobs[0]).await?;
    assert!(queue.poll(10, Duration::from_secs(1)).await?.is_empty());

    for name in [queue_identifier.queue_name().to_string(), queue_identifier.dead_letter_queue_name()] {
        let url = inner.get_queue_url_from_client(&name).await?;
        inner.client().delete_queue().queue_url(url).send().await?;
    }
    Ok(())
}
