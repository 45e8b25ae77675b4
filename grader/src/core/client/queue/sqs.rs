use crate::core::client::queue::{QueueClient, QueueError};
use crate::types::constant::{SQS_MAX_BATCH_SIZE, SQS_MAX_WAIT_SECONDS};
use crate::types::params::{QueueArgs, QueueIdentifier};
use crate::types::Job;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName, QueueAttributeName};
use aws_sdk_sqs::Client;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct InnerSQS(Client);

impl InnerSQS {
    /// Creates a new instance of InnerSQS with the provided AWS configuration.
    pub fn new(aws_config: &SdkConfig) -> Self {
        let sqs_config_builder = aws_sdk_sqs::config::Builder::from(aws_config);
        let client = Client::from_conf(sqs_config_builder.build());
        Self(client)
    }

    pub fn client(&self) -> &Client {
        &self.0
    }

    /// get_queue_url_from_client - Get the queue URL from the client
    /// This function returns the queue URL based on the queue name.
    pub async fn get_queue_url_from_client(&self, queue_name: &str) -> Result<String, QueueError> {
        Ok(self
            .client()
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await?
            .queue_url()
            .ok_or_else(|| QueueError::FailedToGetQueueUrl(queue_name.to_string()))?
            .to_string())
    }

    /// Resolves an identifier to a queue URL; URLs are returned untouched.
    pub async fn resolve_queue_url(&self, identifier: &QueueIdentifier) -> Result<String, QueueError> {
        match identifier {
            QueueIdentifier::Url(url) => Ok(url.clone()),
            QueueIdentifier::Name(name) => self.get_queue_url_from_client(name).await,
        }
    }

    /// get_queue_arn_from_url - Get the queue ARN from the queue URL
    pub async fn get_queue_arn_from_url(&self, queue_url: &str) -> Result<String, QueueError> {
        let attributes = self
            .client()
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await?;

        attributes
            .attributes()
            .and_then(|attributes| attributes.get(&QueueAttributeName::QueueArn))
            .cloned()
            .ok_or_else(|| QueueError::FailedToGetQueueUrl(queue_url.to_string()))
    }
}

/// SQS-backed submission queue
#[derive(Clone, Debug)]
pub struct SQS {
    inner: InnerSQS,
    queue_url: String,
    visibility_timeout: Duration,
}

impl SQS {
    /// Builds the client and resolves the queue URL once, so a misconfigured
    /// queue fails at startup rather than on the first poll.
    pub async fn create(
        queue_args: &QueueArgs,
        visibility_timeout: Duration,
        aws_config: &SdkConfig,
    ) -> Result<Self, QueueError> {
        let inner = InnerSQS::new(aws_config);
        let queue_url = inner.resolve_queue_url(&queue_args.queue_identifier).await?;
        tracing::debug!(queue_url = %queue_url, "Resolved submission queue url");
        Ok(Self { inner, queue_url, visibility_timeout })
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Converts an SQS message into a job. Messages without a receipt handle
    /// cannot be acknowledged and are skipped; they reappear after their lease.
    fn job_from_message(message: &Message) -> Option<Job> {
        let Some(receipt_handle) = message.receipt_handle() else {
            tracing::error!(message_id = ?message.message_id(), "Received message without receipt handle, skipping");
            return None;
        };
        let receive_count = message
            .attributes()
            .and_then(|attributes| attributes.get(&MessageSystemAttributeName::ApproximateReceiveCount))
            .and_then(|count| count.parse::<u32>().ok())
            .unwrap_or(1);

        Some(Job::new(
            message.message_id().unwrap_or_default(),
            receipt_handle,
            message.body().unwrap_or_default(),
            receive_count,
        ))
    }
}

#[async_trait]
impl QueueClient for SQS {
    async fn poll(&self, max_batch: usize, wait: Duration) -> Result<Vec<Job>, QueueError> {
        let max_batch = max_batch.clamp(1, SQS_MAX_BATCH_SIZE) as i32;
        let wait_seconds = wait.as_secs().min(SQS_MAX_WAIT_SECONDS) as i32;

        let output = self
            .inner
            .client()
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_batch)
            .wait_time_seconds(wait_seconds)
            .visibility_timeout(self.visibility_timeout.as_secs() as i32)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await?;

        let jobs: Vec<Job> = output.messages.unwrap_or_default().iter().filter_map(Self::job_from_message).collect();
        tracing::debug!(count = jobs.len(), "Polled submission queue");
        Ok(jobs)
    }

    async fn acknowledge(&self, job: &Job) -> Result<(), QueueError> {
        self.inner
            .client()
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(job.receipt_handle())
            .send()
            .await?;
        tracing::debug!(message_id = %job.message_id(), "Deleted message from queue");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let output = self
            .inner
            .client()
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::VisibilityTimeout)
            .send()
            .await?;

        let attributes: HashMap<QueueAttributeName, String> = output.attributes.unwrap_or_default();
        if let Some(queue_visibility) = attributes.get(&QueueAttributeName::VisibilityTimeout) {
            tracing::debug!(
                queue_visibility_timeout = %queue_visibility,
                receive_visibility_timeout = self.visibility_timeout.as_secs(),
                "Queue health check passed"
            );
        }
        Ok(())
    }
}
