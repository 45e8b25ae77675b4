use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::delete_message::DeleteMessageError;
use aws_sdk_sqs::operation::get_queue_attributes::GetQueueAttributesError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to get queue url: {0}")]
    GetQueueUrlError(#[from] SdkError<GetQueueUrlError>),

    #[error("Failed to get queue attributes: {0}")]
    GetQueueAttributesError(#[from] SdkError<GetQueueAttributesError>),

    #[error("Failed to receive messages: {0}")]
    ReceiveMessageError(#[from] SdkError<ReceiveMessageError>),

    #[error("Failed to delete message: {0}")]
    DeleteMessageError(#[from] SdkError<DeleteMessageError>),

    #[error("Failed to get queue url for queue name : {0}")]
    FailedToGetQueueUrl(String),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}
