use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::create_queue::CreateQueueError;
use aws_sdk_sqs::operation::delete_message::DeleteMessageError;
use aws_sdk_sqs::operation::delete_message_batch::DeleteMessageBatchError;
use aws_sdk_sqs::operation::delete_queue::DeleteQueueError;
use aws_sdk_sqs::operation::get_queue_attributes::GetQueueAttributesError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::receive_message::ReceiveMessageError;
use aws_sdk_sqs::operation::send_message::SendMessageError;
use aws_sdk_sqs::operation::send_message_batch::SendMessageBatchError;
use aws_sdk_sqs::operation::set_queue_attributes::SetQueueAttributesError;
use thiserror::Error;

use crate::policy::PolicyError;
use crate::queue::types::{BatchEntryAck, BatchEntryFailure};

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error types for queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// A required argument was missing or empty; raised before any network call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The provider returned attributes without the one that was requested
    #[error("queue attribute unavailable: {0}")]
    AttributeUnavailable(&'static str),

    /// One or more entries of a batch operation did not succeed
    #[error("batch operation failed for {} entries", failures.len())]
    PartialBatchFailure {
        /// Entries that the provider did accept
        successful: Vec<BatchEntryAck>,
        /// Entries the provider rejected
        failures: Vec<BatchEntryFailure>,
    },

    /// Error building the access-policy document
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Error constructing a batch request entry
    #[error("failed to construct batch entry: {0}")]
    BatchEntryBuild(#[from] aws_sdk_sqs::error::BuildError),

    /// Error creating a queue
    #[error("failed to create queue")]
    CreateQueue(#[from] SdkError<CreateQueueError>),

    /// Error deleting a queue
    #[error("failed to delete queue")]
    DeleteQueue(#[from] SdkError<DeleteQueueError>),

    /// Error resolving a queue URL from its name
    #[error("failed to resolve queue URL")]
    GetQueueUrl(#[from] SdkError<GetQueueUrlError>),

    /// Error reading queue attributes
    #[error("failed to read queue attributes")]
    GetQueueAttributes(#[from] SdkError<GetQueueAttributesError>),

    /// Error writing queue attributes
    #[error("failed to write queue attributes")]
    SetQueueAttributes(#[from] SdkError<SetQueueAttributesError>),

    /// Error sending a message
    #[error("failed to send message")]
    SendMessage(#[from] SdkError<SendMessageError>),

    /// Error sending a message batch
    #[error("failed to send message batch")]
    SendMessageBatch(#[from] SdkError<SendMessageBatchError>),

    /// Error receiving messages
    #[error("failed to receive messages")]
    ReceiveMessage(#[from] SdkError<ReceiveMessageError>),

    /// Error deleting a message
    #[error("failed to delete message")]
    DeleteMessage(#[from] SdkError<DeleteMessageError>),

    /// Error deleting a message batch
    #[error("failed to delete message batch")]
    DeleteMessageBatch(#[from] SdkError<DeleteMessageBatchError>),
}

impl QueueError {
    /// Checks whether this error represents an upstream (5xx) provider fault.
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::CreateQueue(e) => Self::check_sdk_error_status(e),
            Self::DeleteQueue(e) => Self::check_sdk_error_status(e),
            Self::GetQueueUrl(e) => Self::check_sdk_error_status(e),
            Self::GetQueueAttributes(e) => Self::check_sdk_error_status(e),
            Self::SetQueueAttributes(e) => Self::check_sdk_error_status(e),
            Self::SendMessage(e) => Self::check_sdk_error_status(e),
            Self::SendMessageBatch(e) => Self::check_sdk_error_status(e),
            Self::ReceiveMessage(e) => Self::check_sdk_error_status(e),
            Self::DeleteMessage(e) => Self::check_sdk_error_status(e),
            Self::DeleteMessageBatch(e) => Self::check_sdk_error_status(e),
            _ => false,
        }
    }

    fn check_sdk_error_status<E>(sdk_err: &SdkError<E>) -> bool {
        if let SdkError::ServiceError(err) = sdk_err {
            let raw = err.raw();
            let status = raw.status();
            return status.as_u16() >= 500;
        }
        false
    }
}
