use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::operation::create_topic::CreateTopicError;
use aws_sdk_sns::operation::delete_topic::DeleteTopicError;
use aws_sdk_sns::operation::publish::PublishError;
use aws_sdk_sns::operation::set_subscription_attributes::SetSubscriptionAttributesError;
use aws_sdk_sns::operation::subscribe::SubscribeError;
use aws_sdk_sns::operation::unsubscribe::UnsubscribeError;
use thiserror::Error;

/// Result type alias for topic operations
pub type TopicResult<T> = Result<T, TopicError>;

/// Error types for topic operations
#[derive(Error, Debug)]
pub enum TopicError {
    /// A required argument was missing or empty; raised before any network call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The topic does not exist; only raised from the provider's typed fault
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// The provider accepted the call but returned no identifier
    #[error("provider response missing {0}")]
    MissingResponseField(&'static str),

    /// Error creating a topic
    #[error("failed to create topic")]
    CreateTopic(#[from] SdkError<CreateTopicError>),

    /// Error deleting a topic
    #[error("failed to delete topic")]
    DeleteTopic(#[from] SdkError<DeleteTopicError>),

    /// Error publishing a message
    #[error("failed to publish message")]
    Publish(#[from] SdkError<PublishError>),

    /// Error subscribing a queue to a topic
    #[error("failed to subscribe queue to topic")]
    Subscribe(#[from] SdkError<SubscribeError>),

    /// Error removing a subscription
    #[error("failed to unsubscribe")]
    Unsubscribe(#[from] SdkError<UnsubscribeError>),

    /// Error toggling a subscription attribute
    #[error("failed to update subscription attributes")]
    SetSubscriptionAttributes(#[from] SdkError<SetSubscriptionAttributesError>),
}

impl TopicError {
    /// Checks whether this error represents an upstream (5xx) provider fault.
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::CreateTopic(e) => Self::check_sdk_error_status(e),
            Self::DeleteTopic(e) => Self::check_sdk_error_status(e),
            Self::Publish(e) => Self::check_sdk_error_status(e),
            Self::Subscribe(e) => Self::check_sdk_error_status(e),
            Self::Unsubscribe(e) => Self::check_sdk_error_status(e),
            Self::SetSubscriptionAttributes(e) => Self::check_sdk_error_status(e),
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
