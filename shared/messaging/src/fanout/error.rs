use thiserror::Error;

use crate::queue::QueueError;
use crate::topic::TopicError;

/// Stages of the fan-out workflow, recorded on every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FanoutStage {
    /// Plan validation, before any provider call
    Validate,
    /// Topic creation
    CreateTopic,
    /// Queue creation
    CreateQueue,
    /// Attaching the publish policy to a queue
    AttachPolicy,
    /// Subscribing a queue to the topic
    Subscribe,
    /// Publishing the message set; recorded when the topic accepted none of
    /// the bodies (individual rejections ride in the report instead)
    Publish,
    /// Waiting for visibility, draining and acknowledging
    Drain,
    /// Deleting everything that was provisioned
    Teardown,
}

/// The failure that stopped a fan-out step.
#[derive(Error, Debug)]
pub enum StepError {
    /// The plan itself was rejected before any provider call
    #[error("invalid fan-out plan: {0}")]
    InvalidPlan(String),

    /// A queue gateway operation failed
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A topic gateway operation failed
    #[error(transparent)]
    Topic(#[from] TopicError),
}

/// A teardown step that failed.
///
/// Cleanup failures are aggregated and reported instead of being swallowed
/// into logs, so callers can decide whether to surface them.
#[derive(Error, Debug)]
#[error("cleanup of {resource} failed: {detail}")]
pub struct CleanupError {
    /// Identifier of the resource that could not be cleaned up
    pub resource: String,
    /// Provider error detail
    pub detail: String,
}

/// A failed fan-out run.
///
/// Best-effort cleanup of whatever was already provisioned happens before
/// this surfaces; anything cleanup could not remove is listed in
/// `cleanup_errors`.
#[derive(Error, Debug)]
#[error("fan-out failed during {stage}: {source}")]
pub struct FanoutError {
    /// The stage that failed
    pub stage: FanoutStage,
    /// The underlying failure
    #[source]
    pub source: StepError,
    /// Teardown failures encountered while unwinding
    pub cleanup_errors: Vec<CleanupError>,
}
