//! Messaging gateways for SNS topics and SQS queues
//!
//! This crate wraps the provider's pub/sub and queue services behind thin
//! gateways and composes them into a topic-to-queue fan-out workflow:
//! create queue, grant the topic publish permission via an access policy,
//! subscribe, publish, drain with bounded polling, tear down.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Fan-out orchestration across a topic and its subscribed queues
pub mod fanout;
/// Access-policy document construction
pub mod policy;
/// Queue gateway and related types
pub mod queue;
/// Topic gateway and related types
pub mod topic;

pub use fanout::{
    FanoutError, FanoutOptions, FanoutOrchestrator, FanoutPlan, FanoutReport, FanoutStage,
};
pub use policy::{PolicyError, QueuePublishPolicy, DEFAULT_POLICY_NAME};
pub use queue::{DrainOptions, QueueError, QueueGateway, QueueResult, ReceivedMessage};
pub use topic::{TopicEnvelope, TopicError, TopicGateway, TopicResult};
