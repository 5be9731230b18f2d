//! Topic-to-queue fan-out orchestration
//!
//! Composes the queue and topic gateways into the end-to-end workflow:
//! create topic, create queue(s), grant the topic publish permission,
//! subscribe, publish, wait for visibility, drain, acknowledge, tear down.
//! Teardown is reached whether or not the intermediate steps succeeded.

/// Fan-out error and stage types
pub mod error;

use std::collections::HashMap;
use std::time::Duration;

use client_config::GatewayConfig;

use crate::queue::{DrainOptions, QueueGateway, ReceivedMessage};
use crate::topic::TopicGateway;

pub use error::{CleanupError, FanoutError, FanoutStage, StepError};

/// What a fan-out run should provision and exercise.
#[derive(Debug, Clone)]
pub struct FanoutPlan {
    /// Topic name to create (or reuse, creation being idempotent by name)
    pub topic_name: String,
    /// Queue names to create and subscribe; one delivery per queue
    pub queue_names: Vec<String>,
    /// Deliver published bodies raw instead of wrapped in the provider
    /// envelope
    pub raw_delivery: bool,
}

/// Bounds and pacing for a fan-out run.
#[derive(Debug, Clone)]
pub struct FanoutOptions {
    /// Bounds for each queue's drain loop
    pub drain: DrainOptions,
    /// Delay between visibility polls
    pub poll_interval: Duration,
    /// Maximum visibility polls per queue before draining whatever is there
    pub max_wait_polls: u32,
}

impl Default for FanoutOptions {
    fn default() -> Self {
        Self {
            drain: DrainOptions::default(),
            poll_interval: Duration::from_millis(250),
            max_wait_polls: 40,
        }
    }
}

/// One body that `publish_many` could not deliver to the topic.
#[derive(Debug, Clone)]
pub struct PublishFailure {
    /// Index of the body in the submitted slice
    pub index: usize,
    /// Rendered publish error
    pub error: String,
}

/// Messages a single queue received during the run.
#[derive(Debug, Clone)]
pub struct QueueDelivery {
    /// Queue name from the plan
    pub queue_name: String,
    /// Access URL the queue was created with
    pub queue_url: String,
    /// Drained messages, acknowledged before teardown
    pub messages: Vec<ReceivedMessage>,
}

/// Outcome of a completed fan-out run.
#[derive(Debug, Clone)]
pub struct FanoutReport {
    /// Resource identifier of the topic the run published through
    pub topic_arn: String,
    /// Per-queue drained messages
    pub deliveries: Vec<QueueDelivery>,
    /// Bodies the topic publish step could not deliver (best-effort
    /// semantics: the rest were still attempted). A run where no body at
    /// all was accepted fails instead of reporting.
    pub publish_failures: Vec<PublishFailure>,
    /// Teardown failures; empty when cleanup completed
    pub cleanup_errors: Vec<CleanupError>,
}

#[derive(Default)]
struct Provisioned {
    topic_arn: Option<String>,
    subscription_arns: Vec<String>,
    queues: Vec<(String, String)>,
}

/// Drives the create → authorize → subscribe → publish → drain → delete
/// workflow across the two gateways.
///
/// The orchestrator owns the lifecycle of everything it creates: both on
/// success and on failure it tears down the topic, queues and
/// subscriptions, and reports any teardown failure explicitly instead of
/// only logging it.
pub struct FanoutOrchestrator {
    queues: QueueGateway,
    topics: TopicGateway,
    options: FanoutOptions,
}

impl FanoutOrchestrator {
    /// Creates an orchestrator over pre-built gateways.
    #[must_use]
    pub fn new(queues: QueueGateway, topics: TopicGateway) -> Self {
        Self {
            queues,
            topics,
            options: FanoutOptions::default(),
        }
    }

    /// Resolves credentials/region/endpoint from `config` and connects both
    /// gateways.
    pub async fn connect(config: &GatewayConfig) -> Self {
        Self::new(
            QueueGateway::connect(config).await,
            TopicGateway::connect(config).await,
        )
    }

    /// Overrides the run bounds and pacing.
    #[must_use]
    pub fn with_options(mut self, options: FanoutOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the full fan-out workflow for `plan`, publishing `bodies`.
    ///
    /// # Errors
    ///
    /// Returns [`FanoutError`] naming the stage that failed; best-effort
    /// cleanup of whatever was provisioned has already happened, and its
    /// failures ride along in the error.
    pub async fn run(
        &self,
        plan: &FanoutPlan,
        bodies: &[String],
    ) -> Result<FanoutReport, FanoutError> {
        if let Err(detail) = validate_plan(plan) {
            return Err(FanoutError {
                stage: FanoutStage::Validate,
                source: StepError::InvalidPlan(detail),
                cleanup_errors: Vec::new(),
            });
        }

        let mut provisioned = Provisioned::default();

        match self.execute(plan, bodies, &mut provisioned).await {
            Ok((topic_arn, deliveries, publish_failures)) => {
                let cleanup_errors = self.teardown(&provisioned).await;
                Ok(FanoutReport {
                    topic_arn,
                    deliveries,
                    publish_failures,
                    cleanup_errors,
                })
            }
            Err((stage, source)) => {
                let cleanup_errors = self.teardown(&provisioned).await;
                Err(FanoutError {
                    stage,
                    source,
                    cleanup_errors,
                })
            }
        }
    }

    async fn execute(
        &self,
        plan: &FanoutPlan,
        bodies: &[String],
        provisioned: &mut Provisioned,
    ) -> Result<(String, Vec<QueueDelivery>, Vec<PublishFailure>), (FanoutStage, StepError)> {
        let topic_arn = self
            .topics
            .create_topic(&plan.topic_name)
            .await
            .map_err(|e| (FanoutStage::CreateTopic, e.into()))?;
        provisioned.topic_arn = Some(topic_arn.clone());

        for queue_name in &plan.queue_names {
            let queue_url = self
                .queues
                .create_queue(queue_name)
                .await
                .map_err(|e| (FanoutStage::CreateQueue, e.into()))?;
            provisioned
                .queues
                .push((queue_name.clone(), queue_url.clone()));

            self.queues
                .allow_topic(&queue_url, &topic_arn)
                .await
                .map_err(|e| (FanoutStage::AttachPolicy, e.into()))?;

            let queue_arn = self
                .queues
                .resolve_queue_arn(&queue_url)
                .await
                .map_err(|e| (FanoutStage::Subscribe, e.into()))?
                .ok_or((
                    FanoutStage::Subscribe,
                    StepError::Queue(crate::queue::QueueError::AttributeUnavailable("QueueArn")),
                ))?;

            let subscription_arn = self
                .topics
                .subscribe(&topic_arn, &queue_arn)
                .await
                .map_err(|e| (FanoutStage::Subscribe, e.into()))?;
            provisioned.subscription_arns.push(subscription_arn.clone());

            if plan.raw_delivery {
                self.topics
                    .set_raw_delivery(&subscription_arn, true)
                    .await
                    .map_err(|e| (FanoutStage::Subscribe, e.into()))?;
            }
        }

        let mut publish_failures = Vec::new();
        let mut any_accepted = false;
        let mut first_publish_error = None;
        for (index, result) in self
            .topics
            .publish_many(&topic_arn, bodies)
            .await
            .into_iter()
            .enumerate()
        {
            match result {
                Ok(_) => any_accepted = true,
                Err(e) => {
                    publish_failures.push(PublishFailure {
                        index,
                        error: e.to_string(),
                    });
                    first_publish_error.get_or_insert(e);
                }
            }
        }

        // Publishing is best-effort per body, but a run where the topic
        // accepted nothing has nothing to drain; that is a stage failure,
        // not a report.
        if !any_accepted {
            if let Some(e) = first_publish_error {
                return Err((FanoutStage::Publish, e.into()));
            }
        }

        let mut deliveries = Vec::with_capacity(provisioned.queues.len());
        for (queue_name, queue_url) in &provisioned.queues {
            let messages = self
                .await_and_drain(queue_url, bodies.len())
                .await
                .map_err(|e| (FanoutStage::Drain, e))?;
            deliveries.push(QueueDelivery {
                queue_name: queue_name.clone(),
                queue_url: queue_url.clone(),
                messages,
            });
        }

        Ok((topic_arn, deliveries, publish_failures))
    }

    /// Polls until the queue reports a pending message (bounded), then
    /// drains and acknowledges everything received.
    async fn await_and_drain(
        &self,
        queue_url: &str,
        expected: usize,
    ) -> Result<Vec<ReceivedMessage>, StepError> {
        if expected > 0 {
            let mut polls = 0;
            while !self.queues.has_pending_messages(queue_url).await? {
                polls += 1;
                if polls >= self.options.max_wait_polls {
                    tracing::warn!(
                        "no messages visible on {queue_url} after {polls} polls; draining anyway"
                    );
                    break;
                }
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }

        let messages = self.queues.drain(queue_url, self.options.drain).await?;

        if !messages.is_empty() {
            let handles: HashMap<String, String> = messages
                .iter()
                .map(|m| (m.message_id.clone(), m.receipt_handle.clone()))
                .collect();
            self.queues.delete_messages(queue_url, &handles).await?;
        }

        Ok(messages)
    }

    /// Deletes everything the run provisioned, in reverse dependency order.
    ///
    /// Failures are collected, not propagated: teardown always visits every
    /// remaining resource.
    async fn teardown(&self, provisioned: &Provisioned) -> Vec<CleanupError> {
        let mut errors = Vec::new();

        for subscription_arn in &provisioned.subscription_arns {
            if let Err(e) = self.topics.unsubscribe(subscription_arn).await {
                tracing::warn!("failed to remove subscription {subscription_arn}: {e}");
                errors.push(CleanupError {
                    resource: subscription_arn.clone(),
                    detail: e.to_string(),
                });
            }
        }

        for (_, queue_url) in &provisioned.queues {
            if let Err(e) = self.queues.delete_queue(queue_url).await {
                tracing::warn!("failed to delete queue {queue_url}: {e}");
                errors.push(CleanupError {
                    resource: queue_url.clone(),
                    detail: e.to_string(),
                });
            }
        }

        if let Some(topic_arn) = &provisioned.topic_arn {
            if let Err(e) = self.topics.delete_topic(topic_arn).await {
                tracing::warn!("failed to delete topic {topic_arn}: {e}");
                errors.push(CleanupError {
                    resource: topic_arn.clone(),
                    detail: e.to_string(),
                });
            }
        }

        errors
    }
}

fn validate_plan(plan: &FanoutPlan) -> Result<(), String> {
    if plan.topic_name.trim().is_empty() {
        return Err("topic_name must not be empty".to_string());
    }
    if plan.queue_names.is_empty() {
        return Err("at least one queue name is required".to_string());
    }
    if plan.queue_names.iter().any(|name| name.trim().is_empty()) {
        return Err("queue names must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plan(topic: &str, queues: &[&str]) -> FanoutPlan {
        FanoutPlan {
            topic_name: topic.to_string(),
            queue_names: queues.iter().map(ToString::to_string).collect(),
            raw_delivery: false,
        }
    }

    #[test]
    fn plan_validation() {
        assert!(validate_plan(&plan("t", &["q1", "q2"])).is_ok());
        assert!(validate_plan(&plan("", &["q1"])).is_err());
        assert!(validate_plan(&plan("t", &[])).is_err());
        assert!(validate_plan(&plan("t", &["q1", " "])).is_err());
    }

    #[test]
    fn stages_render_for_error_messages() {
        assert_eq!(FanoutStage::CreateTopic.to_string(), "create-topic");
        assert_eq!(FanoutStage::AttachPolicy.to_string(), "attach-policy");
        assert_eq!(FanoutStage::Publish.to_string(), "publish");
        assert_eq!(FanoutStage::Teardown.to_string(), "teardown");
    }

    #[tokio::test]
    async fn invalid_plan_fails_before_any_provider_call() {
        let config = aws_config::SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        let orchestrator = FanoutOrchestrator::new(
            QueueGateway::new(std::sync::Arc::new(aws_sdk_sqs::Client::new(&config))),
            TopicGateway::new(std::sync::Arc::new(aws_sdk_sns::Client::new(&config))),
        );

        let err = orchestrator
            .run(&plan("", &["q1"]), &[])
            .await
            .expect_err("empty topic name must be rejected");

        assert_eq!(err.stage, FanoutStage::Validate);
        assert!(err.cleanup_errors.is_empty());
    }
}
