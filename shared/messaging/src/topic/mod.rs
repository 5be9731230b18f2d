//! Topic gateway over the provider's pub/sub broadcast service
//!
//! Publishing to a topic fans out to every subscribed queue. The gateway
//! also manages the subscription lifecycle, including the raw-vs-enveloped
//! delivery toggle.

/// Error types for topic operations
pub mod error;
/// Delivery envelope types
pub mod types;

use std::sync::Arc;

use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::Client as SnsClient;
use client_config::GatewayConfig;

pub use error::{TopicError, TopicResult};
pub use types::TopicEnvelope;

/// Protocol discriminator identifying a queue-type subscription endpoint.
const QUEUE_PROTOCOL: &str = "sqs";

/// Subscription attribute controlling envelope wrapping.
const RAW_DELIVERY_ATTRIBUTE: &str = "RawMessageDelivery";

/// Gateway to the provider's pub/sub topic service.
pub struct TopicGateway {
    client: Arc<SnsClient>,
}

impl TopicGateway {
    /// Creates a gateway over a pre-configured client.
    #[must_use]
    pub const fn new(client: Arc<SnsClient>) -> Self {
        Self { client }
    }

    /// Resolves credentials/region/endpoint from `config` and connects.
    pub async fn connect(config: &GatewayConfig) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Arc::new(SnsClient::new(&sdk_config)))
    }

    /// Creates a topic and returns its resource identifier.
    ///
    /// Idempotent by name at the provider level: creating an existing topic
    /// returns the existing identifier, which also makes this the name
    /// resolution call.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if the name is empty or the provider call fails.
    pub async fn create_topic(&self, topic_name: &str) -> TopicResult<String> {
        require(topic_name, "topic_name")?;

        let result = self.client.create_topic().name(topic_name).send().await?;

        result
            .topic_arn()
            .map(ToString::to_string)
            .ok_or(TopicError::MissingResponseField("TopicArn"))
    }

    /// Deletes a topic by resource identifier.
    ///
    /// An empty identifier is a logged no-op rather than an error; note that
    /// this differs from strict-error designs. Deleting a topic that no
    /// longer exists succeeds (provider semantics).
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if the provider call fails.
    pub async fn delete_topic(&self, topic_arn: &str) -> TopicResult<()> {
        if topic_arn.trim().is_empty() {
            tracing::warn!("delete_topic called with an empty topic identifier");
            return Ok(());
        }

        self.client.delete_topic().topic_arn(topic_arn).send().await?;

        tracing::debug!("deleted topic {topic_arn}");
        Ok(())
    }

    /// Publishes a message to a topic and returns the message id.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::TopicNotFound` for the provider's typed
    /// not-found fault, other `TopicError` values otherwise.
    pub async fn publish(&self, topic_arn: &str, body: &str) -> TopicResult<String> {
        require(topic_arn, "topic_arn")?;
        require(body, "body")?;

        let result = match self
            .client
            .publish()
            .topic_arn(topic_arn)
            .message(body)
            .send()
            .await
        {
            Ok(result) => result,
            Err(SdkError::ServiceError(err)) if err.err().is_not_found_exception() => {
                return Err(TopicError::TopicNotFound(topic_arn.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(result
            .message_id()
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    /// Publishes each body independently, never aborting the remainder on a
    /// failure.
    ///
    /// This is deliberately best-effort, unlike the queue gateway's
    /// provider-atomic batch send: one result per body, failures logged and
    /// returned in place.
    pub async fn publish_many(
        &self,
        topic_arn: &str,
        bodies: &[String],
    ) -> Vec<TopicResult<String>> {
        let mut results = Vec::with_capacity(bodies.len());

        for (index, body) in bodies.iter().enumerate() {
            let result = self.publish(topic_arn, body).await;
            if let Err(e) = &result {
                tracing::warn!("publish of message {index} to {topic_arn} failed: {e}");
            }
            results.push(result);
        }

        results
    }

    /// Subscribes a queue to a topic and returns the subscription
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if an identifier is empty, the provider call
    /// fails, or no subscription identifier comes back.
    pub async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> TopicResult<String> {
        require(topic_arn, "topic_arn")?;
        require(queue_arn, "queue_arn")?;

        let result = self
            .client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(QUEUE_PROTOCOL)
            .endpoint(queue_arn)
            .return_subscription_arn(true)
            .send()
            .await?;

        let subscription_arn = result
            .subscription_arn()
            .map(ToString::to_string)
            .ok_or(TopicError::MissingResponseField("SubscriptionArn"))?;

        tracing::debug!("queue {queue_arn} subscribed to topic {topic_arn} as {subscription_arn}");
        Ok(subscription_arn)
    }

    /// Removes a subscription.
    ///
    /// An empty identifier is a logged no-op, mirroring [`Self::delete_topic`].
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if the provider call fails.
    pub async fn unsubscribe(&self, subscription_arn: &str) -> TopicResult<()> {
        if subscription_arn.trim().is_empty() {
            tracing::warn!("unsubscribe called with an empty subscription identifier");
            return Ok(());
        }

        self.client
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await?;

        Ok(())
    }

    /// Toggles raw delivery on a subscription.
    ///
    /// With raw delivery enabled the queue receives the published body
    /// exactly as submitted; disabled (the provider default) wraps it in the
    /// [`TopicEnvelope`] metadata envelope.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if the identifier is empty or the provider call
    /// fails.
    pub async fn set_raw_delivery(
        &self,
        subscription_arn: &str,
        enabled: bool,
    ) -> TopicResult<()> {
        require(subscription_arn, "subscription_arn")?;

        self.client
            .set_subscription_attributes()
            .subscription_arn(subscription_arn)
            .attribute_name(RAW_DELIVERY_ATTRIBUTE)
            .attribute_value(if enabled { "true" } else { "false" })
            .send()
            .await?;

        tracing::debug!("raw delivery {} for {subscription_arn}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }
}

fn require(value: &str, what: &'static str) -> TopicResult<()> {
    if value.trim().is_empty() {
        return Err(TopicError::InvalidArgument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::BehaviorVersion;

    fn offline_gateway() -> TopicGateway {
        let config = aws_config::SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .build();
        TopicGateway::new(Arc::new(SnsClient::new(&config)))
    }

    #[tokio::test]
    async fn empty_arguments_fail_before_any_network_call() {
        let gateway = offline_gateway();

        assert!(matches!(
            gateway.create_topic("").await,
            Err(TopicError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.publish("", "body").await,
            Err(TopicError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.subscribe("arn:topic", " ").await,
            Err(TopicError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.set_raw_delivery("", true).await,
            Err(TopicError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn permissive_deletes_accept_empty_identifiers() {
        let gateway = offline_gateway();

        gateway
            .delete_topic("")
            .await
            .expect("empty topic identifier should be a no-op");
        gateway
            .unsubscribe("  ")
            .await
            .expect("empty subscription identifier should be a no-op");
    }

    #[tokio::test]
    async fn publish_many_attempts_every_body() {
        let gateway = offline_gateway();

        // Empty bodies fail validation without a network round trip; every
        // entry must still be attempted and reported in place.
        let bodies = vec![String::new(), String::new(), String::new()];
        let results = gateway.publish_many("arn:aws:sns:us-east-1:1:t", &bodies).await;

        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(TopicError::InvalidArgument(_)))));
    }
}
