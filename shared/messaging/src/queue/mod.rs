//! Queue gateway over the provider's point-to-point message service
//!
//! Thin forwarding layer: every operation is one blocking round trip, except
//! the batch operations (chunked at the provider's batch cap) and the
//! bounded drain loop. The gateway holds no state beyond the client handle
//! and the configured access-policy name, and is safe to share across tasks.

/// Error types for queue operations
pub mod error;
/// Common types for queue operations
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, QueueAttributeName, SendMessageBatchRequestEntry,
};
use aws_sdk_sqs::Client as SqsClient;
use client_config::GatewayConfig;
use uuid::Uuid;

use crate::policy::QueuePublishPolicy;

pub use error::{QueueError, QueueResult};
pub use types::{BatchEntryAck, BatchEntryFailure, DrainOptions, ReceivedMessage};

/// Provider-side maximum number of messages per receive or batch round trip.
pub const MAX_RECEIVE_BATCH: i32 = 10;

const MAX_BATCH_ENTRIES: usize = 10;

/// Failure code for batch entries that never received a provider verdict
/// because the round trip carrying them (or an earlier one) failed.
const UNREACHED_ENTRY_CODE: &str = "BatchRequestFailed";

/// Gateway to the provider's queue service.
pub struct QueueGateway {
    client: Arc<SqsClient>,
    policy_name: String,
}

impl QueueGateway {
    /// Creates a gateway over a pre-configured client, using the default
    /// access-policy name.
    #[must_use]
    pub fn new(client: Arc<SqsClient>) -> Self {
        Self {
            client,
            policy_name: crate::policy::DEFAULT_POLICY_NAME.to_string(),
        }
    }

    /// Resolves credentials/region/endpoint from `config` and connects.
    pub async fn connect(config: &GatewayConfig) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Arc::new(SqsClient::new(&sdk_config)))
    }

    /// Overrides the statement id used by [`Self::allow_topic`].
    #[must_use]
    pub fn with_policy_name(mut self, policy_name: impl Into<String>) -> Self {
        self.policy_name = policy_name.into();
        self
    }

    /// Creates a queue and returns its access URL.
    ///
    /// Creation is idempotent by name at the provider level: creating an
    /// existing queue returns the existing URL.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the name is empty or the provider call fails.
    pub async fn create_queue(&self, queue_name: &str) -> QueueResult<String> {
        require(queue_name, "queue_name")?;

        let result = self
            .client
            .create_queue()
            .queue_name(queue_name)
            .send()
            .await?;

        result
            .queue_url()
            .map(ToString::to_string)
            .ok_or(QueueError::AttributeUnavailable("QueueUrl"))
    }

    /// Deletes a queue by URL.
    ///
    /// Permissive: deleting a queue that no longer exists is a no-op, not an
    /// error. This matches the topic gateway's deletion stance.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the provider call fails
    /// for any reason other than the queue not existing.
    pub async fn delete_queue(&self, queue_url: &str) -> QueueResult<()> {
        require(queue_url, "queue_url")?;

        match self.client.delete_queue().queue_url(queue_url).send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(err)) if err.err().is_queue_does_not_exist() => {
                tracing::debug!("delete_queue: queue already gone: {queue_url}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks whether a queue with the given name exists.
    ///
    /// Only the provider's typed "queue does not exist" fault translates to
    /// `false`; any other fault surfaces as an error.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the name is empty or the lookup fails.
    pub async fn queue_exists(&self, queue_name: &str) -> QueueResult<bool> {
        Ok(self.resolve_queue_url(queue_name).await?.is_some())
    }

    /// Resolves a queue name to its access URL, or `None` if no such queue
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the name is empty or the lookup fails for any
    /// reason other than the queue not existing.
    pub async fn resolve_queue_url(&self, queue_name: &str) -> QueueResult<Option<String>> {
        require(queue_name, "queue_name")?;

        match self
            .client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
        {
            Ok(result) => Ok(result.queue_url().map(ToString::to_string)),
            Err(SdkError::ServiceError(err)) if err.err().is_queue_does_not_exist() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a queue URL to the queue's resource identifier (ARN) via the
    /// `QueueArn` attribute.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the attribute read fails.
    pub async fn resolve_queue_arn(&self, queue_url: &str) -> QueueResult<Option<String>> {
        require(queue_url, "queue_url")?;

        let result = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await?;

        Ok(result
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::QueueArn))
            .map(ToString::to_string))
    }

    /// Grants a topic permission to send messages to this queue by attaching
    /// an access policy.
    ///
    /// This is the cross-service trust grant: if the queue's ARN resolution
    /// is wrong, the topic's publishes are silently dropped by the provider
    /// rather than rejected with an error.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if either identifier is empty, the queue's ARN
    /// cannot be resolved, or the attribute write fails.
    pub async fn allow_topic(&self, queue_url: &str, topic_arn: &str) -> QueueResult<()> {
        require(queue_url, "queue_url")?;
        require(topic_arn, "topic_arn")?;

        let queue_arn = self
            .resolve_queue_arn(queue_url)
            .await?
            .ok_or(QueueError::AttributeUnavailable("QueueArn"))?;

        let policy = QueuePublishPolicy::new(&self.policy_name, queue_arn, topic_arn)?;

        self.client
            .set_queue_attributes()
            .queue_url(queue_url)
            .attributes(QueueAttributeName::Policy, policy.to_json())
            .send()
            .await?;

        tracing::debug!("attached publish policy for topic {topic_arn} to queue {queue_url}");
        Ok(())
    }

    /// Reports the approximate number of pending messages.
    ///
    /// The value is eventually consistent; a missing or non-numeric attribute
    /// is treated as an empty queue rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the attribute read fails.
    pub async fn pending_message_count(&self, queue_url: &str) -> QueueResult<usize> {
        require(queue_url, "queue_url")?;

        let result = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await?;

        Ok(parse_depth(
            result
                .attributes()
                .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
                .map(String::as_str),
        ))
    }

    /// Checks whether the queue has any pending messages.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the attribute read fails.
    pub async fn has_pending_messages(&self, queue_url: &str) -> QueueResult<bool> {
        Ok(self.pending_message_count(queue_url).await? > 0)
    }

    /// Sends a single message.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if an argument is empty or the send fails.
    pub async fn send(&self, queue_url: &str, body: &str) -> QueueResult<String> {
        require(queue_url, "queue_url")?;
        require(body, "body")?;

        let result = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await?;

        Ok(result
            .message_id()
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    /// Sends a batch of messages, chunked at the provider's batch cap.
    ///
    /// Each body is framed as an independent entry with a generated unique
    /// client-side id. Batches are not all-or-nothing: entries the provider
    /// accepted stay accepted even when others fail. A transport failure on
    /// a later chunk keeps the acknowledgments already collected and reports
    /// every entry without a provider verdict as failed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PartialBatchFailure`] carrying both the
    /// accepted and the rejected entries when any entry fails; a plain
    /// transport-level `QueueError` only when no entry reached the provider.
    pub async fn send_batch(
        &self,
        queue_url: &str,
        bodies: &[String],
    ) -> QueueResult<Vec<BatchEntryAck>> {
        require(queue_url, "queue_url")?;
        if bodies.is_empty() {
            return Err(QueueError::InvalidArgument(
                "bodies must not be empty".to_string(),
            ));
        }

        let mut index_by_id: HashMap<String, usize> = HashMap::with_capacity(bodies.len());
        let mut entries = Vec::with_capacity(bodies.len());
        for (index, body) in bodies.iter().enumerate() {
            let entry_id = Uuid::new_v4().to_string();
            index_by_id.insert(entry_id.clone(), index);
            entries.push((index, entry_id, body));
        }

        let mut successful = Vec::with_capacity(bodies.len());
        let mut failures = Vec::new();

        for (chunk_number, chunk) in entries.chunks(MAX_BATCH_ENTRIES).enumerate() {
            let mut request = self.client.send_message_batch().queue_url(queue_url);
            for (_, entry_id, body) in chunk {
                request = request.entries(
                    SendMessageBatchRequestEntry::builder()
                        .id(entry_id.as_str())
                        .message_body(body.as_str())
                        .build()?,
                );
            }

            let result = match request.send().await {
                Ok(result) => result,
                Err(e) if chunk_number == 0 => return Err(e.into()),
                Err(e) => {
                    // Earlier chunks already have provider verdicts; keep
                    // them and mark everything from this chunk on as failed.
                    let unreached = &entries[chunk_number * MAX_BATCH_ENTRIES..];
                    failures.extend(unreached_failures(
                        unreached
                            .iter()
                            .map(|(index, entry_id, _)| (Some(*index), entry_id.as_str())),
                        &e.to_string(),
                    ));
                    return Err(QueueError::PartialBatchFailure {
                        successful,
                        failures,
                    });
                }
            };

            for entry in result.successful() {
                if let Some(index) = index_by_id.get(entry.id()) {
                    successful.push(BatchEntryAck {
                        index: *index,
                        message_id: entry.message_id().to_string(),
                    });
                }
            }

            for entry in result.failed() {
                failures.push(BatchEntryFailure {
                    index: index_by_id.get(entry.id()).copied(),
                    entry_id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(ToString::to_string),
                });
            }
        }

        if failures.is_empty() {
            Ok(successful)
        } else {
            Err(QueueError::PartialBatchFailure {
                successful,
                failures,
            })
        }
    }

    /// Receives at most one currently visible message.
    ///
    /// Does not block or retry; an empty queue yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the receive fails.
    pub async fn receive_one(&self, queue_url: &str) -> QueueResult<Option<ReceivedMessage>> {
        Ok(self.receive_up_to(queue_url, 1).await?.into_iter().next())
    }

    /// Receives up to `max_messages` in one round trip.
    ///
    /// `max_messages` is clamped to the provider bound of
    /// [`MAX_RECEIVE_BATCH`]; callers loop to drain more.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or the receive fails.
    pub async fn receive_up_to(
        &self,
        queue_url: &str,
        max_messages: i32,
    ) -> QueueResult<Vec<ReceivedMessage>> {
        require(queue_url, "queue_url")?;

        let result = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages.clamp(1, MAX_RECEIVE_BATCH))
            .send()
            .await?;

        let messages = result
            .messages()
            .iter()
            .filter_map(|msg| {
                let body = msg.body()?.to_string();
                let receipt_handle = msg.receipt_handle()?.to_string();
                let message_id = msg.message_id()?.to_string();

                Some(ReceivedMessage {
                    message_id,
                    receipt_handle,
                    body,
                })
            })
            .collect();

        Ok(messages)
    }

    /// Best-effort drain: repeatedly polls the approximate depth and receives
    /// until the reported depth reaches zero or the poll cap is hit.
    ///
    /// Because the depth attribute is eventually consistent this is not a
    /// guaranteed-complete drain; the cap in `options` keeps it from
    /// spinning on the approximate-count race.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the URL is empty or any round trip fails.
    pub async fn drain(
        &self,
        queue_url: &str,
        options: DrainOptions,
    ) -> QueueResult<Vec<ReceivedMessage>> {
        require(queue_url, "queue_url")?;

        let mut drained = Vec::new();

        for _ in 0..options.max_polls {
            if self.pending_message_count(queue_url).await? == 0 {
                return Ok(drained);
            }
            drained.extend(self.receive_up_to(queue_url, options.max_batch).await?);
        }

        tracing::warn!(
            "drain of {queue_url} stopped at the poll cap ({}) with messages possibly remaining",
            options.max_polls
        );
        Ok(drained)
    }

    /// Acknowledges one delivery by deleting it from the queue.
    ///
    /// Safe to call with a stale or already-consumed receipt handle; the
    /// provider treats that as a no-op.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if an argument is empty or the delete fails.
    pub async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> QueueResult<()> {
        require(queue_url, "queue_url")?;
        require(receipt_handle, "receipt_handle")?;

        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }

    /// Acknowledges a set of deliveries in batched round trips.
    ///
    /// Keys are message ids (used as batch entry ids), values the matching
    /// receipt handles. A transport failure on a later chunk keeps the entry
    /// failures already collected and reports every unreached entry as
    /// failed; earlier chunks' deletions stand.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PartialBatchFailure`] when the provider rejects
    /// some entries or a later chunk never got a verdict; a plain
    /// transport-level `QueueError` only when no entry reached the provider.
    pub async fn delete_messages(
        &self,
        queue_url: &str,
        receipt_handles: &HashMap<String, String>,
    ) -> QueueResult<()> {
        require(queue_url, "queue_url")?;
        if receipt_handles.is_empty() {
            return Ok(());
        }

        let entries: Vec<_> = receipt_handles.iter().collect();
        let mut failures = Vec::new();

        for (chunk_number, chunk) in entries.chunks(MAX_BATCH_ENTRIES).enumerate() {
            let mut request = self.client.delete_message_batch().queue_url(queue_url);
            for (message_id, receipt_handle) in chunk {
                request = request.entries(
                    DeleteMessageBatchRequestEntry::builder()
                        .id(message_id.as_str())
                        .receipt_handle(receipt_handle.as_str())
                        .build()?,
                );
            }

            let result = match request.send().await {
                Ok(result) => result,
                Err(e) if chunk_number == 0 => return Err(e.into()),
                Err(e) => {
                    let unreached = &entries[chunk_number * MAX_BATCH_ENTRIES..];
                    failures.extend(unreached_failures(
                        unreached
                            .iter()
                            .map(|(message_id, _)| (None, message_id.as_str())),
                        &e.to_string(),
                    ));
                    return Err(QueueError::PartialBatchFailure {
                        successful: Vec::new(),
                        failures,
                    });
                }
            };

            for entry in result.failed() {
                failures.push(BatchEntryFailure {
                    entry_id: entry.id().to_string(),
                    index: None,
                    code: entry.code().to_string(),
                    message: entry.message().map(ToString::to_string),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(QueueError::PartialBatchFailure {
                successful: Vec::new(),
                failures,
            })
        }
    }
}

fn require(value: &str, what: &'static str) -> QueueResult<()> {
    if value.trim().is_empty() {
        return Err(QueueError::InvalidArgument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(())
}

/// Marks entries without a provider verdict as failed, carrying the
/// transport error that cut the batch short.
fn unreached_failures<'a>(
    entries: impl Iterator<Item = (Option<usize>, &'a str)>,
    detail: &str,
) -> Vec<BatchEntryFailure> {
    entries
        .map(|(index, entry_id)| BatchEntryFailure {
            entry_id: entry_id.to_string(),
            index,
            code: UNREACHED_ENTRY_CODE.to_string(),
            message: Some(detail.to_string()),
        })
        .collect()
}

/// Parses the approximate-depth attribute, treating missing or non-numeric
/// values as an empty queue.
fn parse_depth(raw: Option<&str>) -> usize {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("non-numeric queue depth attribute: {value}");
            0
        }),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::BehaviorVersion;
    use pretty_assertions::assert_eq;

    fn offline_gateway() -> QueueGateway {
        // Never connects; validation errors must surface before any request
        // is attempted.
        let config = aws_config::SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .build();
        QueueGateway::new(Arc::new(SqsClient::new(&config)))
    }

    #[test]
    fn depth_fallback_is_zero() {
        assert_eq!(parse_depth(None), 0);
        assert_eq!(parse_depth(Some("not-a-number")), 0);
        assert_eq!(parse_depth(Some("")), 0);
        assert_eq!(parse_depth(Some("17")), 17);
    }

    #[tokio::test]
    async fn empty_arguments_fail_before_any_network_call() {
        let gateway = offline_gateway();

        assert!(matches!(
            gateway.create_queue("").await,
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.delete_queue(" ").await,
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.send("", "body").await,
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.send("http://queue", "").await,
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.allow_topic("", "arn:aws:sns:us-east-1:1:t").await,
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unreached_entries_become_failures() {
        let failures = unreached_failures(
            [(Some(13), "entry-13"), (None, "msg-7")].into_iter(),
            "connection reset",
        );

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, Some(13));
        assert_eq!(failures[0].entry_id, "entry-13");
        assert_eq!(failures[0].code, UNREACHED_ENTRY_CODE);
        assert_eq!(failures[0].message.as_deref(), Some("connection reset"));
        assert_eq!(failures[1].index, None);
        assert_eq!(failures[1].entry_id, "msg-7");
    }

    #[tokio::test]
    async fn transport_failure_on_the_first_chunk_is_not_partial() {
        // Nothing got a verdict, so there is nothing partial to report.
        let gateway = offline_gateway();
        let bodies = vec!["a".to_string(), "b".to_string()];

        let err = gateway
            .send_batch("http://queue", &bodies)
            .await
            .expect_err("offline send must fail");
        assert!(!matches!(err, QueueError::PartialBatchFailure { .. }));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let gateway = offline_gateway();
        assert!(matches!(
            gateway.send_batch("http://queue", &[]).await,
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn empty_ack_map_is_a_no_op() {
        let gateway = offline_gateway();
        gateway
            .delete_messages("http://queue", &HashMap::new())
            .await
            .expect("empty acknowledgment set should be a no-op");
    }
}
