//! Access-policy documents granting a topic permission to publish to a queue
//!
//! The rendered document is what gets attached to the queue's `Policy`
//! attribute. If the queue ARN or topic ARN is wrong the provider does not
//! error at attach time; the topic's sends are silently dropped instead, so
//! identifier resolution happens upstream in the queue gateway.

use serde_json::json;
use thiserror::Error;

/// Default statement id used when the caller does not configure one.
///
/// Deliberately distinct from the reserved `Policy` attribute name.
pub const DEFAULT_POLICY_NAME: &str = "AllowTopicPublish";

/// Error raised for missing or empty policy identifiers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    /// A required identifier was missing or empty
    #[error("required policy field is missing or empty: {0}")]
    MissingField(&'static str),
}

/// An access-policy document scoped to one queue, granting one topic the
/// `SendMessage` action.
///
/// Immutable once constructed; regenerating with different values produces an
/// independent document that overwrites the queue's prior policy when
/// attached (last write wins, no merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePublishPolicy {
    policy_name: String,
    queue_arn: String,
    topic_arn: String,
}

impl QueuePublishPolicy {
    /// Creates a policy document description.
    ///
    /// No syntactic validation of the ARNs is performed; malformed values are
    /// rejected by the provider at attribute-set time.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::MissingField`] when any identifier is empty.
    pub fn new(
        policy_name: impl Into<String>,
        queue_arn: impl Into<String>,
        topic_arn: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        let policy_name = policy_name.into();
        let queue_arn = queue_arn.into();
        let topic_arn = topic_arn.into();

        if policy_name.trim().is_empty() {
            return Err(PolicyError::MissingField("policy_name"));
        }
        if queue_arn.trim().is_empty() {
            return Err(PolicyError::MissingField("queue_arn"));
        }
        if topic_arn.trim().is_empty() {
            return Err(PolicyError::MissingField("topic_arn"));
        }

        Ok(Self {
            policy_name,
            queue_arn,
            topic_arn,
        })
    }

    /// Renders the policy as a single-statement JSON document.
    ///
    /// Output is deterministic: identical inputs produce byte-identical JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Sid": self.policy_name,
                    "Effect": "Allow",
                    "Principal": { "AWS": "*" },
                    "Action": "sqs:SendMessage",
                    "Resource": self.queue_arn,
                    "Condition": {
                        "ArnEquals": { "aws:SourceArn": self.topic_arn }
                    }
                }
            ]
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const QUEUE_ARN: &str = "arn:aws:sqs:us-east-1:123456789012:orders";
    const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:order-events";

    #[test]
    fn rejects_empty_identifiers() {
        assert_eq!(
            QueuePublishPolicy::new("", QUEUE_ARN, TOPIC_ARN),
            Err(PolicyError::MissingField("policy_name"))
        );
        assert_eq!(
            QueuePublishPolicy::new("p", "  ", TOPIC_ARN),
            Err(PolicyError::MissingField("queue_arn"))
        );
        assert_eq!(
            QueuePublishPolicy::new("p", QUEUE_ARN, ""),
            Err(PolicyError::MissingField("topic_arn"))
        );
    }

    #[test]
    fn render_is_deterministic() {
        let first = QueuePublishPolicy::new(DEFAULT_POLICY_NAME, QUEUE_ARN, TOPIC_ARN)
            .expect("policy should build")
            .to_json();
        let second = QueuePublishPolicy::new(DEFAULT_POLICY_NAME, QUEUE_ARN, TOPIC_ARN)
            .expect("policy should build")
            .to_json();

        assert_eq!(first, second);
    }

    #[test]
    fn renders_single_allow_statement() {
        let rendered = QueuePublishPolicy::new("my-policy", QUEUE_ARN, TOPIC_ARN)
            .expect("policy should build")
            .to_json();

        let parsed: serde_json::Value =
            serde_json::from_str(&rendered).expect("policy should be valid JSON");

        assert_eq!(parsed["Version"], "2012-10-17");

        let statements = parsed["Statement"]
            .as_array()
            .expect("Statement should be an array");
        assert_eq!(statements.len(), 1);

        let statement = &statements[0];
        assert_eq!(statement["Sid"], "my-policy");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"]["AWS"], "*");
        assert_eq!(statement["Action"], "sqs:SendMessage");
        assert_eq!(statement["Resource"], QUEUE_ARN);
        assert_eq!(statement["Condition"]["ArnEquals"]["aws:SourceArn"], TOPIC_ARN);
    }
}
