use serde::Deserialize;

/// The provider envelope wrapped around a topic-delivered message body under
/// enveloped delivery (the default).
///
/// With raw delivery enabled on the subscription, the queue receives the
/// published body as-is and this type does not apply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TopicEnvelope {
    /// Notification type discriminator
    #[serde(rename = "Type")]
    pub kind: String,
    /// Provider-assigned message id
    pub message_id: String,
    /// Resource identifier of the publishing topic
    pub topic_arn: String,
    /// Optional subject set at publish time
    #[serde(default)]
    pub subject: Option<String>,
    /// The body exactly as published
    pub message: String,
    /// Publish timestamp, ISO-8601
    pub timestamp: String,
}

impl TopicEnvelope {
    /// Parses an enveloped queue message body.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error when the body is not a provider
    /// envelope (for example under raw delivery).
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_provider_envelope() {
        let body = r#"{
            "Type": "Notification",
            "MessageId": "0a9e41a6-97d4-4a4e-8f3f-5a0f4b2b8a5e",
            "TopicArn": "arn:aws:sns:us-east-1:123456789012:order-events",
            "Message": "hello",
            "Timestamp": "2024-01-01T12:00:00.000Z",
            "SignatureVersion": "1",
            "Signature": "ignored"
        }"#;

        let envelope = TopicEnvelope::parse(body).expect("envelope should parse");
        assert_eq!(envelope.kind, "Notification");
        assert_eq!(envelope.message, "hello");
        assert_eq!(envelope.subject, None);
    }

    #[test]
    fn raw_body_is_not_an_envelope() {
        assert!(TopicEnvelope::parse("hello").is_err());
    }
}
