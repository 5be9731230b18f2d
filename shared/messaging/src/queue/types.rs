/// A message pulled from a queue, with the metadata needed to acknowledge it.
///
/// The receipt handle is valid only for the receive call that returned it;
/// acknowledging with a stale handle is a provider-side no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Provider-assigned message id
    pub message_id: String,
    /// One-time token used to delete this delivery of the message
    pub receipt_handle: String,
    /// Opaque message body, exactly as delivered
    pub body: String,
}

/// A batch entry the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntryAck {
    /// Index of the body in the submitted slice
    pub index: usize,
    /// Provider-assigned message id
    pub message_id: String,
}

/// A batch entry the provider rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntryFailure {
    /// Client-side entry id the failure refers to
    pub entry_id: String,
    /// Index of the body in the submitted slice; `None` when the provider
    /// reported an id this call did not send, or when the operation has no
    /// positional input (batched acknowledgment)
    pub index: Option<usize>,
    /// Provider error code
    pub code: String,
    /// Provider error detail, when given
    pub message: Option<String>,
}

/// Bounds for the best-effort drain loop.
///
/// The provider's pending count is approximate, so a drain can under- or
/// over-report relative to what is actually receivable. The poll cap keeps
/// the loop from spinning on that race forever.
#[derive(Debug, Clone, Copy)]
pub struct DrainOptions {
    /// Maximum number of poll iterations before giving up
    pub max_polls: u32,
    /// Messages requested per receive round trip, capped at the provider max
    pub max_batch: i32,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            max_polls: 32,
            max_batch: super::MAX_RECEIVE_BATCH,
        }
    }
}
