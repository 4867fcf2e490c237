//! Context payload delivery to the host's distribution mechanism.
//!
//! The provider does not know how payloads reach subscribers; it only hands
//! them to a channel-backed sink. The receiving side (the host, or the daemon
//! binary's logging sink) owns delivery semantics.
use thiserror::Error;
use tokio::sync::mpsc;

/// Information name advertised for the serialized meeting feed.
pub const INFORMATION_MEETING_FEED: &str = "meeting.feed";

/// Payload object name for meeting information.
pub const PAYLOAD_OBJECT_MEETING: &str = "meeting";

/// Field name carrying the serialized feed document.
pub const PAYLOAD_FIELD_FEED: &str = "feed";

#[derive(Debug, Error)]
pub enum PublishError {
    /// The receiving side of the context sink has been dropped.
    #[error("Context sink is closed")]
    SinkClosed,
}

/// A named payload carried to downstream subscribers: an object name plus
/// ordered named string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPayload {
    pub object: String,
    values: Vec<(String, String)>,
}

impl ContextPayload {
    pub fn new(object: &str) -> Self {
        Self {
            object: object.to_string(),
            values: Vec::new(),
        }
    }

    /// Attach a named value to the payload.
    pub fn push_value(&mut self, name: &str, value: String) {
        self.values.push((name.to_string(), value));
    }

    /// Look up a value by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Channel-backed sink for context payloads.
#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::Sender<ContextPayload>,
}

impl Publisher {
    pub fn new(tx: mpsc::Sender<ContextPayload>) -> Self {
        Self { tx }
    }

    /// Hand a payload to the sink. Fails only if the receiver is gone, which
    /// the cycle absorbs like any other failure.
    pub async fn publish(&self, payload: ContextPayload) -> Result<(), PublishError> {
        self.tx.send(payload).await.map_err(|_| {
            tracing::warn!("Context payload dropped (receiver closed)");
            PublishError::SinkClosed
        })
    }
}
