//! Message and metadata domain types.
//!
//! These are the value objects that flow through the system: an inbound
//! message arrives on a channel → the session store appends it → the
//! engine evaluates it → a reply goes back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a honeypot session (one per conversation).
///
/// Opaque and externally supplied — the caller owns the keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the conversation authored a message.
///
/// The wire contract speaks of "scammer" and "user"; internally the engine
/// only distinguishes the remote counterparty from its own agent and never
/// assumes which side is the honeypot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The remote party engaging with the honeypot (presumed scammer)
    #[serde(rename = "scammer", alias = "counterparty")]
    Counterparty,
    /// The honeypot's own persona agent
    #[serde(rename = "user", alias = "agent")]
    Agent,
}

/// A single turn in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message
    pub sender: Sender,

    /// The raw text — never mutated after storage
    pub text: String,

    /// Caller-supplied epoch timestamp. Display ordering only: callers may
    /// supply noisy clocks, so the engine's ordering invariant is append
    /// order, never this field.
    pub timestamp: i64,

    /// When this message was ingested by the runtime
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Create a counterparty (inbound) message.
    pub fn counterparty(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender: Sender::Counterparty,
            text: text.into(),
            timestamp,
            received_at: Utc::now(),
        }
    }

    /// Create an agent (outbound persona) message.
    pub fn agent(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
            timestamp,
            received_at: Utc::now(),
        }
    }
}

/// Channel metadata accompanying every inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMetadata {
    /// Delivery channel: SMS, WhatsApp, Email, Chat, ...
    pub channel: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_language() -> String {
    "English".into()
}

fn default_locale() -> String {
    "IN".into()
}

impl Default for ChannelMetadata {
    fn default() -> Self {
        Self {
            channel: "Chat".into(),
            language: default_language(),
            locale: default_locale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_counterparty_message() {
        let msg = Message::counterparty("Your account is blocked", 1700000000);
        assert_eq!(msg.sender, Sender::Counterparty);
        assert_eq!(msg.text, "Your account is blocked");
        assert_eq!(msg.timestamp, 1700000000);
    }

    #[test]
    fn sender_wire_names() {
        let scammer: Sender = serde_json::from_str(r#""scammer""#).unwrap();
        assert_eq!(scammer, Sender::Counterparty);

        let user: Sender = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(user, Sender::Agent);

        let json = serde_json::to_string(&Sender::Counterparty).unwrap();
        assert_eq!(json, r#""scammer""#);
    }

    #[test]
    fn metadata_defaults() {
        let meta: ChannelMetadata = serde_json::from_str(r#"{"channel":"SMS"}"#).unwrap();
        assert_eq!(meta.channel, "SMS");
        assert_eq!(meta.language, "English");
        assert_eq!(meta.locale, "IN");
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::counterparty("hello", 42);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "hello");
        assert_eq!(back.sender, Sender::Counterparty);
        assert_eq!(back.timestamp, 42);
    }
}
