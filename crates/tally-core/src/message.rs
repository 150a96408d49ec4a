use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inbound event from a chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-assigned numeric user id.
    pub sender_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Message text; absent for bare document/photo messages.
    pub text: Option<String>,
    /// Attachment carried by the message, if any.
    #[serde(default)]
    pub attachment: AttachmentKind,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the reply (Telegram chat id).
    pub reply_target: i64,
}

impl InboundEvent {
    /// Human-readable sender name for logging, preferring the username.
    pub fn sender_name(&self) -> String {
        if let Some(ref un) = self.username {
            format!("@{un}")
        } else {
            match (&self.first_name, &self.last_name) {
                (Some(first), Some(last)) => format!("{first} {last}"),
                (Some(first), None) => first.clone(),
                _ => self.sender_id.to_string(),
            }
        }
    }
}

/// A reply to send back through a channel. Exactly one per inbound event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundReply {
    /// Platform-specific target (Telegram chat id).
    pub reply_target: i64,
    pub text: String,
}

/// Kind of attachment on an inbound event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    #[default]
    None,
    Document,
    Photo,
}
