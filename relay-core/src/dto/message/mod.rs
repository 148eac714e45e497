//! Message DTOs for the orchestrator HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::message::Message;

/// Acknowledgement of an appended message
///
/// Carries the timestamp the orchestrator assigned to the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageResponse {
    pub timestamp: DateTime<Utc>,
}

/// A single message as returned to polling callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(with = "crate::encoding::base64")]
    pub payload: Vec<u8>,
}

impl From<Message> for MessageEntry {
    fn from(message: Message) -> Self {
        Self {
            timestamp: message.timestamp,
            payload: message.payload,
        }
    }
}

/// Ordered batch of messages, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageEntry>,
}

impl MessagesResponse {
    /// Timestamp of the newest message in the batch
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.timestamp)
    }
}

/// Number of messages removed by a delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMessagesResponse {
    pub deleted: u64,
}
