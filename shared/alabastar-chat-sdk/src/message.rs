//! Message types for marketplace messaging

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::Participant;

/// Message entity
///
/// Ids are unique within a conversation. Content may be empty for
/// pure-attachment messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub sender: Participant,
    pub content: String,
    pub message_type: MessageType,
    pub media_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Message type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    File,
    Audio,
    Video,
}

/// Outbound attachment payload for `send_message`
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Message {
    /// Create a new text message
    pub fn new_text(
        id: i64,
        conversation_id: i64,
        sender: Participant,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id: sender.id,
            sender,
            content: content.into(),
            message_type: MessageType::Text,
            media_url: None,
            file_name: None,
            file_size: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_attachment(&self) -> bool {
        self.media_url.is_some()
    }
}
