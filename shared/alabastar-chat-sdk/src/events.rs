//! WebSocket wire events
//!
//! Frames are JSON objects of shape `{ "event": "...", "data": { ... } }`
//! with the event names the backend expects (`message:new` etc.).

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Server-to-client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:new")]
    MessageNew { message: Message },

    #[serde(rename = "typing:start")]
    TypingStart { conversation_id: i64, user_id: i64 },

    #[serde(rename = "typing:stop")]
    TypingStop { conversation_id: i64, user_id: i64 },

    #[serde(rename = "user:online")]
    UserOnline { user_id: i64 },

    #[serde(rename = "user:offline")]
    UserOffline { user_id: i64 },
}

/// Client-to-server events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "conversation:join")]
    ConversationJoin { conversation_id: i64 },

    #[serde(rename = "conversation:leave")]
    ConversationLeave { conversation_id: i64 },

    #[serde(rename = "typing:start")]
    TypingStart { conversation_id: i64 },

    #[serde(rename = "typing:stop")]
    TypingStop { conversation_id: i64 },

    #[serde(rename = "message:read")]
    MessageRead { conversation_id: i64 },
}
