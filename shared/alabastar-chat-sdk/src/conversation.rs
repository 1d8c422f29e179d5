//! Conversation types for marketplace messaging

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Conversation aggregate as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(rename = "type")]
    pub conversation_type: ConversationType,
    pub name: Option<String>,
    pub participants: Vec<Participant>,
    pub last_message: Option<Message>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

/// Conversation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Direct,
    Group,
}

/// Participant in a conversation
///
/// Embedded by value in `Conversation::participants` and
/// `Message::sender`. `is_online` is the only field mutated in place,
/// driven by presence events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_online: bool,
}

impl Conversation {
    /// Create a direct conversation between two participants
    pub fn new_direct(id: i64, a: Participant, b: Participant) -> Self {
        Self {
            id,
            conversation_type: ConversationType::Direct,
            name: None,
            participants: vec![a, b],
            last_message: None,
            last_activity: Utc::now(),
            unread_count: 0,
        }
    }

    /// Display title: explicit name, or the other participants' names
    pub fn title(&self, local_user_id: i64) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let names: Vec<&str> = self
            .participants
            .iter()
            .filter(|p| p.id != local_user_id)
            .map(|p| p.display_name.as_str())
            .collect();
        names.join(", ")
    }

    pub fn has_participant(&self, user_id: i64) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

impl Participant {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            is_online: false,
        }
    }
}
