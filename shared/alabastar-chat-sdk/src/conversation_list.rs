//! Conversation list state
//!
//! Single source of truth for the conversation sidebar. The list is kept
//! sorted by last-activity timestamp, descending; ties keep their
//! existing order (stable sort).

use crate::conversation::Conversation;
use crate::message::Message;

/// Ordered working set of conversations
#[derive(Debug, Default)]
pub struct ConversationList {
    conversations: Vec<Conversation>,
}

impl ConversationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Replace the full working set with a freshly fetched list and
    /// re-apply the sort invariant.
    pub fn hydrate(&mut self, list: Vec<Conversation>) {
        self.conversations = list;
        self.sort();
    }

    /// Fold a live message into the list: refresh the matching
    /// conversation's preview and last activity, then re-sort. Messages
    /// for conversations not yet known client-side are a no-op; they will
    /// appear on the next hydration. Messages not sent by `local_user_id`
    /// bump the unread count.
    pub fn apply_incoming_message(&mut self, message: &Message, local_user_id: i64) {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        else {
            return;
        };

        conversation.last_message = Some(message.clone());
        conversation.last_activity = message.created_at;
        if message.sender_id != local_user_id {
            conversation.unread_count = conversation.unread_count.saturating_add(1);
        }
        self.sort();
    }

    /// Set the online flag for `user_id` in every conversation that
    /// embeds them. Does not affect ordering.
    pub fn apply_presence(&mut self, user_id: i64, is_online: bool) {
        for conversation in &mut self.conversations {
            for participant in &mut conversation.participants {
                if participant.id == user_id {
                    participant.is_online = is_online;
                }
            }
        }
    }

    /// Insert a conversation created client-side. Any existing entry with
    /// the same id is removed first; the new entry goes to the front and
    /// the sort invariant is re-applied, so a just-created conversation
    /// naturally lands on top by virtue of having the newest activity.
    pub fn upsert_conversation(&mut self, conversation: Conversation) {
        self.conversations.retain(|c| c.id != conversation.id);
        self.conversations.insert(0, conversation);
        self.sort();
    }

    /// Zero the unread count for a conversation, e.g. when it is opened.
    pub fn mark_read(&mut self, id: i64) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.unread_count = 0;
        }
    }

    fn sort(&mut self) {
        // Vec::sort_by is stable: ties keep insertion order.
        self.conversations
            .sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    }
}
