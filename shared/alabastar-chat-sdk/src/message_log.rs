//! Message list state for the open conversation
//!
//! Holds the ordered message log for exactly one conversation at a time.
//! The working set is discarded whenever the open conversation changes.

use crate::message::Message;

/// Ordered message log, hydrated from REST and updated by live events
#[derive(Debug, Default)]
pub struct MessageLog {
    conversation_id: Option<i64>,
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation the log currently belongs to, if any.
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard any existing messages and adopt the fetched list, assumed
    /// already in chronological order from the server.
    pub fn hydrate(&mut self, conversation_id: i64, list: Vec<Message>) {
        self.conversation_id = Some(conversation_id);
        self.messages = list;
    }

    /// Append a message, or replace the existing entry with the same id
    /// in place. The replace path reconciles an optimistically tracked
    /// message with its server-confirmed fields without duplicating or
    /// reordering.
    pub fn append(&mut self, message: Message) {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
        } else {
            self.messages.push(message);
        }
    }

    /// Empty the working set; invoked on conversation switch or
    /// deselection.
    pub fn clear(&mut self) {
        self.conversation_id = None;
        self.messages.clear();
    }
}
