//! Typing indicator state
//!
//! Ephemeral set of user ids typing in the open conversation. Derived
//! only from live events; reset on conversation switch. The local user is
//! never shown as typing to themselves.

use std::collections::HashSet;

/// Typing set scoped to the currently open conversation
#[derive(Debug)]
pub struct TypingSet {
    local_user_id: i64,
    typing: HashSet<i64>,
}

impl TypingSet {
    pub fn new(local_user_id: i64) -> Self {
        Self {
            local_user_id,
            typing: HashSet::new(),
        }
    }

    /// Add a user to the typing set. Self-originated typing is ignored.
    pub fn mark_typing(&mut self, user_id: i64) {
        if user_id == self.local_user_id {
            return;
        }
        self.typing.insert(user_id);
    }

    pub fn clear_typing(&mut self, user_id: i64) {
        self.typing.remove(&user_id);
    }

    /// Drop all entries, e.g. when the open conversation changes.
    pub fn reset(&mut self) {
        self.typing.clear();
    }

    pub fn is_typing(&self, user_id: i64) -> bool {
        self.typing.contains(&user_id)
    }

    pub fn typists(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.typing.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.typing.is_empty()
    }
}
