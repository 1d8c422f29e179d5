//! Listener registry for live-connection events
//!
//! `on` hands back an explicit [`SubscriptionId`]; removal goes through
//! that handle, so registering the same closure twice cannot leave a
//! phantom registration behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use alabastar_chat_sdk::ServerEvent;

/// Transport-level view of the live connection
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// A connection was freshly established, including after an internal
    /// reconnect. Room membership does not survive a reconnect; listeners
    /// re-join on this event.
    Connected,
    /// The connection dropped and reconnection attempts are exhausted.
    Disconnected,
    /// An inbound wire event.
    Server(ServerEvent),
}

/// Dispatch key for listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    MessageNew,
    TypingStart,
    TypingStop,
    UserOnline,
    UserOffline,
}

impl SocketEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SocketEvent::Connected => EventKind::Connected,
            SocketEvent::Disconnected => EventKind::Disconnected,
            SocketEvent::Server(ServerEvent::MessageNew { .. }) => EventKind::MessageNew,
            SocketEvent::Server(ServerEvent::TypingStart { .. }) => EventKind::TypingStart,
            SocketEvent::Server(ServerEvent::TypingStop { .. }) => EventKind::TypingStop,
            SocketEvent::Server(ServerEvent::UserOnline { .. }) => EventKind::UserOnline,
            SocketEvent::Server(ServerEvent::UserOffline { .. }) => EventKind::UserOffline,
        }
    }
}

/// Handle returned by [`ListenerRegistry::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

/// Registry mapping event kinds to subscribed callbacks
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: DashMap<EventKind, Vec<(u64, Callback)>>,
    index: DashMap<u64, EventKind>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event kind and return its handle.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&SocketEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        self.index.insert(id, kind);
        SubscriptionId(id)
    }

    /// Remove the registration behind a handle. Returns false if the
    /// handle was already removed.
    pub fn off(&self, subscription: SubscriptionId) -> bool {
        let Some((id, kind)) = self.index.remove(&subscription.0) else {
            return false;
        };
        if let Some(mut entry) = self.listeners.get_mut(&kind) {
            entry.retain(|(listener_id, _)| *listener_id != id);
        }
        true
    }

    /// Invoke every callback registered for the event's kind.
    pub fn dispatch(&self, event: &SocketEvent) {
        // Snapshot the callbacks so a listener calling `off` mid-dispatch
        // cannot deadlock against the map entry.
        let callbacks: Vec<Callback> = self
            .listeners
            .get(&event.kind())
            .map(|entry| entry.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in callbacks {
            callback(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_on_dispatch_off() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let handle = registry.on(EventKind::Connected, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&SocketEvent::Connected);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(registry.off(handle));
        registry.dispatch(&SocketEvent::Connected);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Second removal through the same handle is a no-op.
        assert!(!registry.off(handle));
    }

    #[test]
    fn test_handles_are_independent() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = {
            let counter = Arc::clone(&hits);
            registry.on(EventKind::Disconnected, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _second = {
            let counter = Arc::clone(&hits);
            registry.on(EventKind::Disconnected, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        registry.off(first);
        registry.dispatch(&SocketEvent::Disconnected);

        // Only the surviving registration fires.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.listener_count(EventKind::Disconnected), 1);
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        registry.on(EventKind::UserOnline, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&SocketEvent::Server(ServerEvent::UserOffline { user_id: 1 }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        registry.dispatch(&SocketEvent::Server(ServerEvent::UserOnline { user_id: 1 }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
