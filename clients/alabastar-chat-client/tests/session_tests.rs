//! Session coordinator integration tests against a scripted transport

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use alabastar_chat_client::{
    ActiveConversation, ChatError, ChatSession, ChatTransport, Result, SocketEvent,
};
use alabastar_chat_sdk::{
    Attachment, ClientEvent, Conversation, ConversationType, Message, MessageType, Participant,
    ServerEvent,
};

const LOCAL_USER: i64 = 1;
const PAGE_SIZE: u32 = 50;

fn ts(seconds: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, seconds).unwrap()
}

fn conversation(id: i64, other_user: i64, last_activity: DateTime<Utc>) -> Conversation {
    Conversation {
        id,
        conversation_type: ConversationType::Direct,
        name: None,
        participants: vec![
            Participant::new(LOCAL_USER, "Ada"),
            Participant::new(other_user, format!("user-{other_user}")),
        ],
        last_message: None,
        last_activity,
        unread_count: 0,
    }
}

fn message(id: i64, conversation_id: i64, sender_id: i64, content: &str) -> Message {
    Message {
        id,
        conversation_id,
        sender_id,
        sender: Participant::new(sender_id, format!("user-{sender_id}")),
        content: content.to_string(),
        message_type: MessageType::Text,
        media_url: None,
        file_name: None,
        file_size: None,
        created_at: ts(0),
    }
}

/// Scripted in-memory transport
#[derive(Default)]
struct FakeTransport {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<HashMap<i64, Vec<Message>>>,
    emitted: Mutex<Vec<ClientEvent>>,
    connected: AtomicBool,
    fail_sends: AtomicBool,
    fail_fetches: AtomicBool,
    next_message_id: AtomicI64,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    fn with_conversations(self, list: Vec<Conversation>) -> Self {
        *self.conversations.lock() = list;
        self
    }

    fn with_messages(self, conversation_id: i64, list: Vec<Message>) -> Self {
        self.messages.lock().insert(conversation_id, list);
        self
    }

    fn emitted(&self) -> Vec<ClientEvent> {
        self.emitted.lock().clone()
    }

    fn clear_emitted(&self) {
        self.emitted.lock().clear();
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn connect(&self, session_token: &str) -> Result<()> {
        if session_token == "expired" {
            return Err(ChatError::Connection("token rejected".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn emit(&self, event: &ClientEvent) {
        self.emitted.lock().push(event.clone());
    }

    async fn get_conversations(&self, _page: u32, _limit: u32) -> Result<Vec<Conversation>> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ChatError::Fetch("scripted failure".to_string()));
        }
        Ok(self.conversations.lock().clone())
    }

    async fn get_messages(
        &self,
        conversation_id: i64,
        _page: u32,
        _limit: u32,
    ) -> Result<Vec<Message>> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ChatError::Fetch("scripted failure".to_string()));
        }
        Ok(self
            .messages
            .lock()
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
        _attachment: Option<Attachment>,
    ) -> Result<Message> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::Send("scripted failure".to_string()));
        }
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        let message = message(id, conversation_id, LOCAL_USER, content);
        self.messages
            .lock()
            .entry(conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn create_conversation(
        &self,
        participant_id: i64,
        _booking_id: Option<i64>,
    ) -> Result<Conversation> {
        let conversation = conversation(900 + participant_id, participant_id, Utc::now());
        self.conversations.lock().push(conversation.clone());
        Ok(conversation)
    }
}

fn session_with(transport: FakeTransport) -> (Arc<FakeTransport>, ChatSession<FakeTransport>) {
    let transport = Arc::new(transport);
    let session = ChatSession::new(Arc::clone(&transport), LOCAL_USER, PAGE_SIZE);
    (transport, session)
}

#[tokio::test]
async fn test_start_hydrates_sorted_conversations() {
    let (_, mut session) = session_with(FakeTransport::new().with_conversations(vec![
        conversation(1, 2, ts(10)),
        conversation(2, 3, ts(30)),
        conversation(3, 4, ts(20)),
    ]));

    session.start("token").await.unwrap();

    let ids: Vec<i64> = session
        .conversations()
        .conversations()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[tokio::test]
async fn test_rejected_token_is_fatal_connection_error() {
    let (_, mut session) = session_with(FakeTransport::new());

    let err = session.start("expired").await.unwrap_err();
    assert!(matches!(err, ChatError::Connection(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_select_joins_room_and_hydrates() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![message(1, 5, 2, "hello"), message(2, 5, 1, "hi")]),
    );
    session.start("token").await.unwrap();

    session.select_conversation(5).await.unwrap();

    assert_eq!(session.active(), ActiveConversation::Open(5));
    assert_eq!(session.messages().len(), 2);
    let emitted = transport.emitted();
    assert!(emitted.contains(&ClientEvent::ConversationJoin { conversation_id: 5 }));
    assert!(emitted.contains(&ClientEvent::MessageRead { conversation_id: 5 }));
}

#[tokio::test]
async fn test_switch_clears_messages_before_hydration_resolves() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10)), conversation(6, 3, ts(5))])
            .with_messages(5, vec![message(1, 5, 2, "a"), message(2, 5, 2, "b")]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();
    assert_eq!(session.messages().len(), 2);
    transport.clear_emitted();

    // Begin switching without letting the new hydration resolve.
    let _ticket = session.begin_select(6);

    assert!(session.messages().is_empty());
    assert_eq!(session.active(), ActiveConversation::Hydrating(6));
    let emitted = transport.emitted();
    assert_eq!(
        emitted[0],
        ClientEvent::ConversationLeave { conversation_id: 5 }
    );
    assert!(emitted.contains(&ClientEvent::ConversationJoin { conversation_id: 6 }));
}

#[tokio::test]
async fn test_stale_hydration_result_is_discarded() {
    let (_, mut session) = session_with(FakeTransport::new().with_conversations(vec![
        conversation(5, 2, ts(10)),
        conversation(6, 3, ts(5)),
    ]));
    session.start("token").await.unwrap();

    let stale = session.begin_select(5);
    let current = session.begin_select(6);

    // The fetch for 5 resolves late, after the user switched to 6.
    assert!(!session.commit_hydration(stale, vec![message(1, 5, 2, "old")]));
    assert!(session.messages().is_empty());
    assert_eq!(session.active(), ActiveConversation::Hydrating(6));

    assert!(session.commit_hydration(current, vec![message(9, 6, 3, "new")]));
    assert_eq!(session.active(), ActiveConversation::Open(6));
    assert_eq!(session.messages().messages()[0].id, 9);
}

#[tokio::test]
async fn test_live_events_during_hydration_are_buffered_and_replayed() {
    let (_, mut session) = session_with(FakeTransport::new().with_conversations(vec![
        conversation(5, 2, ts(10)),
    ]));
    session.start("token").await.unwrap();

    let ticket = session.begin_select(5);

    // Live traffic lands while the fetch is still in flight. Message 11
    // also appears in the hydrated page with older content.
    session.handle_event(SocketEvent::Server(ServerEvent::MessageNew {
        message: message(11, 5, 2, "live copy"),
    }));
    session.handle_event(SocketEvent::Server(ServerEvent::MessageNew {
        message: message(12, 5, 2, "only live"),
    }));
    assert!(session.messages().is_empty());

    let hydrated = vec![message(10, 5, 2, "a"), message(11, 5, 2, "stale copy")];
    assert!(session.commit_hydration(ticket, hydrated));

    let contents: Vec<&str> = session
        .messages()
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["a", "live copy", "only live"]);
}

#[tokio::test]
async fn test_reconnect_rejoins_open_room() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();
    transport.clear_emitted();

    session.handle_event(SocketEvent::Connected);

    assert_eq!(
        transport.emitted(),
        vec![ClientEvent::ConversationJoin { conversation_id: 5 }]
    );
}

#[tokio::test]
async fn test_incoming_message_reorders_list_and_counts_unread() {
    let (_, mut session) = session_with(FakeTransport::new().with_conversations(vec![
        conversation(1, 2, ts(10)),
        conversation(2, 3, ts(0)),
    ]));
    session.start("token").await.unwrap();

    let mut incoming = message(50, 2, 3, "are you there?");
    incoming.created_at = ts(20);
    session.handle_event(SocketEvent::Server(ServerEvent::MessageNew {
        message: incoming,
    }));

    let list = session.conversations();
    let ids: Vec<i64> = list.conversations().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(list.get(2).unwrap().unread_count, 1);
    // Not the open conversation, so the log is untouched.
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn test_send_appends_authoritative_message() {
    let (_, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();

    let sent = session.send_message("on my way", None).await.unwrap();

    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages().messages()[0].id, sent.id);
    let preview = session.conversations().get(5).unwrap();
    assert_eq!(preview.last_message.as_ref().unwrap().id, sent.id);
    // Own sends never count as unread.
    assert_eq!(preview.unread_count, 0);
}

#[tokio::test]
async fn test_send_failure_propagates_and_leaves_log_untouched() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![message(1, 5, 2, "hello")]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();
    transport.fail_sends.store(true, Ordering::SeqCst);

    let err = session.send_message("lost?", None).await.unwrap_err();

    assert!(matches!(err, ChatError::Send(_)));
    assert!(!err.is_fatal());
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn test_send_without_open_conversation_is_rejected() {
    let (_, mut session) = session_with(FakeTransport::new());
    session.start("token").await.unwrap();

    let err = session.send_message("hello?", None).await.unwrap_err();
    assert!(matches!(err, ChatError::Send(_)));
}

#[tokio::test]
async fn test_typing_events_scoped_to_open_conversation() {
    let (_, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10)), conversation(6, 3, ts(5))])
            .with_messages(5, vec![]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();

    // Other conversation: ignored.
    session.handle_event(SocketEvent::Server(ServerEvent::TypingStart {
        conversation_id: 6,
        user_id: 3,
    }));
    // Open conversation: tracked.
    session.handle_event(SocketEvent::Server(ServerEvent::TypingStart {
        conversation_id: 5,
        user_id: 2,
    }));
    // Echo of our own typing: suppressed.
    session.handle_event(SocketEvent::Server(ServerEvent::TypingStart {
        conversation_id: 5,
        user_id: LOCAL_USER,
    }));

    assert_eq!(session.typing().typists(), vec![2]);

    session.handle_event(SocketEvent::Server(ServerEvent::TypingStop {
        conversation_id: 5,
        user_id: 2,
    }));
    assert!(session.typing().is_empty());
}

#[tokio::test]
async fn test_typing_reset_on_conversation_switch() {
    let (_, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10)), conversation(6, 3, ts(5))])
            .with_messages(5, vec![])
            .with_messages(6, vec![]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();
    session.handle_event(SocketEvent::Server(ServerEvent::TypingStart {
        conversation_id: 5,
        user_id: 2,
    }));
    assert!(session.typing().is_typing(2));

    session.select_conversation(6).await.unwrap();
    assert!(session.typing().is_empty());
}

#[tokio::test]
async fn test_presence_updates_participants_everywhere() {
    let (_, mut session) = session_with(FakeTransport::new().with_conversations(vec![
        conversation(1, 2, ts(10)),
        conversation(2, 2, ts(5)),
    ]));
    session.start("token").await.unwrap();

    session.handle_event(SocketEvent::Server(ServerEvent::UserOnline { user_id: 2 }));
    for conversation in session.conversations().conversations() {
        assert!(conversation
            .participants
            .iter()
            .find(|p| p.id == 2)
            .unwrap()
            .is_online);
    }

    session.handle_event(SocketEvent::Server(ServerEvent::UserOffline { user_id: 2 }));
    for conversation in session.conversations().conversations() {
        assert!(!conversation
            .participants
            .iter()
            .find(|p| p.id == 2)
            .unwrap()
            .is_online);
    }
}

#[tokio::test]
async fn test_start_conversation_upserts_and_opens() {
    let (transport, mut session) = session_with(FakeTransport::new());
    session.start("token").await.unwrap();

    let id = session.start_conversation(7, Some(321)).await.unwrap();

    assert_eq!(session.active(), ActiveConversation::Open(id));
    assert_eq!(session.conversations().conversations()[0].id, id);
    assert!(transport
        .emitted()
        .contains(&ClientEvent::ConversationJoin { conversation_id: id }));
}

#[tokio::test]
async fn test_deselect_leaves_room_and_clears() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![message(1, 5, 2, "hello")]),
    );
    session.start("token").await.unwrap();
    session.select_conversation(5).await.unwrap();
    transport.clear_emitted();

    session.deselect();

    assert_eq!(session.active(), ActiveConversation::NoneSelected);
    assert!(session.messages().is_empty());
    assert_eq!(
        transport.emitted(),
        vec![ClientEvent::ConversationLeave { conversation_id: 5 }]
    );
}

#[tokio::test]
async fn test_fetch_failure_keeps_session_usable() {
    let (transport, mut session) = session_with(
        FakeTransport::new()
            .with_conversations(vec![conversation(5, 2, ts(10))])
            .with_messages(5, vec![message(1, 5, 2, "hello")]),
    );
    session.start("token").await.unwrap();

    transport.fail_fetches.store(true, Ordering::SeqCst);
    let err = session.select_conversation(5).await.unwrap_err();
    assert!(matches!(err, ChatError::Fetch(_)));
    assert!(!err.is_fatal());
    assert_eq!(session.active(), ActiveConversation::Hydrating(5));

    // Selecting again after the blip recovers.
    transport.fail_fetches.store(false, Ordering::SeqCst);
    session.select_conversation(5).await.unwrap();
    assert_eq!(session.active(), ActiveConversation::Open(5));
    assert_eq!(session.messages().len(), 1);
}
