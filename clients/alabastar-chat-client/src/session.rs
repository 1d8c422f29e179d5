//! Messaging session coordinator
//!
//! Owns the transport and the client-side state for the messaging
//! screen: the conversation list, the open conversation's message log,
//! and the typing set. Drives the open-conversation state machine
//! (`NoneSelected` / `Hydrating` / `Open`) and folds live events into
//! state.

use std::sync::Arc;

use tracing::{debug, info, warn};

use alabastar_chat_sdk::{
    Attachment, ClientEvent, Conversation, ConversationList, Message, MessageLog, ServerEvent,
    TypingSet,
};

use crate::error::{ChatError, Result};
use crate::registry::SocketEvent;
use crate::transport::ChatTransport;

/// Open-conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConversation {
    NoneSelected,
    /// Selected, REST hydration still in flight.
    Hydrating(i64),
    Open(i64),
}

impl ActiveConversation {
    pub fn id(&self) -> Option<i64> {
        match self {
            ActiveConversation::NoneSelected => None,
            ActiveConversation::Hydrating(id) | ActiveConversation::Open(id) => Some(*id),
        }
    }
}

/// Tag for one in-flight message hydration. A commit whose ticket no
/// longer matches the live state is discarded, which is what guards
/// against a stale fetch overwriting a newer conversation's log.
#[derive(Debug, Clone, Copy)]
pub struct HydrationTicket {
    conversation_id: i64,
    epoch: u64,
}

impl HydrationTicket {
    pub fn conversation_id(&self) -> i64 {
        self.conversation_id
    }
}

pub struct ChatSession<T: ChatTransport> {
    transport: Arc<T>,
    local_user_id: i64,
    page_size: u32,
    conversations: ConversationList,
    messages: MessageLog,
    typing: TypingSet,
    active: ActiveConversation,
    hydration_epoch: u64,
    /// Live messages received while `Hydrating`; replayed after the
    /// hydration commits. `append`'s replace-on-id rule makes the replay
    /// idempotent against overlap with the hydrated page.
    pending_live: Vec<Message>,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: Arc<T>, local_user_id: i64, page_size: u32) -> Self {
        Self {
            transport,
            local_user_id,
            page_size,
            conversations: ConversationList::new(),
            messages: MessageLog::new(),
            typing: TypingSet::new(local_user_id),
            active: ActiveConversation::NoneSelected,
            hydration_epoch: 0,
            pending_live: Vec::new(),
        }
    }

    pub fn conversations(&self) -> &ConversationList {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn typing(&self) -> &TypingSet {
        &self.typing
    }

    pub fn active(&self) -> ActiveConversation {
        self.active
    }

    /// Connect the live transport and hydrate the conversation list.
    pub async fn start(&mut self, session_token: &str) -> Result<()> {
        self.transport.connect(session_token).await?;
        self.refresh_conversations().await
    }

    /// Re-fetch the conversation list, replacing the working set.
    pub async fn refresh_conversations(&mut self) -> Result<()> {
        let list = self.transport.get_conversations(1, self.page_size).await?;
        info!(count = list.len(), "Conversation list hydrated");
        self.conversations.hydrate(list);
        Ok(())
    }

    /// Select a conversation: leave the previous room, clear local state,
    /// join the new room, then hydrate its messages. On fetch failure the
    /// state stays `Hydrating` with an empty log; selecting again
    /// retries.
    pub async fn select_conversation(&mut self, conversation_id: i64) -> Result<()> {
        let ticket = self.begin_select(conversation_id);
        match self
            .transport
            .get_messages(conversation_id, 1, self.page_size)
            .await
        {
            Ok(messages) => {
                self.commit_hydration(ticket, messages);
                Ok(())
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "Message hydration failed");
                Err(e)
            }
        }
    }

    /// Synchronous first half of selection: room membership changes and
    /// state resets happen immediately, before the fetch resolves.
    pub fn begin_select(&mut self, conversation_id: i64) -> HydrationTicket {
        if let Some(previous) = self.active.id() {
            if previous != conversation_id {
                self.transport.emit(&ClientEvent::ConversationLeave {
                    conversation_id: previous,
                });
            }
        }

        self.messages.clear();
        self.typing.reset();
        self.pending_live.clear();
        self.active = ActiveConversation::Hydrating(conversation_id);
        self.hydration_epoch += 1;

        self.transport
            .emit(&ClientEvent::ConversationJoin { conversation_id });
        self.transport
            .emit(&ClientEvent::MessageRead { conversation_id });
        self.conversations.mark_read(conversation_id);

        HydrationTicket {
            conversation_id,
            epoch: self.hydration_epoch,
        }
    }

    /// Commit a resolved hydration. Returns false (and leaves state
    /// untouched) when the ticket is stale: the user has moved on since
    /// the fetch was issued.
    pub fn commit_hydration(&mut self, ticket: HydrationTicket, messages: Vec<Message>) -> bool {
        let current = self.active;
        if ticket.epoch != self.hydration_epoch
            || current != ActiveConversation::Hydrating(ticket.conversation_id)
        {
            debug!(
                conversation_id = ticket.conversation_id,
                "Discarding stale hydration result"
            );
            return false;
        }

        self.messages.hydrate(ticket.conversation_id, messages);
        for buffered in std::mem::take(&mut self.pending_live) {
            self.messages.append(buffered);
        }
        self.active = ActiveConversation::Open(ticket.conversation_id);
        true
    }

    /// Deselect the open conversation (back navigation).
    pub fn deselect(&mut self) {
        if let Some(id) = self.active.id() {
            self.transport
                .emit(&ClientEvent::ConversationLeave { conversation_id: id });
        }
        self.messages.clear();
        self.typing.reset();
        self.pending_live.clear();
        self.active = ActiveConversation::NoneSelected;
        self.hydration_epoch += 1;
    }

    /// Fold one live event into session state.
    pub fn handle_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Connected => {
                // Fresh connection: room membership did not survive, so
                // re-join the conversation the user is looking at.
                if let Some(id) = self.active.id() {
                    debug!(conversation_id = id, "Re-joining room after reconnect");
                    self.transport
                        .emit(&ClientEvent::ConversationJoin { conversation_id: id });
                }
            }
            SocketEvent::Disconnected => {
                warn!("Live connection lost; reconnection exhausted");
            }
            SocketEvent::Server(ServerEvent::MessageNew { message }) => {
                self.on_incoming_message(message);
            }
            SocketEvent::Server(ServerEvent::TypingStart {
                conversation_id,
                user_id,
            }) => {
                if self.active.id() == Some(conversation_id) {
                    self.typing.mark_typing(user_id);
                }
            }
            SocketEvent::Server(ServerEvent::TypingStop {
                conversation_id,
                user_id,
            }) => {
                if self.active.id() == Some(conversation_id) {
                    self.typing.clear_typing(user_id);
                }
            }
            SocketEvent::Server(ServerEvent::UserOnline { user_id }) => {
                self.conversations.apply_presence(user_id, true);
            }
            SocketEvent::Server(ServerEvent::UserOffline { user_id }) => {
                self.conversations.apply_presence(user_id, false);
            }
        }
    }

    fn on_incoming_message(&mut self, message: Message) {
        self.conversations
            .apply_incoming_message(&message, self.local_user_id);

        match self.active {
            ActiveConversation::Open(id) if id == message.conversation_id => {
                self.messages.append(message);
            }
            ActiveConversation::Hydrating(id) if id == message.conversation_id => {
                self.pending_live.push(message);
            }
            _ => {}
        }
    }

    /// Send a message in the open conversation and reconcile the
    /// authoritative response into local state. Failures propagate as
    /// send errors so the caller can keep the typed content.
    pub async fn send_message(
        &mut self,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        let ActiveConversation::Open(conversation_id) = self.active else {
            return Err(ChatError::Send("no open conversation".to_string()));
        };

        let message = self
            .transport
            .send_message(conversation_id, content, attachment)
            .await?;

        self.messages.append(message.clone());
        self.conversations
            .apply_incoming_message(&message, self.local_user_id);
        Ok(message)
    }

    /// Create (or resume) a conversation with a provider and open it.
    pub async fn start_conversation(
        &mut self,
        participant_id: i64,
        booking_id: Option<i64>,
    ) -> Result<i64> {
        let conversation: Conversation = self
            .transport
            .create_conversation(participant_id, booking_id)
            .await?;
        let conversation_id = conversation.id;
        self.conversations.upsert_conversation(conversation);
        self.select_conversation(conversation_id).await?;
        Ok(conversation_id)
    }

    /// Broadcast the local user's typing state for the open
    /// conversation.
    pub fn notify_typing(&self, started: bool) {
        let ActiveConversation::Open(conversation_id) = self.active else {
            return;
        };
        let event = if started {
            ClientEvent::TypingStart { conversation_id }
        } else {
            ClientEvent::TypingStop { conversation_id }
        };
        self.transport.emit(&event);
    }

    /// Dispose the session: leave the open room and tear the connection
    /// down.
    pub fn shutdown(&mut self) {
        self.deselect();
        self.transport.disconnect();
    }
}
