//! Transport seam between the session and the network
//!
//! The session talks to a [`ChatTransport`] object it owns, never to
//! ambient globals, so tests can substitute a scripted fake.

use async_trait::async_trait;

use alabastar_chat_sdk::{Attachment, ClientEvent, Conversation, Message};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::rest::RestClient;
use crate::socket::SocketClient;

/// Everything the session needs from the network: one live connection
/// plus the REST hydration and send calls.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn connect(&self, session_token: &str) -> Result<()>;

    fn disconnect(&self);

    /// Fire-and-forget; dropped silently while disconnected.
    fn emit(&self, event: &ClientEvent);

    async fn get_conversations(&self, page: u32, limit: u32) -> Result<Vec<Conversation>>;

    async fn get_messages(
        &self,
        conversation_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Message>>;

    async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message>;

    async fn create_conversation(
        &self,
        participant_id: i64,
        booking_id: Option<i64>,
    ) -> Result<Conversation>;
}

/// Production transport: REST client + live socket behind one facade.
pub struct ChatApi {
    rest: RestClient,
    socket: SocketClient,
}

impl ChatApi {
    pub fn new(config: &ChatConfig, session_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new(config, session_token)?,
            socket: SocketClient::new(config),
        })
    }

    pub fn socket(&self) -> &SocketClient {
        &self.socket
    }
}

#[async_trait]
impl ChatTransport for ChatApi {
    async fn connect(&self, session_token: &str) -> Result<()> {
        self.socket.connect(session_token).await
    }

    fn disconnect(&self) {
        self.socket.disconnect();
    }

    fn emit(&self, event: &ClientEvent) {
        self.socket.emit(event);
    }

    async fn get_conversations(&self, page: u32, limit: u32) -> Result<Vec<Conversation>> {
        self.rest.get_conversations(page, limit).await
    }

    async fn get_messages(
        &self,
        conversation_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Message>> {
        self.rest.get_messages(conversation_id, page, limit).await
    }

    async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        self.rest
            .send_message(conversation_id, content, attachment)
            .await
    }

    async fn create_conversation(
        &self,
        participant_id: i64,
        booking_id: Option<i64>,
    ) -> Result<Conversation> {
        self.rest
            .create_conversation(participant_id, booking_id)
            .await
    }
}
