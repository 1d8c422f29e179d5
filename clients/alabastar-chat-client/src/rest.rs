//! REST API client for conversation and message hydration
//!
//! Thin wrapper over the backend's `/messages` endpoints. Responses are
//! JSON envelopes (`{ success, data, message }`). Hydration GETs retry
//! with bounded exponential backoff; sends never auto-retry so the caller
//! keeps control of the typed content.

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use alabastar_chat_sdk::{ApiEnvelope, Attachment, Conversation, Message};

use crate::config::{ChatConfig, RetryPolicy};
use crate::error::{ChatError, Result};

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(config: &ChatConfig, session_token: impl Into<String>) -> Result<Self> {
        let session_token = session_token.into();
        if session_token.is_empty() {
            return Err(ChatError::Config("empty session token".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session_token,
            retry: config.retry.clone(),
        })
    }

    /// List conversations in the server-determined order.
    pub async fn get_conversations(&self, page: u32, limit: u32) -> Result<Vec<Conversation>> {
        let url = format!(
            "{}/messages/conversations?page={}&limit={}",
            self.base_url, page, limit
        );
        self.get_with_retry(&url).await
    }

    /// List messages for one conversation, oldest to newest.
    pub async fn get_messages(
        &self,
        conversation_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let url = format!(
            "{}/messages/conversations/{}?page={}&limit={}",
            self.base_url, conversation_id, page, limit
        );
        self.get_with_retry(&url).await
    }

    /// Send a message, optionally with an attachment, and return the
    /// authoritative created message.
    pub async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<Message> {
        let url = format!(
            "{}/messages/conversations/{}/messages",
            self.base_url, conversation_id
        );

        let request = self.http.post(&url).bearer_auth(&self.session_token);
        let request = match attachment {
            Some(attachment) => {
                let part = reqwest::multipart::Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name)
                    .mime_str(&attachment.mime_type)
                    .map_err(|e| ChatError::Send(format!("invalid attachment type: {e}")))?;
                let form = reqwest::multipart::Form::new()
                    .text("content", content.to_string())
                    .part("file", part);
                request.multipart(form)
            }
            None => request.json(&json!({ "content": content })),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = Self::failure_detail(response).await;
            return Err(ChatError::Send(format!("HTTP {status}: {detail}")));
        }

        let envelope: ApiEnvelope<Message> = response
            .json()
            .await
            .map_err(|e| ChatError::Protocol(e.to_string()))?;
        let message = envelope
            .into_data()
            .map_err(|e| ChatError::Send(e.to_string()))?;

        debug!(
            conversation_id,
            message_id = message.id,
            "Message accepted by server"
        );
        Ok(message)
    }

    /// Create (or fetch the existing) conversation with a participant.
    pub async fn create_conversation(
        &self,
        participant_id: i64,
        booking_id: Option<i64>,
    ) -> Result<Conversation> {
        let url = format!("{}/messages/conversations", self.base_url);
        let body = json!({
            "participant_id": participant_id,
            "booking_id": booking_id,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.session_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = Self::failure_detail(response).await;
            return Err(ChatError::Fetch(format!("HTTP {status}: {detail}")));
        }

        let envelope: ApiEnvelope<Conversation> = response
            .json()
            .await
            .map_err(|e| ChatError::Protocol(e.to_string()))?;
        Ok(envelope.into_data()?)
    }

    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            match self.get_once(url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.maximum_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    // Quarter-interval jitter to spread thundering herds.
                    let jitter = delay.mul_f64(rand::random::<f64>() * 0.25);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = (delay + jitter).as_millis() as u64,
                        error = %err,
                        "Hydration fetch failed, retrying"
                    );
                    tokio::time::sleep(delay + jitter).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.session_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout(e.to_string())
                } else {
                    ChatError::Fetch(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            let detail = Self::failure_detail(response).await;
            return Err(ChatError::Fetch(format!("HTTP {status}: {detail}")));
        }
        if !status.is_success() {
            // Client errors do not retry.
            let detail = Self::failure_detail(response).await;
            return Err(ChatError::Protocol(format!("HTTP {status}: {detail}")));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ChatError::Protocol(e.to_string()))?;
        Ok(envelope.into_data()?)
    }

    /// Best-effort extraction of the envelope message from a failed
    /// response body.
    async fn failure_detail(response: reqwest::Response) -> String {
        match response.json::<ApiEnvelope<serde_json::Value>>().await {
            Ok(envelope) => envelope
                .message
                .unwrap_or_else(|| "no error detail".to_string()),
            Err(_) => "unreadable error body".to_string(),
        }
    }
}
