//! Error types for the chat client

use alabastar_chat_sdk::EnvelopeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Live connection failed to establish or was rejected. Fatal to the
    /// session; the caller re-initializes after a fresh login.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A REST hydration call failed. Recovered locally (empty state plus
    /// manual refresh); never fatal.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Message or attachment send failed. The caller keeps the typed
    /// content and decides whether to retry.
    #[error("Send error: {0}")]
    Send(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Whether the error tears down the whole messaging session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Whether a bounded retry is worth attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout(_))
    }
}

impl From<EnvelopeError> for ChatError {
    fn from(err: EnvelopeError) -> Self {
        ChatError::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Protocol(err.to_string())
    }
}
