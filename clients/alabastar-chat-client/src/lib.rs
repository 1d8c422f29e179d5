//! Alabastar Chat Client
//!
//! Transport and session coordination for the marketplace messaging
//! flow: a REST client for hydration, a live WebSocket connection for
//! events, and a session object that owns the conversation list, the
//! open conversation's message log, and typing/presence state.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use alabastar_chat_client::{ChatApi, ChatConfig, ChatSession};
//!
//! # async fn run(session_token: &str, user_id: i64) -> alabastar_chat_client::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let transport = Arc::new(ChatApi::new(&config, session_token)?);
//! let mut events = transport.socket().event_stream();
//!
//! let mut session = ChatSession::new(Arc::clone(&transport), user_id, config.page_size);
//! session.start(session_token).await?;
//! session.select_conversation(42).await?;
//!
//! while let Some(event) = events.recv().await {
//!     session.handle_event(event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod rest;
pub mod session;
pub mod socket;
pub mod telemetry;
pub mod transport;

pub use config::{ChatConfig, RetryPolicy};
pub use error::{ChatError, Result};
pub use registry::{EventKind, ListenerRegistry, SocketEvent, SubscriptionId};
pub use rest::RestClient;
pub use session::{ActiveConversation, ChatSession, HydrationTicket};
pub use socket::SocketClient;
pub use telemetry::{init_tracing, TelemetryConfig};
pub use transport::{ChatApi, ChatTransport};
