//! Alabastar Chat SDK
//!
//! Protocol types and client-side state for the marketplace messaging flow.
//! Everything here is pure and synchronous; transport lives in
//! `alabastar-chat-client`.

pub mod conversation;
pub mod conversation_list;
pub mod envelope;
pub mod events;
pub mod message;
pub mod message_log;
pub mod presence;


pub use conversation::{Conversation, ConversationType, Participant};
pub use conversation_list::ConversationList;
pub use envelope::{ApiEnvelope, EnvelopeError};
pub use events::{ClientEvent, ServerEvent};
pub use message::{Attachment, Message, MessageType};
pub use message_log::MessageLog;
pub use presence::TypingSet;
