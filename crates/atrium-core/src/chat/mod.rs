//! Chat domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`Message`, `MessageRole`, `HistoryEntry`)
//! - `session`: Per-partner conversation state (`ChatSession`, `ChatEvent`)
//! - `transport`: Port for streaming requests to the relay (`ChatTransport`)

mod message;
mod session;
mod transport;

// Re-export public API
pub use message::{HistoryEntry, Message, MessageRole};
pub use session::{ChatEvent, ChatSession, Conversations, StreamHandle};
pub use transport::{ChatRequest, ChatTransport, ContentStream};
