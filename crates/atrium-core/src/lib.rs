//! Domain layer for Atrium.
//!
//! Holds the chat session state, persona and account models, configuration
//! types, and the ports (`KeyValueStore`, `ChatTransport`, `UserRepository`,
//! `PersonaRepository`) implemented by the adapter crates.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod guest;
pub mod persona;
pub mod storage;

// Re-export common error type
pub use error::{AtriumError, Result};
