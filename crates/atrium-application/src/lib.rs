//! Application layer for Atrium.
//!
//! Use cases that coordinate the domain with its adapters: streaming a chat
//! reply into the session, and the mock account service behind `/auth`.

pub mod auth_service;
pub mod chat_usecase;

pub use auth_service::{AuthError, AuthService, Claims, extract_bearer};
pub use chat_usecase::{ChatUseCase, SendOutcome};
