//! HTTP adapters for Atrium.
//!
//! - [`HttpChatTransport`]: the client side of the relay's chat stream
//! - [`CompletionClient`]: the relay's upstream completion stream
//! - [`AuthClient`]: the relay's mock auth endpoints
//! - [`PersonaClient`]: the relay's persona catalog
//!
//! Both streams read their payloads through [`sse::data_stream`].

pub mod auth_client;
pub mod chat_transport;
pub mod completion_client;
pub mod error;
pub mod frame;
pub mod persona_client;
pub mod sse;

pub use auth_client::AuthClient;
pub use chat_transport::HttpChatTransport;
pub use completion_client::{
    CompletionClient, CompletionError, CompletionStream, UpstreamMessage, build_messages,
};
pub use error::TransportError;
pub use frame::RelayFrame;
pub use persona_client::PersonaClient;
