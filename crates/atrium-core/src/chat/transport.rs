//! Chat transport port.
//!
//! The session layer talks to the relay through this trait; the HTTP
//! implementation lives in `atrium-interaction`.

use super::message::HistoryEntry;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Request body sent to the relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Persona the message is addressed to.
    pub persona_id: String,
    /// The new user message.
    pub message: String,
    /// Bounded recent conversation history, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Correlation key for the visitor's guest record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
}

/// Stream of running assistant text.
///
/// Each item is the full text received so far, not the latest delta. An
/// `Err` item is a mid-stream failure and is always the final item.
pub type ContentStream = BoxStream<'static, Result<String>>;

/// Opens streaming chat requests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issues one request and returns its content stream.
    ///
    /// An error from this method means the request failed before any content
    /// was streamed (network failure or non-success status).
    async fn open(&self, request: &ChatRequest) -> Result<ContentStream>;
}
