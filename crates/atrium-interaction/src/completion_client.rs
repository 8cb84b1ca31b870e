//! Streaming client for OpenAI-compatible chat completion APIs.
//!
//! Used by the relay server to forward a persona conversation upstream and
//! receive the reply as a stream of text deltas.

use crate::sse;
use atrium_core::chat::{HistoryEntry, MessageRole};
use atrium_core::config::UpstreamConfig;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking to the upstream completion API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Upstream API key is not configured")]
    MissingApiKey,

    /// Connection, DNS or body read failure.
    #[error("Upstream request failed: {0}")]
    Network(String),

    /// Non-success HTTP status before streaming began.
    #[error("Upstream returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Error frame received mid-stream; carries the upstream message as is.
    #[error("{0}")]
    Stream(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Network(err.to_string())
    }
}

/// Text deltas from one completion; an `Err` item ends the stream.
pub type CompletionStream = BoxStream<'static, Result<String, CompletionError>>;

/// One message in the upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

impl UpstreamMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

/// Builds the upstream message list: system prompt, the most recent
/// `history_limit` history entries, then the new user message.
pub fn build_messages(
    system_prompt: &str,
    history: &[HistoryEntry],
    message: &str,
    history_limit: usize,
) -> Vec<UpstreamMessage> {
    let skip = history.len().saturating_sub(history_limit);

    let mut messages = Vec::with_capacity(history.len() - skip + 2);
    messages.push(UpstreamMessage::new(MessageRole::System, system_prompt));
    messages.extend(
        history
            .iter()
            .skip(skip)
            .filter(|entry| entry.role != MessageRole::System)
            .map(|entry| UpstreamMessage::new(entry.role, entry.content.clone())),
    );
    messages.push(UpstreamMessage::new(MessageRole::User, message));
    messages
}

/// Client for `{base_url}/chat/completions` with `stream: true`.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl CompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Builds a client from configuration; fails if no API key is set.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let mut client = Self::new(&config.base_url, api_key, &config.model);
        client.max_tokens = config.max_tokens;
        client.temperature = config.temperature;
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the request and returns the delta stream.
    ///
    /// Network failures and non-success statuses are returned here, before
    /// any delta is produced.
    pub async fn stream(
        &self,
        messages: Vec<UpstreamMessage>,
    ) -> Result<CompletionStream, CompletionError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(url = %url, model = %self.model, "Opening upstream completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read upstream error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let deltas = sse::data_stream(response.bytes_stream())
            .map(|item| item.map_err(|e| CompletionError::Network(e.to_string())))
            .filter_map(|item| async move {
                match item {
                    Ok(data) => decode_chunk(&data),
                    Err(e) => Some(Err(e)),
                }
            })
            // Ends at DONE or right after the first error
            .scan(false, |done, item| {
                if *done {
                    return futures::future::ready(None);
                }
                let item = match item {
                    Ok(Chunk::Done) => None,
                    Ok(Chunk::Text(text)) => Some(Ok(text)),
                    Err(e) => {
                        *done = true;
                        Some(Err(e))
                    }
                };
                futures::future::ready(item)
            });

        Ok(deltas.boxed())
    }
}

enum Chunk {
    Text(String),
    Done,
}

/// Classifies one upstream payload; `None` means skip.
fn decode_chunk(data: &str) -> Option<Result<Chunk, CompletionError>> {
    if data.trim() == crate::frame::DONE_SENTINEL {
        return Some(Ok(Chunk::Done));
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed upstream frame");
            return None;
        }
    };

    if let Ok(wrapper) = serde_json::from_value::<ErrorResponse>(value.clone()) {
        return Some(Err(CompletionError::Stream(wrapper.error.message)));
    }

    let chunk: StreamChunk = serde_json::from_value(value).ok()?;
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(|content| Ok(Chunk::Text(content)))
}

fn map_http_error(status: StatusCode, body: String) -> CompletionError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    CompletionError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<UpstreamMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}
