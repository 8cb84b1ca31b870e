//! HTTP implementation of the chat transport port.
//!
//! Posts a [`ChatRequest`] to the relay's `/api/chat` endpoint and turns
//! the event stream into running assistant text.

use crate::error::TransportError;
use crate::frame::RelayFrame;
use crate::sse;
use async_trait::async_trait;
use atrium_core::chat::{ChatRequest, ChatTransport, ContentStream};
use atrium_core::error::Result;
use futures::stream::StreamExt;
use reqwest::Client;

/// Streams chat responses from the relay server.
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    server_url: String,
}

impl HttpChatTransport {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.server_url)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ContentStream> {
        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(TransportError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, persona = %request.persona_id, "Relay rejected chat request");
            return Err(TransportError::from_status(status, &body).into());
        }

        let frames = sse::data_stream(response.bytes_stream());
        Ok(accumulate(frames))
    }
}

/// Folds relay payloads into running text.
///
/// Malformed payloads are skipped. The stream ends at `[DONE]`, after an
/// error frame (yielded as `Err`), or when the connection closes.
pub(crate) fn accumulate<E>(
    payloads: futures::stream::BoxStream<'static, std::result::Result<String, E>>,
) -> ContentStream
where
    E: std::fmt::Display + Send + 'static,
{
    futures::stream::unfold(
        (payloads, String::new(), false),
        |(mut payloads, mut text, finished)| async move {
            if finished {
                return None;
            }
            loop {
                let payload = match payloads.next().await? {
                    Ok(payload) => payload,
                    Err(e) => {
                        let err = TransportError::Network(e.to_string());
                        return Some((Err(err.into()), (payloads, text, true)));
                    }
                };

                match RelayFrame::parse(&payload) {
                    Some(RelayFrame::Delta(delta)) => {
                        if delta.is_empty() {
                            continue;
                        }
                        text.push_str(&delta);
                        let snapshot = text.clone();
                        return Some((Ok(snapshot), (payloads, text, false)));
                    }
                    Some(RelayFrame::Error(message)) => {
                        let err = TransportError::Relay(message);
                        return Some((Err(err.into()), (payloads, text, true)));
                    }
                    Some(RelayFrame::Done) => return None,
                    None => {
                        tracing::debug!(payload = %payload, "Skipping malformed relay frame");
                    }
                }
            }
        },
    )
    .boxed()
}
