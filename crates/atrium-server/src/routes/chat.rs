//! Streaming chat relay.
//!
//! Validates the request, opens the upstream completion stream and re-emits
//! each delta as a relay frame. Upstream failures before the first delta are
//! reported as a plain 502; later failures become an error frame.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use atrium_core::chat::ChatRequest;
use atrium_interaction::{CompletionStream, RelayFrame, build_messages};

use crate::app::AppState;
use crate::error::ApiError;

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".to_string()));
    }

    let persona = state
        .personas
        .find_by_id(&request.persona_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown persona: {}", request.persona_id)))?;

    let client = state
        .completion
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Upstream API key is not configured".to_string()))?;

    let messages = build_messages(
        &persona.system_prompt(),
        &request.history,
        &request.message,
        state.history_limit,
    );

    tracing::info!(
        persona = %persona.id,
        guest_id = request.guest_id.as_deref().unwrap_or("-"),
        history = messages.len() - 2,
        "Relaying chat request"
    );

    let deltas = client.stream(messages).await.map_err(|e| {
        tracing::warn!(persona = %persona.id, error = %e, "Upstream request failed");
        ApiError::BadGateway(format!("Upstream request failed: {e}"))
    })?;

    Ok(event_stream_response(deltas, state.keep_alive))
}

fn event_stream_response(deltas: CompletionStream, keep_alive: Duration) -> Response {
    let sse = Sse::new(relay_events(deltas)).keep_alive(KeepAlive::new().interval(keep_alive));
    let mut response = sse.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Maps upstream deltas to relay frames, ending with `[DONE]` or one error
/// frame.
fn relay_events(
    mut deltas: CompletionStream,
) -> impl futures::Stream<Item = Result<Event, Infallible>> + Send + 'static {
    async_stream::stream! {
        let mut delta_count = 0usize;
        while let Some(item) = deltas.next().await {
            match item {
                Ok(delta) => {
                    delta_count += 1;
                    yield Ok(Event::default().data(RelayFrame::Delta(delta).to_data()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, deltas = delta_count, "Upstream stream failed");
                    yield Ok(Event::default().data(RelayFrame::Error(e.to_string()).to_data()));
                    return;
                }
            }
        }
        tracing::debug!(deltas = delta_count, "Upstream stream completed");
        yield Ok(Event::default().data(RelayFrame::Done.to_data()));
    }
}
