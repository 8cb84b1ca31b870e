//! Relay wire frames.
//!
//! The relay's event stream carries three kinds of `data:` payloads:
//! `{"content": "..."}` deltas, `{"error": "..."}` failures and the
//! literal `[DONE]` sentinel.

use serde::{Deserialize, Serialize};

pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded relay payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    /// Incremental assistant text.
    Delta(String),
    /// Failure reported by the relay; ends the stream.
    Error(String),
    /// Normal end of the response.
    Done,
}

#[derive(Serialize, Deserialize)]
struct DeltaBody {
    content: String,
}

#[derive(Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

impl RelayFrame {
    /// Decodes a payload. Returns `None` for anything that is not one of the
    /// three frame kinds.
    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();
        if data == DONE_SENTINEL {
            return Some(Self::Done);
        }

        let value: serde_json::Value = serde_json::from_str(data).ok()?;
        if let Some(error) = value.get("error") {
            let message = match error {
                serde_json::Value::String(s) => s.clone(),
                other => other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            };
            return Some(Self::Error(message));
        }

        serde_json::from_value::<DeltaBody>(value)
            .ok()
            .map(|body| Self::Delta(body.content))
    }

    /// Encodes the frame as an event `data` payload.
    pub fn to_data(&self) -> String {
        let encoded = match self {
            Self::Delta(content) => serde_json::to_string(&DeltaBody {
                content: content.clone(),
            }),
            Self::Error(error) => serde_json::to_string(&ErrorBody {
                error: error.clone(),
            }),
            Self::Done => return DONE_SENTINEL.to_string(),
        };
        // A single string field always serializes
        encoded.unwrap_or_default()
    }
}
