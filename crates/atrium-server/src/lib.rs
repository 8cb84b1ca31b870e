//! Atrium relay server.
//!
//! Exposes `/api/chat` (streaming relay to an OpenAI-compatible upstream),
//! `/api/personas`, the mock `/auth/*` endpoints and `/health`.

pub mod app;
pub mod error;
pub mod logging;
pub mod routes;

pub use app::{AppState, bootstrap, router};
pub use error::ApiError;
