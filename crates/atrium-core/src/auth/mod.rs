//! Authentication domain module.
//!
//! - `model`: Stored accounts and the identity exposed to clients
//! - `request`: Login/registration payloads
//! - `repository`: Repository trait for account storage

mod model;
mod repository;
mod request;

// Re-export public API
pub use model::{DEFAULT_ROLE, Identity, UserRecord};
pub use repository::UserRepository;
pub use request::{AccessToken, LoginRequest, RegisterRequest};
