//! User account domain model.

use serde::{Deserialize, Serialize};

/// Role assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = "user";

/// A stored user account.
///
/// Passwords are never kept in clear text; `password_hash` is a digest of the
/// password combined with `salt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user identifier (UUID format)
    pub id: String,
    /// Login name; unique across the repository
    pub email: String,
    /// Hex-encoded password digest
    pub password_hash: String,
    /// Per-user salt mixed into the digest
    pub salt: String,
    /// Authorization role carried in issued tokens
    pub role: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub nickname: String,
}

/// The identity fields exposed to clients after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserRecord> for Identity {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}
