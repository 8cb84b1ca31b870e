//! User repository trait.

use super::model::UserRecord;
use crate::error::Result;

/// An abstract store of user accounts.
///
/// Call sites depend on this trait only, so the in-memory implementation can
/// be swapped for a database without touching them.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// Appends a new user.
    ///
    /// Fails with a validation error if the email is already taken.
    async fn insert(&self, user: UserRecord) -> Result<()>;

    /// Number of stored users.
    async fn count(&self) -> Result<usize>;
}
