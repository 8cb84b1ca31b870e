//! In-memory UserRepository implementation.

use atrium_core::auth::{UserRecord, UserRepository};
use atrium_core::error::{AtriumError, Result};
use tokio::sync::RwLock;

/// Account list held in process memory.
///
/// Accounts are lost on restart; the server re-seeds them from configuration
/// at startup.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = email.trim();
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: UserRecord) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AtriumError::validation(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        users.push(user);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.users.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
            role: "user".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            nickname: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryUserRepository::new();
        repo.insert(user("1", "a@example.com")).await.unwrap();

        let found = repo.find_by_email("A@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, "1");
        assert!(repo.find_by_id("1").await.unwrap().is_some());
        assert!(repo.find_by_id("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(user("1", "a@example.com")).await.unwrap();

        let err = repo.insert(user("2", "a@example.com")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
