//! Guest identifier.
//!
//! Anonymous visitors are correlated across chat turns by an opaque id that
//! is generated once and persisted in the key-value store.

use crate::error::Result;
use crate::storage::{GUEST_ID_KEY, KeyValueStore};
use std::sync::Arc;
use uuid::Uuid;

/// Obtains or creates the visitor's guest identifier.
#[derive(Clone)]
pub struct GuestIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl GuestIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the stored guest id, generating and persisting one if absent.
    pub async fn get_or_create(&self) -> Result<String> {
        if let Some(existing) = self.store.get(GUEST_ID_KEY).await? {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let guest_id = Uuid::new_v4().to_string();
        self.store.set(GUEST_ID_KEY, &guest_id).await?;
        tracing::info!(guest_id = %guest_id, "Created guest identifier");
        Ok(guest_id)
    }

    /// Drops the stored guest id; the next call creates a fresh one.
    pub async fn forget(&self) -> Result<()> {
        self.store.remove(GUEST_ID_KEY).await
    }
}
