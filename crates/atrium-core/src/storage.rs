//! Key-value persistence port.
//!
//! Client-side state (conversation history, guest identity) is kept behind
//! this trait so any backend can be substituted: a JSON file on disk, an
//! in-memory map for tests, or a remote store.

use crate::error::Result;
use async_trait::async_trait;

/// Storage key holding the serialized partner -> messages map.
pub const CONVERSATIONS_KEY: &str = "atrium.conversations";

/// Storage key holding the guest identifier.
pub const GUEST_ID_KEY: &str = "atrium.guest_id";

/// Storage key holding the last issued access token.
pub const ACCESS_TOKEN_KEY: &str = "atrium.access_token";

/// An abstract string key-value store.
///
/// Values are opaque strings; callers own their encoding. Writes replace the
/// whole value for a key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key.
    async fn clear(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// HashMap-backed store for unit tests in this crate.
    #[derive(Default)]
    pub struct MapStore {
        pub entries: Mutex<HashMap<String, String>>,
        pub writes: Mutex<usize>,
    }

    impl MapStore {
        pub fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            *self.writes.lock().unwrap() += 1;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }
}
