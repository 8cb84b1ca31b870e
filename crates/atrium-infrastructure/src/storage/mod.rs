//! Storage layer for atomic file operations and key-value stores.

mod atomic_json;
mod file_kv_store;
mod memory_kv_store;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use file_kv_store::FileKeyValueStore;
pub use memory_kv_store::InMemoryKeyValueStore;
