//! Infrastructure adapters for Atrium: file and in-memory key-value stores,
//! in-memory repositories, path resolution and configuration loading.

pub mod config_service;
pub mod in_memory_user_repository;
pub mod paths;
pub mod static_persona_repository;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::in_memory_user_repository::InMemoryUserRepository;
pub use crate::paths::AtriumPaths;
pub use crate::static_persona_repository::StaticPersonaRepository;
pub use crate::storage::{FileKeyValueStore, InMemoryKeyValueStore};
