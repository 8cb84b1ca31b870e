//! Persona domain module.
//!
//! - `model`: Core persona domain model (`Persona`, `PersonaSource`)
//! - `repository`: Repository trait for persona lookup
//! - `preset`: Built-in personas

mod model;
mod preset;
mod repository;

// Re-export public API
pub use model::{Persona, PersonaSource};
pub use preset::{DESIGNER_ID, ENGINEER_ID, STRATEGIST_ID, get_default_presets};
pub use repository::PersonaRepository;
