//! PersonaRepository backed by the built-in presets plus configured personas.

use atrium_core::error::Result;
use atrium_core::persona::{Persona, PersonaRepository, get_default_presets};

/// Immutable persona catalog assembled at startup.
///
/// Configured personas override presets with the same id.
pub struct StaticPersonaRepository {
    personas: Vec<Persona>,
}

impl StaticPersonaRepository {
    /// Creates a catalog of the presets followed by `configured`.
    pub fn new(configured: Vec<Persona>) -> Self {
        let mut personas = get_default_presets();
        for persona in configured {
            match personas.iter_mut().find(|p| p.id == persona.id) {
                Some(existing) => *existing = persona,
                None => personas.push(persona),
            }
        }
        Self { personas }
    }
}

impl Default for StaticPersonaRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait::async_trait]
impl PersonaRepository for StaticPersonaRepository {
    async fn get_all(&self) -> Result<Vec<Persona>> {
        Ok(self.personas.clone())
    }
}
