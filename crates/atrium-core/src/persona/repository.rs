//! Persona repository trait.
//!
//! Defines the interface for looking up conversation partners.

use super::model::Persona;
use crate::error::Result;

/// An abstract source of personas.
///
/// Decouples the relay from where personas are defined (built-in presets,
/// configuration file, remote catalog).
#[async_trait::async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Retrieves all personas.
    async fn get_all(&self) -> Result<Vec<Persona>>;

    /// Finds a persona by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Persona))`: Persona found
    /// - `Ok(None)`: No persona with that id
    async fn find_by_id(&self, id: &str) -> Result<Option<Persona>> {
        Ok(self.get_all().await?.into_iter().find(|p| p.id == id))
    }
}
