//! Persona domain model.
//!
//! Personas are the addressable counterparts of a conversation. Each one
//! carries the characteristics used to build its system prompt.

use serde::{Deserialize, Serialize};

/// Represents the source of a persona (built-in or configured).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub enum PersonaSource {
    /// Built-in personas shipped with the relay
    System,
    /// Personas added through configuration
    #[default]
    User,
}

/// A persona representing a conversation partner with specific expertise.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Unique identifier used as the conversation key
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Role or title describing the persona's expertise
    pub role: String,
    /// Background description of the persona's capabilities
    pub background: String,
    /// Communication style characteristics
    pub communication_style: String,
    /// Source of the persona (System or User)
    #[serde(default)]
    pub source: PersonaSource,
}

impl Persona {
    /// Builds the system prompt sent ahead of the conversation history.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {name}, {role} at Atrium Consulting.\n\
             Background: {background}\n\
             Communication style: {style}\n\
             Answer visitors' questions about our services. Keep replies concise.",
            name = self.name,
            role = self.role,
            background = self.background,
            style = self.communication_style,
        )
    }
}
