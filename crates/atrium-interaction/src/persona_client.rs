//! Client for the relay's persona catalog.

use crate::error::TransportError;
use atrium_core::persona::Persona;
use reqwest::Client;

#[derive(Clone)]
pub struct PersonaClient {
    client: Client,
    server_url: String,
}

impl PersonaClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET /api/personas`
    pub async fn list(&self) -> Result<Vec<Persona>, TransportError> {
        let response = self
            .client
            .get(format!("{}/api/personas", self.server_url))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::from_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Looks up one persona; `Ok(None)` if the catalog has no such id.
    pub async fn find(&self, persona_id: &str) -> Result<Option<Persona>, TransportError> {
        Ok(self.list().await?.into_iter().find(|p| p.id == persona_id))
    }
}
