//! Wiring for the terminal client.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atrium_application::ChatUseCase;
use atrium_core::chat::ChatSession;
use atrium_core::config::RootConfig;
use atrium_core::events::EventBus;
use atrium_core::guest::GuestIdentity;
use atrium_core::storage::KeyValueStore;
use atrium_infrastructure::{AtriumPaths, ConfigService, FileKeyValueStore};
use atrium_interaction::{AuthClient, HttpChatTransport, PersonaClient};
use tokio::sync::Mutex;

/// Configuration and local state shared by every subcommand.
pub struct ClientContext {
    pub config: RootConfig,
    pub store: Arc<dyn KeyValueStore>,
}

impl ClientContext {
    pub fn load(
        config_path: Option<PathBuf>,
        server_url: Option<String>,
        state_file: Option<PathBuf>,
    ) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::new(path),
            None => ConfigService::from_default_location()?,
        };
        let mut config = config_service
            .load()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        if let Some(url) = server_url {
            config.client.server_url = url;
        }

        let state_file = match state_file {
            Some(path) => path,
            None => AtriumPaths::default().client_state_file()?,
        };
        tracing::debug!(state_file = %state_file.display(), server = %config.client.server_url, "Client context ready");

        Ok(Self {
            config,
            store: Arc::new(FileKeyValueStore::new(state_file)),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.config.client.server_url
    }

    pub async fn chat_usecase(&self) -> Result<ChatUseCase> {
        let session = ChatSession::load(self.store.clone(), EventBus::new()).await?;
        Ok(ChatUseCase::new(
            Arc::new(Mutex::new(session)),
            Arc::new(HttpChatTransport::new(self.server_url())),
            GuestIdentity::new(self.store.clone()),
            self.config.client.history_limit,
        ))
    }

    pub fn auth_client(&self) -> AuthClient {
        AuthClient::new(self.server_url())
    }

    pub fn persona_client(&self) -> PersonaClient {
        PersonaClient::new(self.server_url())
    }
}
