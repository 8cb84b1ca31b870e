//! Composition root: builds [`AppState`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use atrium_application::AuthService;
use atrium_core::config::RootConfig;
use atrium_core::persona::PersonaRepository;
use atrium_infrastructure::{InMemoryUserRepository, StaticPersonaRepository};
use atrium_interaction::{CompletionClient, CompletionError};

use crate::app::AppState;

pub async fn bootstrap(config: &RootConfig) -> Result<AppState> {
    let personas: Arc<dyn PersonaRepository> =
        Arc::new(StaticPersonaRepository::new(config.personas.clone()));
    let persona_count = personas
        .get_all()
        .await
        .context("Failed to load personas")?
        .len();

    let users = Arc::new(InMemoryUserRepository::new());
    let auth = AuthService::from_config(users, &config.auth);
    auth.seed_users(&config.auth.seed_users)
        .await
        .context("Failed to seed user accounts")?;

    let completion = match CompletionClient::from_config(&config.upstream) {
        Ok(client) => {
            tracing::info!(model = %client.model(), "Upstream completions enabled");
            Some(Arc::new(client))
        }
        Err(CompletionError::MissingApiKey) => {
            tracing::warn!("No upstream API key configured; /api/chat will return 500");
            None
        }
        Err(e) => return Err(e).context("Failed to create completion client"),
    };

    tracing::info!(
        personas = persona_count,
        model = %config.upstream.model,
        history_limit = config.chat.history_limit,
        "Bootstrap complete"
    );

    Ok(AppState {
        personas,
        auth: Arc::new(auth),
        completion,
        history_limit: config.chat.history_limit,
        keep_alive: Duration::from_secs(config.chat.keep_alive_secs.max(1)),
    })
}
