use atrium_application::AuthService;
use atrium_core::persona::PersonaRepository;
use atrium_interaction::CompletionClient;
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub personas: Arc<dyn PersonaRepository>,
    pub auth: Arc<AuthService>,
    /// `None` when no upstream API key is configured; chat requests then
    /// fail with 500 while the rest of the API keeps working
    pub completion: Option<Arc<CompletionClient>>,
    pub history_limit: usize,
    pub keep_alive: Duration,
}
