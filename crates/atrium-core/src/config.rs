//! Configuration model.
//!
//! Mirrors `config.toml`. Every section has defaults so a missing file or a
//! partial file still yields a usable configuration.

use crate::error::{AtriumError, Result};
use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_UPSTREAM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RootConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub chat: ChatConfig,
    pub auth: AuthConfig,
    pub client: ClientConfig,
    /// Extra personas in addition to the built-in presets
    #[serde(rename = "persona")]
    pub personas: Vec<Persona>,
}

impl RootConfig {
    /// Rejects configurations the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AtriumError::config("auth.jwt_secret must not be empty"));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(AtriumError::config("auth.token_ttl_minutes must be positive"));
        }
        if self.chat.history_limit == 0 {
            return Err(AtriumError::config("chat.history_limit must be at least 1"));
        }
        if self.upstream.base_url.trim().is_empty() {
            return Err(AtriumError::config("upstream.base_url must not be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the relay listens on
    pub bind: String,
    /// Directory for rolling log files; defaults to the data directory
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            log_dir: None,
        }
    }
}

/// Third-party completion API settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    /// Usually supplied through the environment instead of the file
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            model: DEFAULT_UPSTREAM_MODEL.to_string(),
            api_key: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum number of history messages forwarded upstream
    pub history_limit: usize,
    /// Interval between event-stream keep-alive comments
    pub keep_alive_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            keep_alive_secs: 15,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for issued tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// Accounts created at startup
    pub seed_users: Vec<SeedUser>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "atrium-development-secret".to_string(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            seed_users: vec![
                SeedUser {
                    email: "admin@atrium.example".to_string(),
                    password: "admin123".to_string(),
                    role: "admin".to_string(),
                    first_name: "Ada".to_string(),
                    last_name: "Admin".to_string(),
                },
                SeedUser {
                    email: "client@atrium.example".to_string(),
                    password: "client123".to_string(),
                    role: "user".to_string(),
                    first_name: "Cal".to_string(),
                    last_name: "Client".to_string(),
                },
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

fn default_role() -> String {
    crate::auth::DEFAULT_ROLE.to_string()
}

/// Settings for the terminal client.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the relay server
    pub server_url: String,
    pub history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://{}", DEFAULT_BIND),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
