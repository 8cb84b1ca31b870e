//! Configuration service implementation.
//!
//! Loads `RootConfig` from `config.toml` and applies environment overrides.
//! Secrets (API key, token secret) are expected to come from the environment.

use crate::paths::AtriumPaths;
use atrium_core::config::RootConfig;
use atrium_core::error::{AtriumError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables consulted after the file is read.
pub const ENV_UPSTREAM_API_KEY: &str = "ATRIUM_UPSTREAM_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_UPSTREAM_BASE_URL: &str = "ATRIUM_UPSTREAM_BASE_URL";
pub const ENV_UPSTREAM_MODEL: &str = "ATRIUM_UPSTREAM_MODEL";
pub const ENV_JWT_SECRET: &str = "ATRIUM_JWT_SECRET";
pub const ENV_BIND: &str = "ATRIUM_BIND";
pub const ENV_SERVER_URL: &str = "ATRIUM_SERVER_URL";

/// Loads the root configuration from a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses `~/.config/atrium/config.toml`.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(AtriumPaths::default().config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file (defaults if missing), applies process environment
    /// overrides and validates the result.
    pub fn load(&self) -> Result<RootConfig> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as [`ConfigService::load`] with an explicit environment lookup.
    pub fn load_with_env<F>(&self, env: F) -> Result<RootConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.read_file()?;
        apply_env_overrides(&mut config, env);
        config.validate()?;
        Ok(config)
    }

    /// Writes a default config file if none exists. Returns `true` if a file
    /// was created.
    pub fn ensure_config_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&RootConfig::default())?;
        fs::write(&self.path, rendered)?;
        tracing::info!(path = %self.path.display(), "Wrote default configuration");
        Ok(true)
    }

    fn read_file(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(RootConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            AtriumError::config(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn apply_env_overrides<F>(config: &mut RootConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(key) = non_empty(ENV_UPSTREAM_API_KEY).or_else(|| non_empty(ENV_OPENAI_API_KEY)) {
        config.upstream.api_key = Some(key);
    }
    if let Some(url) = non_empty(ENV_UPSTREAM_BASE_URL) {
        config.upstream.base_url = url;
    }
    if let Some(model) = non_empty(ENV_UPSTREAM_MODEL) {
        config.upstream.model = model;
    }
    if let Some(secret) = non_empty(ENV_JWT_SECRET) {
        config.auth.jwt_secret = secret;
    }
    if let Some(bind) = non_empty(ENV_BIND) {
        config.server.bind = bind;
    }
    if let Some(url) = non_empty(ENV_SERVER_URL) {
        config.client.server_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        let config = service.load_with_env(env_of(&[])).unwrap();
        assert_eq!(config.chat.history_limit, 10);
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[upstream]
model = "from-file"
api_key = "file-key"
"#,
        )
        .unwrap();

        let config = ConfigService::new(path)
            .load_with_env(env_of(&[
                (ENV_UPSTREAM_MODEL, "from-env"),
                (ENV_JWT_SECRET, "env-secret"),
            ]))
            .unwrap();

        assert_eq!(config.upstream.model, "from-env");
        assert_eq!(config.upstream.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.auth.jwt_secret, "env-secret");
    }

    #[test]
    fn test_openai_key_is_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        let config = service
            .load_with_env(env_of(&[(ENV_OPENAI_API_KEY, "sk-openai")]))
            .unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-openai"));

        let config = service
            .load_with_env(env_of(&[
                (ENV_OPENAI_API_KEY, "sk-openai"),
                (ENV_UPSTREAM_API_KEY, "sk-atrium"),
            ]))
            .unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-atrium"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[chat\nhistory_limit = ").unwrap();

        let err = ConfigService::new(path).load_with_env(env_of(&[])).unwrap_err();
        assert!(matches!(err, AtriumError::Config(_)));
    }

    #[test]
    fn test_ensure_config_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("nested").join("config.toml"));

        assert!(service.ensure_config_file().unwrap());
        assert!(!service.ensure_config_file().unwrap());

        // Secrets are not written, so the token secret falls back to its default
        let config = service.load_with_env(env_of(&[])).unwrap();
        assert_eq!(config.auth.seed_users.len(), 2);
        assert!(!config.auth.jwt_secret.is_empty());
    }
}
