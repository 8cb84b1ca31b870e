//! Unified path management for Atrium files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/atrium/            # Config directory
//! ├── config.toml              # Server and client configuration
//! └── client-state.json        # Terminal client key-value store
//!
//! ~/.local/share/atrium/       # Data directory
//! └── logs/                    # Rolling server logs
//!     └── atrium-server.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "atrium";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for atrium_core::AtriumError {
    fn from(e: PathError) -> Self {
        atrium_core::AtriumError::config(e.to_string())
    }
}

/// Resolves Atrium's config and data locations.
///
/// With a base directory every path is placed under it, which keeps tests
/// off the real home directory.
#[derive(Debug, Clone, Default)]
pub struct AtriumPaths {
    base_dir: Option<PathBuf>,
}

impl AtriumPaths {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Returns the Atrium configuration directory (e.g. `~/.config/atrium/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the Atrium data directory (e.g. `~/.local/share/atrium/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Key-value file used by the terminal client.
    pub fn client_state_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("client-state.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("logs"))
    }
}
