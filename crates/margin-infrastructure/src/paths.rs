//! Path management for margin's settings, stored data and logs.
//!
//! ```text
//! ~/.config/margin/            # Config directory
//! └── config.toml              # Application settings
//!
//! ~/.local/share/margin/       # Data directory
//! ├── storage/                 # One file per key/value entry
//! └── logs/                    # Daily rolling log files
//!     └── margin.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "margin";

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

impl From<PathError> for margin_core::MarginError {
    fn from(err: PathError) -> Self {
        margin_core::MarginError::config(err.to_string())
    }
}

pub struct MarginPaths;

impl MarginPaths {
    /// Returns the margin configuration directory (e.g. `~/.config/margin/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the margin data directory (e.g. `~/.local/share/margin/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the settings file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default directory of the file-backed key/value store.
    pub fn storage_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("storage"))
    }

    /// Directory for daily rolling log files.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
