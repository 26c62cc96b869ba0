//! Application settings (`~/.config/margin/config.toml`).
//!
//! These are machine-level settings for the binary. The per-user assistant
//! configuration lives in the key/value store instead.

use std::path::PathBuf;
use std::time::Duration;

use margin_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::paths::MarginPaths;
use crate::storage::AtomicTomlFile;

/// Overrides `storage_dir`.
pub const STORAGE_DIR_ENV: &str = "MARGIN_STORAGE_DIR";
/// Overrides `log_level`.
pub const LOG_LEVEL_ENV: &str = "MARGIN_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory of the file-backed store. Defaults to `<data_dir>/storage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// "Thinking" delay of the simulated assistant.
    pub simulated_reply_delay_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_dir: None,
            log_level: "info".to_string(),
            simulated_reply_delay_ms: 1000,
        }
    }
}

impl AppSettings {
    /// Applies environment overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(dir) = non_blank(STORAGE_DIR_ENV) {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = non_blank(LOG_LEVEL_ENV) {
            self.log_level = level.trim().to_string();
        }
    }

    /// The configured storage directory, or the platform default.
    pub fn resolved_storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(MarginPaths::storage_dir()?),
        }
    }

    pub fn simulated_reply_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_reply_delay_ms)
    }
}

/// Loads and saves [`AppSettings`].
pub struct SettingsService {
    file: AtomicTomlFile<AppSettings>,
}

impl SettingsService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Service for `~/.config/margin/config.toml`.
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(MarginPaths::config_file()?))
    }

    /// Settings from the file; defaults when it is missing or empty.
    ///
    /// A malformed file is an error rather than silently ignored.
    pub fn load(&self) -> Result<AppSettings> {
        let settings = self.file.load()?.unwrap_or_default();
        tracing::debug!(path = %self.file.path().display(), ?settings, "Loaded settings");
        Ok(settings)
    }

    /// [`SettingsService::load`] with process environment overrides applied.
    pub fn load_effective(&self) -> Result<AppSettings> {
        let mut settings = self.load()?;
        settings.apply_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        self.file.save(settings)
    }

    /// Locked read-modify-write of the settings file.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppSettings),
    {
        self.file.update(AppSettings::default(), |settings| {
            f(settings);
            Ok(())
        })
    }
}
