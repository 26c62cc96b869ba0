use super::config::AgentConfig;
use crate::error::{MarginError, Result};
use crate::storage::{AGENT_CONFIG_KEY, Loaded, UserStore};

/// Per-user holder of the assistant configuration.
pub struct ConfigStore {
    store: UserStore,
    config: AgentConfig,
    corruption: Option<MarginError>,
}

impl ConfigStore {
    /// Loads the stored configuration merged over the defaults.
    pub fn load(store: UserStore) -> Self {
        let Loaded { value, corruption } = store.load_json_or_default::<AgentConfig>(AGENT_CONFIG_KEY);
        Self {
            store,
            config: value,
            corruption,
        }
    }

    pub fn corruption(&self) -> Option<&MarginError> {
        self.corruption.as_ref()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replaces the configuration and persists it verbatim.
    ///
    /// The in-memory value is replaced even when the write fails.
    pub fn save(&mut self, config: AgentConfig) -> Result<()> {
        self.config = config;
        let result = self.store.save_json(AGENT_CONFIG_KEY, &self.config);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "Failed to persist assistant config");
        }
        result
    }

    pub fn is_usable(&self) -> bool {
        self.config.is_usable()
    }
}
