use serde::{Deserialize, Serialize};

/// Connection settings for the remote assistant.
///
/// Fields missing from the persisted payload keep their defaults, so an
/// older or partial payload still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    /// Remote agent endpoint; empty when unset.
    #[serde(rename = "endpoint")]
    pub endpoint_url: String,
    /// Bearer credential; empty when unset.
    pub api_key: String,
    /// Optional agent identifier forwarded with each request.
    pub agent_id: String,
    /// Whether the assistant accepts messages at all.
    pub enabled: bool,
}

impl AgentConfig {
    /// Whether the remote endpoint can be called: enabled, with endpoint and key.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.has_remote_endpoint()
    }

    /// Whether both the endpoint and the credential are filled in.
    pub fn has_remote_endpoint(&self) -> bool {
        !self.endpoint_url.is_empty() && !self.api_key.is_empty()
    }

    /// Copy with surrounding whitespace removed from the text fields.
    pub fn normalized(&self) -> Self {
        Self {
            endpoint_url: self.endpoint_url.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            agent_id: self.agent_id.trim().to_string(),
            enabled: self.enabled,
        }
    }

    /// The agent id, or `None` when blank.
    pub fn agent_id(&self) -> Option<&str> {
        Some(self.agent_id.as_str()).filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_alone_is_not_usable() {
        let config = AgentConfig {
            enabled: true,
            ..AgentConfig::default()
        };
        assert!(!config.is_usable());

        let config = AgentConfig {
            endpoint_url: "https://agent.example/api".into(),
            api_key: "sk-1".into(),
            enabled: true,
            ..AgentConfig::default()
        };
        assert!(config.is_usable());
        assert!(!AgentConfig { enabled: false, ..config }.is_usable());
    }

    #[test]
    fn test_partial_payload_merges_over_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(config.enabled);
        assert!(config.endpoint_url.is_empty());
        assert_eq!(config.agent_id(), None);
    }

    #[test]
    fn test_persisted_field_names() {
        let config = AgentConfig {
            endpoint_url: "u".into(),
            api_key: "k".into(),
            agent_id: "a".into(),
            enabled: true,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["endpoint"], "u");
        assert_eq!(json["apiKey"], "k");
        assert_eq!(json["agentId"], "a");
        assert_eq!(json["enabled"], true);
    }
}
