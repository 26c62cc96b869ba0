//! RemoteAgent - HTTP client for the hosted conversational agent.
//!
//! One POST per user message, no streaming, no retry. The reply is read from
//! `output.text`, falling back to `output.choices[0].message.content`.

use async_trait::async_trait;
use margin_core::agent::AgentConfig;
use margin_core::session::UserId;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RemoteCallError;

/// Reply used when a successful response carries no usable text.
pub const UNRECOGNIZED_REPLY: &str = "抱歉，我没有理解您的问题。";

/// Header telling the agent platform not to stream the answer.
pub const STREAMING_HEADER: &str = "X-DashScope-SSE";

/// Request body sent to the agent endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub session_id: String,
    pub messages: Vec<AgentMessage>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentMessage {
    pub role: String,
    pub content: String,
}

impl AgentRequest {
    /// Builds a non-streaming request carrying one user message.
    ///
    /// The session id is `session_<user>_<epoch-ms>`.
    pub fn new(config: &AgentConfig, user: &UserId, epoch_millis: i64, content: String) -> Self {
        Self {
            agent_id: config.agent_id().map(str::to_string),
            session_id: format!("session_{}_{}", user, epoch_millis),
            messages: vec![AgentMessage {
                role: "user".to_string(),
                content,
            }],
            stream: false,
        }
    }
}

/// Transport to a remote conversational agent.
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    /// Sends one request and returns the reply text.
    async fn send(
        &self,
        config: &AgentConfig,
        request: &AgentRequest,
    ) -> Result<String, RemoteCallError>;
}

/// Agent implementation that talks to the endpoint over HTTP.
#[derive(Clone, Default)]
pub struct HttpRemoteAgent {
    client: Client,
}

impl HttpRemoteAgent {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl RemoteAgent for HttpRemoteAgent {
    async fn send(
        &self,
        config: &AgentConfig,
        request: &AgentRequest,
    ) -> Result<String, RemoteCallError> {
        if config.endpoint_url.is_empty() {
            return Err(RemoteCallError::MissingConfiguration("endpoint URL"));
        }
        if config.api_key.is_empty() {
            return Err(RemoteCallError::MissingConfiguration("API key"));
        }

        tracing::debug!(
            url = %config.endpoint_url,
            session_id = %request.session_id,
            agent_id = ?request.agent_id,
            "Sending agent request"
        );

        let response = self
            .client
            .post(&config.endpoint_url)
            .header("content-type", "application/json")
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header(STREAMING_HEADER, "disable")
            .json(request)
            .send()
            .await
            .map_err(|err| RemoteCallError::Network(err.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Received agent response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteCallError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let parsed: AgentResponse = response
            .json()
            .await
            .map_err(|err| RemoteCallError::InvalidBody(err.to_string()))?;

        Ok(extract_reply(parsed))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AgentResponse {
    #[serde(default)]
    output: Option<AgentOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentOutput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// First non-empty of `output.text` and `output.choices[0].message.content`.
pub(crate) fn extract_reply(response: AgentResponse) -> String {
    let Some(output) = response.output else {
        return UNRECOGNIZED_REPLY.to_string();
    };

    output
        .text
        .filter(|text| !text.is_empty())
        .or_else(|| {
            output
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content)
                .filter(|content| !content.is_empty())
        })
        .unwrap_or_else(|| UNRECOGNIZED_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> String {
        extract_reply(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_direct_text_wins() {
        assert_eq!(
            parse(r#"{"output":{"text":"hi","choices":[{"message":{"content":"other"}}]}}"#),
            "hi"
        );
    }

    #[test]
    fn test_empty_text_falls_back_to_choices() {
        assert_eq!(
            parse(r#"{"output":{"text":"","choices":[{"message":{"content":"from choices"}}]}}"#),
            "from choices"
        );
    }

    #[test]
    fn test_missing_everything_uses_notice() {
        assert_eq!(parse(r#"{}"#), UNRECOGNIZED_REPLY);
        assert_eq!(parse(r#"{"output":{}}"#), UNRECOGNIZED_REPLY);
        assert_eq!(parse(r#"{"output":{"choices":[]}}"#), UNRECOGNIZED_REPLY);
    }

    #[test]
    fn test_request_shape() {
        let config = AgentConfig {
            endpoint_url: "http://agent".into(),
            api_key: "k".into(),
            agent_id: String::new(),
            enabled: true,
        };
        let request = AgentRequest::new(&config, &UserId::new("alice"), 1700000000000, "q".into());
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("agentId").is_none());
        assert_eq!(json["sessionId"], "session_alice_1700000000000");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "q");

        let with_agent = AgentConfig {
            agent_id: "agent-7".into(),
            ..config
        };
        let request = AgentRequest::new(&with_agent, &UserId::new("alice"), 1, "q".into());
        assert_eq!(request.agent_id.as_deref(), Some("agent-7"));
    }

    #[tokio::test]
    async fn test_missing_configuration_never_sends() {
        let agent = HttpRemoteAgent::new();
        let config = AgentConfig {
            enabled: true,
            ..AgentConfig::default()
        };
        let request = AgentRequest::new(&config, &UserId::new("alice"), 0, "q".into());

        let err = agent.send(&config, &request).await.unwrap_err();
        assert_eq!(err, RemoteCallError::MissingConfiguration("endpoint URL"));
    }
}
