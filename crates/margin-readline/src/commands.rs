//! Slash-command parsing for the REPL.
//!
//! Anything that does not start with `/` is a chat message for the assistant.

use margin_core::agent::AgentConfig;
use margin_core::intent::UiIntent;
use margin_core::note::NoteId;
use thiserror::Error;

/// Commands offered for completion and hints.
pub const COMMAND_NAMES: &[&str] = &[
    "/new",
    "/edit",
    "/show",
    "/delete",
    "/search",
    "/clear-search",
    "/list",
    "/config",
    "/clear-chat",
    "/logout",
    "/help",
    "/quit",
];

pub const HELP_TEXT: &str = "\
/new <title> | <content>         create a note
/edit <id> <title> | <content>   replace a note's title and content
/show <id>                       show one note in full
/delete <id>                     delete a note
/search <title> | <content>      filter notes (either side may be empty)
/clear-search, /list             show every note
/config                          show the assistant configuration
/config key=value ...            update it (endpoint, key, agent, enabled)
/clear-chat                      empty the chat history
/logout                          sign out and exit
/quit                            exit
anything else                    ask the assistant";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forwarded to the session as-is.
    Intent(UiIntent),
    ShowNote(NoteId),
    ShowConfig,
    ConfigureAgent(ConfigPatch),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Not a note id: '{0}'")]
    InvalidId(String),
    #[error("Unknown command '{0}'. Type /help for a list.")]
    Unknown(String),
    #[error("Invalid config setting '{0}'")]
    InvalidSetting(String),
}

/// Partial update of the assistant configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
    pub agent_id: Option<String>,
    pub enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn apply(self, mut config: AgentConfig) -> AgentConfig {
        if let Some(endpoint_url) = self.endpoint_url {
            config.endpoint_url = endpoint_url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(agent_id) = self.agent_id {
            config.agent_id = agent_id;
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        config
    }
}

/// Confirmation question required before sending `intent`, if any.
pub fn confirmation_prompt(intent: &UiIntent) -> Option<&'static str> {
    match intent {
        UiIntent::DeleteNote { .. } => Some("确定要删除这条笔记吗？"),
        UiIntent::ClearChatHistory => Some("确定要清空AI聊天记录吗？"),
        _ => None,
    }
}

/// Parses one trimmed, non-empty input line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    if !line.starts_with('/') {
        return Ok(Command::Intent(UiIntent::SendChatMessage {
            text: line.to_string(),
        }));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/new" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("/new <title> | <content>"));
            }
            let (title, content) = split_pair(rest);
            Command::Intent(UiIntent::CreateNote { title, content })
        }
        "/edit" => {
            let (id, body) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            if id.is_empty() {
                return Err(CommandError::Usage("/edit <id> <title> | <content>"));
            }
            let (title, content) = split_pair(body.trim());
            Command::Intent(UiIntent::UpdateNote {
                id: parse_id(id)?,
                title,
                content,
            })
        }
        "/show" => Command::ShowNote(required_id(rest, "/show <id>")?),
        "/delete" => Command::Intent(UiIntent::DeleteNote {
            id: required_id(rest, "/delete <id>")?,
        }),
        "/search" => {
            let (title, content) = split_pair(rest);
            Command::Intent(UiIntent::SearchNotes { title, content })
        }
        "/clear-search" | "/list" => Command::Intent(UiIntent::ClearSearch),
        "/config" if rest.is_empty() => Command::ShowConfig,
        "/config" => Command::ConfigureAgent(parse_config_patch(rest)?),
        "/clear-chat" => Command::Intent(UiIntent::ClearChatHistory),
        "/logout" => Command::Intent(UiIntent::Logout),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Splits `left | right`; without a separator everything is the left side.
fn split_pair(text: &str) -> (String, String) {
    match text.split_once('|') {
        Some((left, right)) => (left.trim().to_string(), right.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

fn parse_id(raw: &str) -> Result<NoteId, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidId(raw.to_string()))
}

fn required_id(raw: &str, usage: &'static str) -> Result<NoteId, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    parse_id(raw)
}

fn parse_config_patch(rest: &str) -> Result<ConfigPatch, CommandError> {
    let mut patch = ConfigPatch::default();
    for setting in rest.split_whitespace() {
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| CommandError::InvalidSetting(setting.to_string()))?;
        let value = value.to_string();
        match key {
            "endpoint" | "url" => patch.endpoint_url = Some(value),
            "key" | "api-key" => patch.api_key = Some(value),
            "agent" | "agent-id" => patch.agent_id = Some(value),
            "enabled" => {
                patch.enabled = Some(match value.as_str() {
                    "true" | "on" | "yes" => true,
                    "false" | "off" | "no" => false,
                    _ => return Err(CommandError::InvalidSetting(setting.to_string())),
                })
            }
            _ => return Err(CommandError::InvalidSetting(setting.to_string())),
        }
    }
    Ok(patch)
}
