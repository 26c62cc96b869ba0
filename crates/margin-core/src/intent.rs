//! The closed set of user intents a front end can dispatch to a session.

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::note::NoteId;

/// User actions, as produced by forms, buttons and the chat input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiIntent {
    /// Save the note form without an id.
    CreateNote { title: String, content: String },
    /// Save the note form (or inline edit) for an existing note.
    UpdateNote {
        id: NoteId,
        title: String,
        content: String,
    },
    /// Delete a note. Confirmation happens before the intent is sent.
    DeleteNote { id: NoteId },
    /// Filter the rendered list; the stored collection is untouched.
    SearchNotes { title: String, content: String },
    /// Drop the filter and render every note again.
    ClearSearch,
    /// Send a message from the assistant input.
    SendChatMessage { text: String },
    /// Empty the chat history. Confirmation happens before the intent is sent.
    ClearChatHistory,
    /// Submit the assistant configuration form.
    SaveAgentConfig { config: AgentConfig },
    /// Sign out and end the session.
    Logout,
}
