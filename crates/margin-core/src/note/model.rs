//! Note domain model.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a note. Never reused for a given user.
pub type NoteId = u64;

/// A single reading note.
///
/// Serialized with camelCase field names; that is the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Note {
    /// Case-insensitive AND match on title and content.
    ///
    /// Both needles are expected in lowercase already; an empty needle matches.
    pub(crate) fn matches(&self, title_needle: &str, content_needle: &str) -> bool {
        self.title.to_lowercase().contains(title_needle)
            && self.content.to_lowercase().contains(content_needle)
    }
}
