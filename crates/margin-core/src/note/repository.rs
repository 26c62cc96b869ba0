//! Per-user note collection.
//!
//! Notes are kept most-recent-first. Every mutation is applied in memory and
//! then flushed through the [`UserStore`]; a failed flush never rolls the
//! in-memory change back.

use std::sync::Arc;

use super::model::{Note, NoteId};
use crate::clock::Clock;
use crate::error::{MarginError, Result};
use crate::storage::{Flushed, Loaded, NEXT_ID_KEY, NOTES_KEY, UserStore};

/// The ordered note collection of one user.
pub struct NoteRepository {
    store: UserStore,
    clock: Arc<dyn Clock>,
    notes: Vec<Note>,
    next_id: NoteId,
    corruption: Option<MarginError>,
}

impl NoteRepository {
    /// Loads the user's notes and id counter.
    ///
    /// Absent data yields an empty collection starting at id 1. Corrupt data
    /// is discarded and remembered in [`NoteRepository::corruption`].
    ///
    /// The counter is never allowed below `max(id) + 1`, so an inconsistent or
    /// lost counter cannot cause an id to be handed out twice. A note whose id
    /// leaves no room for a successor makes the whole payload corrupt.
    pub fn load(store: UserStore, clock: Arc<dyn Clock>) -> Self {
        let Loaded {
            value: mut notes,
            mut corruption,
        } = store.load_json_or_default::<Vec<Note>>(NOTES_KEY);

        let floor = notes
            .iter()
            .try_fold(1, |floor: NoteId, note| note.id.checked_add(1).map(|next| floor.max(next)));
        let floor = match floor {
            Some(floor) => floor,
            None => {
                let err = MarginError::corrupt_data(store.scoped_key(NOTES_KEY), "note id out of range");
                tracing::warn!(error = %err, "Discarding notes with unusable ids");
                corruption.get_or_insert(err);
                notes.clear();
                1
            }
        };

        let stored_next = store.get(NEXT_ID_KEY).and_then(|raw| {
            raw.map(|raw| {
                raw.trim().parse::<NoteId>().map_err(|err| {
                    MarginError::corrupt_data(store.scoped_key(NEXT_ID_KEY), err.to_string())
                })
            })
            .transpose()
        });
        let stored_next = match stored_next {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring corrupt note id counter");
                corruption.get_or_insert(err);
                None
            }
        };

        let next_id = stored_next.unwrap_or(1).max(floor);

        tracing::info!(
            user = %store.user(),
            notes = notes.len(),
            next_id,
            "Loaded notes"
        );

        Self {
            store,
            clock,
            notes,
            next_id,
            corruption,
        }
    }

    /// Corrupt payload that was discarded during load, if any.
    pub fn corruption(&self) -> Option<&MarginError> {
        self.corruption.as_ref()
    }

    /// The id the next created note will receive.
    pub fn next_id(&self) -> NoteId {
        self.next_id
    }

    /// All notes, most recent first.
    pub fn list(&self) -> Vec<Note> {
        self.notes.clone()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Looks up a single note.
    pub fn get(&self, id: NoteId) -> Option<Note> {
        self.notes.iter().find(|note| note.id == id).cloned()
    }

    /// Creates a note at the front of the collection.
    ///
    /// # Returns
    ///
    /// - `Ok(Flushed<Note>)`: the new note
    /// - `Err(MarginError::Internal)`: the id counter is exhausted; nothing changed
    pub fn create(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Flushed<Note>> {
        let following = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| MarginError::internal("note id counter exhausted"))?;
        let now = self.clock.note_timestamp();
        let note = Note {
            id: self.next_id,
            title: title.into(),
            content: content.into(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.next_id = following;
        self.notes.insert(0, note.clone());

        tracing::debug!(id = note.id, "Created note");
        Ok(Flushed::new(note, self.flush()))
    }

    /// Replaces the title and content of an existing note.
    ///
    /// # Returns
    ///
    /// - `Ok(Flushed<Note>)`: the updated note
    /// - `Err(MarginError::NotFound)`: no note with `id`; nothing was written
    pub fn update(
        &mut self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Flushed<Note>> {
        let now = self.clock.note_timestamp();
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| MarginError::not_found("note", id.to_string()))?;

        note.title = title.into();
        note.content = content.into();
        note.updated_at = now;
        let updated = note.clone();

        tracing::debug!(id, "Updated note");
        Ok(Flushed::new(updated, self.flush()))
    }

    /// Removes a note. Deleting an unknown id is a successful no-op.
    ///
    /// The value is `true` when a note was actually removed. The collection is
    /// flushed either way.
    pub fn delete(&mut self, id: NoteId) -> Flushed<bool> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        let removed = self.notes.len() != before;

        tracing::debug!(id, removed, "Deleted note");
        Flushed::new(removed, self.flush())
    }

    /// Case-insensitive substring search; both predicates must match.
    pub fn search(&self, title: &str, content: &str) -> Vec<Note> {
        let title = title.to_lowercase();
        let content = content.to_lowercase();
        self.notes
            .iter()
            .filter(|note| note.matches(&title, &content))
            .cloned()
            .collect()
    }

    fn flush(&self) -> Result<()> {
        let result = self
            .store
            .save_json(NOTES_KEY, &self.notes)
            .and_then(|()| self.store.set(NEXT_ID_KEY, &self.next_id.to_string()));
        if let Err(err) = &result {
            tracing::warn!(error = %err, "Failed to persist notes");
        }
        result
    }
}
