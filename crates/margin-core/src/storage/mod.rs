//! Durable key/value storage and the per-user adapter on top of it.
//!
//! # Module Structure
//!
//! - `KeyValueStore`: raw string-keyed medium (file directory, memory, ...)
//! - `UserStore`: namespaces logical keys by user and handles JSON payloads
//! - `memory`: in-process implementation with an optional byte quota

mod memory;

pub use memory::MemoryKeyValueStore;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{MarginError, Result};
use crate::session::UserId;

/// Logical key for the note collection.
pub const NOTES_KEY: &str = "notes";
/// Logical key for the note id counter.
pub const NEXT_ID_KEY: &str = "nextId";
/// Logical key for the assistant chat history.
pub const CHAT_HISTORY_KEY: &str = "aiChatHistory";
/// Logical key for the assistant configuration.
pub const AGENT_CONFIG_KEY: &str = "aiConfig";

/// A durable string-keyed storage medium.
///
/// Implementations must report write failures through `Err` and never panic;
/// the callers decide how to degrade.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}

/// A value loaded from storage, plus the corruption that was recovered from (if any).
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub corruption: Option<MarginError>,
}

/// Result of a mutation that always completes in memory.
///
/// `flush` reports whether the new state also reached durable storage.
#[must_use]
#[derive(Debug, Clone)]
pub struct Flushed<T> {
    pub value: T,
    pub flush: Result<()>,
}

impl<T> Flushed<T> {
    pub fn new(value: T, flush: Result<()>) -> Self {
        Self { value, flush }
    }

    pub fn is_persisted(&self) -> bool {
        self.flush.is_ok()
    }

    pub fn into_parts(self) -> (T, Result<()>) {
        (self.value, self.flush)
    }
}

/// Per-user view of a [`KeyValueStore`].
///
/// Keys are built as `"<logicalKey>_<userId>"`, so two users sharing one
/// medium never see each other's data.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn KeyValueStore>,
    user: UserId,
}

impl UserStore {
    pub fn new(store: Arc<dyn KeyValueStore>, user: UserId) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Builds the physical key for a logical key.
    pub fn scoped_key(&self, logical_key: &str) -> String {
        format!("{}_{}", logical_key, self.user)
    }

    /// Reads a raw value.
    ///
    /// A payload that exists but cannot be read comes back as
    /// `MarginError::CorruptData`, never as absent.
    pub fn get(&self, logical_key: &str) -> Result<Option<String>> {
        let key = self.scoped_key(logical_key);
        self.store.get(&key).map_err(|err| {
            tracing::warn!(key = %key, error = %err, "Failed to read from storage");
            match err {
                corrupt @ MarginError::CorruptData { .. } => corrupt,
                other => MarginError::corrupt_data(&key, other.reason()),
            }
        })
    }

    /// Writes a raw value. Any failure comes back as `MarginError::Storage`.
    pub fn set(&self, logical_key: &str, value: &str) -> Result<()> {
        let key = self.scoped_key(logical_key);
        self.store.set(&key, value).map_err(|err| match err {
            storage @ MarginError::Storage { .. } => storage,
            other => MarginError::storage(&key, other.reason()),
        })
    }

    /// Deserializes the JSON payload under `logical_key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: payload present and well-formed
    /// - `Ok(None)`: key absent
    /// - `Err(MarginError::CorruptData)`: payload present but unreadable or malformed
    pub fn load_json<T: DeserializeOwned>(&self, logical_key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(logical_key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| MarginError::corrupt_data(self.scoped_key(logical_key), err.to_string()))
    }

    /// Loads a JSON payload, falling back to `T::default()` when absent or corrupt.
    pub fn load_json_or_default<T: DeserializeOwned + Default>(&self, logical_key: &str) -> Loaded<T> {
        match self.load_json(logical_key) {
            Ok(value) => Loaded {
                value: value.unwrap_or_default(),
                corruption: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "Discarding corrupt payload, using defaults");
                Loaded {
                    value: T::default(),
                    corruption: Some(err),
                }
            }
        }
    }

    /// Serializes `value` as JSON and writes it under `logical_key`.
    pub fn save_json<T: Serialize + ?Sized>(&self, logical_key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value)
            .map_err(|err| MarginError::storage(self.scoped_key(logical_key), err.to_string()))?;
        self.set(logical_key, &payload)
    }
}
