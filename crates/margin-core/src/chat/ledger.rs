use std::sync::Arc;

use super::model::{ChatRole, ChatTurn};
use crate::clock::Clock;
use crate::error::{MarginError, Result};
use crate::storage::{CHAT_HISTORY_KEY, Flushed, Loaded, UserStore};

/// Maximum number of turns kept; older turns are evicted first.
pub const MAX_CHAT_TURNS: usize = 50;

/// Bounded, append-only log of chat turns for one user.
pub struct ChatLedger {
    store: UserStore,
    clock: Arc<dyn Clock>,
    turns: Vec<ChatTurn>,
    corruption: Option<MarginError>,
}

impl ChatLedger {
    /// Loads the persisted history, falling back to empty on absent or corrupt data.
    ///
    /// An over-long stored history is cut down to the newest turns.
    pub fn load(store: UserStore, clock: Arc<dyn Clock>) -> Self {
        let Loaded {
            value: mut turns,
            corruption,
        } = store.load_json_or_default::<Vec<ChatTurn>>(CHAT_HISTORY_KEY);
        truncate_to_newest(&mut turns);

        Self {
            store,
            clock,
            turns,
            corruption,
        }
    }

    pub fn corruption(&self) -> Option<&MarginError> {
        self.corruption.as_ref()
    }

    /// All turns, oldest first.
    pub fn all(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a turn stamped with the current time and persists the ledger.
    pub fn append(&mut self, role: ChatRole, content: impl Into<String>) -> Flushed<ChatTurn> {
        let turn = ChatTurn {
            role,
            content: content.into(),
            timestamp: self.clock.chat_timestamp(),
        };
        self.turns.push(turn.clone());
        truncate_to_newest(&mut self.turns);

        Flushed::new(turn, self.flush())
    }

    /// Empties the ledger and persists the empty state.
    pub fn clear(&mut self) -> Result<()> {
        self.turns.clear();
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let result = self.store.save_json(CHAT_HISTORY_KEY, &self.turns);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "Failed to persist chat history");
        }
        result
    }
}

fn truncate_to_newest(turns: &mut Vec<ChatTurn>) {
    if turns.len() > MAX_CHAT_TURNS {
        let excess = turns.len() - MAX_CHAT_TURNS;
        turns.drain(..excess);
    }
}
