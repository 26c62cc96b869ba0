//! Per-session in-memory state shared by the session and the dispatcher.

use std::sync::Arc;

use margin_core::MarginError;
use margin_core::agent::ConfigStore;
use margin_core::chat::ChatLedger;
use margin_core::clock::Clock;
use margin_core::note::NoteRepository;
use margin_core::session::UserId;
use margin_core::storage::{KeyValueStore, UserStore};
use tokio::sync::Mutex;

/// Everything loaded for one signed-in user.
///
/// Locks are only held for synchronous sections; nothing awaits while
/// holding one, so concurrent messages can interleave freely.
#[derive(Clone)]
pub struct SessionState {
    pub user: UserId,
    pub notes: Arc<Mutex<NoteRepository>>,
    pub ledger: Arc<Mutex<ChatLedger>>,
    pub config: Arc<Mutex<ConfigStore>>,
}

impl SessionState {
    /// Loads notes, chat history and assistant config for `user`.
    pub fn load(store: Arc<dyn KeyValueStore>, user: UserId, clock: Arc<dyn Clock>) -> Self {
        let user_store = UserStore::new(store, user.clone());
        Self {
            notes: Arc::new(Mutex::new(NoteRepository::load(
                user_store.clone(),
                clock.clone(),
            ))),
            ledger: Arc::new(Mutex::new(ChatLedger::load(user_store.clone(), clock))),
            config: Arc::new(Mutex::new(ConfigStore::load(user_store))),
            user,
        }
    }

    /// Corrupt payloads that were replaced by defaults while loading.
    pub async fn load_issues(&self) -> Vec<MarginError> {
        let mut issues = Vec::new();
        issues.extend(self.notes.lock().await.corruption().cloned());
        issues.extend(self.ledger.lock().await.corruption().cloned());
        issues.extend(self.config.lock().await.corruption().cloned());
        issues
    }
}
