//! Note session use case.
//!
//! `NoteSession` is what a front end talks to once a user is signed in. It
//! turns [`UiIntent`]s into repository, ledger and config operations, and
//! pushes the results to the [`RenderSink`].

use std::sync::Arc;

use margin_core::agent::AgentConfig;
use margin_core::chat::{ChatRole, ChatTurn};
use margin_core::clock::{Clock, SystemClock};
use margin_core::error::Result;
use margin_core::intent::UiIntent;
use margin_core::note::{Note, NoteId};
use margin_core::render::RenderSink;
use margin_core::session::{SessionGate, UserId, require_user};
use margin_core::storage::{Flushed, KeyValueStore};
use margin_core::MarginError;
use margin_interaction::{HttpRemoteAgent, RemoteAgent, SimulatedAgent};

use crate::dispatcher::{ASSISTANT_ENABLED_GREETING, AiDispatcher, DispatchOutcome};
use crate::state::SessionState;

/// Whether the front end should keep running after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    /// The user signed out; the front end should leave.
    Ended,
}

/// Collaborators a session is built with.
#[derive(Clone)]
pub struct SessionOptions {
    pub remote: Arc<dyn RemoteAgent>,
    pub simulated: SimulatedAgent,
    pub clock: Arc<dyn Clock>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            remote: Arc::new(HttpRemoteAgent::new()),
            simulated: SimulatedAgent::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

/// A signed-in user's notes page with its assistant panel.
pub struct NoteSession {
    state: SessionState,
    dispatcher: AiDispatcher,
    renderer: Arc<dyn RenderSink>,
    gate: Arc<dyn SessionGate>,
}

impl NoteSession {
    /// Opens the session for the gate's current user.
    ///
    /// # Errors
    ///
    /// `MarginError::Unauthenticated` when nobody is signed in. No data is
    /// loaded in that case.
    pub fn start(
        gate: Arc<dyn SessionGate>,
        store: Arc<dyn KeyValueStore>,
        renderer: Arc<dyn RenderSink>,
        options: SessionOptions,
    ) -> Result<Self> {
        let user = require_user(gate.as_ref())?;
        tracing::info!(user = %user, "Starting note session");

        let state = SessionState::load(store, user, options.clock.clone());
        let dispatcher = AiDispatcher::new(
            state.clone(),
            options.remote,
            options.simulated,
            options.clock,
            renderer.clone(),
        );

        Ok(Self {
            state,
            dispatcher,
            renderer,
            gate,
        })
    }

    pub fn user(&self) -> &UserId {
        &self.state.user
    }

    /// Renders the loaded notes and chat history.
    pub async fn render_initial(&self) {
        self.render_notes().await;
        let turns = self.chat_history().await;
        self.renderer.render_chat_history(&turns);
    }

    /// Applies one intent.
    pub async fn handle(&self, intent: UiIntent) -> SessionFlow {
        match intent {
            UiIntent::CreateNote { title, content } => {
                let result = self.state.notes.lock().await.create(title, content);
                match result {
                    Ok(saved) => self.report_note_flush(saved),
                    Err(err) => self.renderer.alert(&format!("保存笔记失败：{}", err.reason())),
                }
                self.render_notes().await;
            }
            UiIntent::UpdateNote { id, title, content } => {
                let result = self.state.notes.lock().await.update(id, title, content);
                match result {
                    Ok(saved) => self.report_note_flush(saved),
                    Err(err) => tracing::debug!(id, error = %err, "Ignoring update of unknown note"),
                }
                self.render_notes().await;
            }
            UiIntent::DeleteNote { id } => {
                let removed = self.state.notes.lock().await.delete(id);
                self.report_note_flush(removed);
                self.render_notes().await;
            }
            UiIntent::SearchNotes { title, content } => {
                let found = self.search(&title, &content).await;
                self.renderer.render_notes(&found);
            }
            UiIntent::ClearSearch => self.render_notes().await,
            UiIntent::SendChatMessage { text } => {
                self.send_chat_message(&text).await;
            }
            UiIntent::ClearChatHistory => {
                let turns = {
                    let mut ledger = self.state.ledger.lock().await;
                    // Logged by the ledger.
                    let _ = ledger.clear();
                    ledger.all().to_vec()
                };
                self.renderer.render_chat_history(&turns);
            }
            UiIntent::SaveAgentConfig { config } => self.save_agent_config(config).await,
            UiIntent::Logout => {
                if let Err(err) = self.gate.sign_out() {
                    tracing::warn!(error = %err, "Sign-out failed");
                }
                tracing::info!(user = %self.state.user, "Note session ended");
                return SessionFlow::Ended;
            }
        }
        SessionFlow::Continue
    }

    /// Sends a chat message and waits for the reply.
    ///
    /// Safe to call concurrently from several tasks.
    pub async fn send_chat_message(&self, text: &str) -> DispatchOutcome {
        self.dispatcher.handle_user_message(text).await
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.state.notes.lock().await.list()
    }

    pub async fn note(&self, id: NoteId) -> Option<Note> {
        self.state.notes.lock().await.get(id)
    }

    pub async fn search(&self, title: &str, content: &str) -> Vec<Note> {
        self.state.notes.lock().await.search(title, content)
    }

    pub async fn chat_history(&self) -> Vec<ChatTurn> {
        self.state.ledger.lock().await.all().to_vec()
    }

    pub async fn agent_config(&self) -> AgentConfig {
        self.state.config.lock().await.config().clone()
    }

    /// Stored payloads that were unreadable and replaced by defaults.
    pub async fn load_issues(&self) -> Vec<MarginError> {
        self.state.load_issues().await
    }

    async fn save_agent_config(&self, config: AgentConfig) {
        let config = config.normalized();
        let enabled = config.enabled;

        let saved = self.state.config.lock().await.save(config);
        if let Err(err) = saved {
            self.renderer.alert(&format!("保存AI配置失败：{}", err.reason()));
        }

        if enabled {
            self.dispatcher
                .append(ChatRole::Assistant, ASSISTANT_ENABLED_GREETING)
                .await;
        }
    }

    async fn render_notes(&self) {
        let notes = self.notes().await;
        self.renderer.render_notes(&notes);
    }

    fn report_note_flush<T>(&self, flushed: Flushed<T>) {
        let (_, flush) = flushed.into_parts();
        if let Err(err) = flush {
            self.renderer.alert(&format!("保存笔记失败：{}", err.reason()));
        }
    }
}
