//! Rendering collaborator interface.
//!
//! The front end (terminal, web view, ...) implements this; the application
//! layer calls it after every state change it wants shown.

use crate::chat::ChatTurn;
use crate::note::Note;

pub trait RenderSink: Send + Sync {
    /// Shows a list of notes (the full collection or a search result).
    fn render_notes(&self, notes: &[Note]);

    /// Shows the full chat history, oldest first.
    fn render_chat_history(&self, turns: &[ChatTurn]);

    /// Begin signal of the "assistant is typing" indicator.
    fn show_typing_indicator(&self);

    /// End signal of the "assistant is typing" indicator.
    fn hide_typing_indicator(&self);

    /// Blocking user-facing notice, e.g. a failed save.
    fn alert(&self, message: &str);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn render_notes(&self, _notes: &[Note]) {}

    fn render_chat_history(&self, _turns: &[ChatTurn]) {}

    fn show_typing_indicator(&self) {}

    fn hide_typing_indicator(&self) {}

    fn alert(&self, _message: &str) {}
}
