//! Application layer for Margin.
//!
//! Coordinates the note repository, chat ledger and assistant config of a
//! signed-in user, and routes chat messages to the assistant backends.

pub mod dispatcher;
pub mod session_usecase;
pub mod state;

pub use dispatcher::{AiDispatcher, DispatchOutcome, DispatchState, ReplyPath};
pub use session_usecase::{NoteSession, SessionFlow, SessionOptions};
pub use state::SessionState;
