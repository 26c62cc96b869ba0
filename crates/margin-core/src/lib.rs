//! Domain layer for Margin: notes, chat history, assistant configuration
//! and the storage/rendering seams they depend on.

pub mod agent;
pub mod chat;
pub mod clock;
pub mod error;
pub mod intent;
pub mod note;
pub mod render;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::MarginError;
