//! Note domain module.
//!
//! # Module Structure
//!
//! - `model`: the `Note` entity
//! - `repository`: the per-user ordered note collection and its persistence
//!
//! # Usage
//!
//! ```ignore
//! use margin_core::note::{Note, NoteId, NoteRepository};
//! ```

mod model;
pub mod repository;

pub use model::{Note, NoteId};
pub use repository::NoteRepository;
