//! Assistant chat history.

mod ledger;
mod model;

pub use ledger::{ChatLedger, MAX_CHAT_TURNS};
pub use model::{ChatRole, ChatTurn};
