//! Assistant configuration.
//!
//! - `config`: the `AgentConfig` value object
//! - `store`: per-user persistence of that value

mod config;
mod store;

pub use config::AgentConfig;
pub use store::ConfigStore;
