//! File-system adapters for Margin: paths, settings and the durable
//! key/value store.

pub mod paths;
pub mod settings;
pub mod storage;

pub use crate::paths::MarginPaths;
pub use crate::settings::{AppSettings, SettingsService};
pub use crate::storage::FileKeyValueStore;
