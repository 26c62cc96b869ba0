//! File-system storage primitives.

pub mod atomic_file;
pub mod file_store;

pub use atomic_file::{AtomicTomlFile, FileLock};
pub use file_store::FileKeyValueStore;
