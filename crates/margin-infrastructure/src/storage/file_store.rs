//! File-backed key/value store: one file per key under a single directory.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use margin_core::error::{MarginError, Result};
use margin_core::storage::KeyValueStore;

use super::atomic_file::{FileLock, read_optional, write_atomic};

const VALUE_EXTENSION: &str = "json";

/// Durable [`KeyValueStore`] that survives restarts.
///
/// Each key maps to `<dir>/<escaped key>.json`. Every write replaces the file
/// atomically under an exclusive lock, so two processes sharing the directory
/// never observe a torn value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", escape_key(key), VALUE_EXTENSION))
    }
}

/// Escapes a key into a portable file stem.
///
/// ASCII letters, digits, `_` and `-` pass through; every other byte becomes
/// `%XX`. The mapping is injective, so distinct keys never share a file.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            escaped.push(byte as char);
        } else {
            let _ = write!(escaped, "%{:02X}", byte);
        }
    }
    escaped
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        read_optional(&self.path_for(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let _lock = FileLock::acquire(&path)?;
        write_atomic(&path, value.as_bytes())
            .map_err(|err| MarginError::storage(key, err.reason()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MarginError::storage(key, err.to_string())),
        }
    }
}
