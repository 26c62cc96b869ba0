//! Time source used for note and chat timestamps.

use chrono::{DateTime, Local};

/// Display format for note creation/modification times.
pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format for chat turn times.
pub const CHAT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Supplies the current local time.
///
/// Injected into the repositories so tests can pin timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Timestamp string stored on notes.
    fn note_timestamp(&self) -> String {
        self.now().format(NOTE_TIMESTAMP_FORMAT).to_string()
    }

    /// Timestamp string stored on chat turns.
    fn chat_timestamp(&self) -> String {
        self.now().format(CHAT_TIMESTAMP_FORMAT).to_string()
    }

    /// Milliseconds since the Unix epoch.
    fn epoch_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
