//! Episode log persistence: one JSON array of round records per episode,
//! rewritten in full at every round boundary and at episode end so early
//! termination always leaves a complete file behind.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::RoundLogRecord;

const LOG_FILE_NAME: &str = "log_env.json";

#[derive(Debug)]
pub enum JournalError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for JournalError {}

impl From<std::io::Error> for JournalError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Writes the episode's accumulated rows to `<storage>/log_env.json`.
#[derive(Debug, Clone)]
pub struct JsonLogStore {
    path: PathBuf,
}

impl JsonLogStore {
    /// Create a store under the given storage directory, creating the
    /// directory if needed.
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = storage_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(LOG_FILE_NAME),
        })
    }

    /// Replace the log file with the full record set.
    pub fn write(&self, records: &[RoundLogRecord]) -> Result<(), JournalError> {
        let encoded = serde_json::to_string(records)?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
