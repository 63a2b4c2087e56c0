use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsdesk_core::{Role, UserId};

const SESSION_FILE: &str = "current_user.json";

/// What survives between invocations: just enough to rehydrate the
/// signed-in user without re-prompting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not access session file `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("session file `{path}` is corrupt: {source}")]
    Corrupt { path: PathBuf, source: serde_json::Error },
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError>;
    fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Persists the session as a single JSON file under the configured
/// directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn io_error(path: &Path, source: std::io::Error) -> SessionError {
        SessionError::Io { path: path.to_path_buf(), source }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Self::io_error(&path, source)),
        };

        let record = serde_json::from_str(&raw)
            .map_err(|source| SessionError::Corrupt { path: path.clone(), source })?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir).map_err(|source| Self::io_error(&self.dir, source))?;

        let path = self.path();
        let raw = serde_json::to_string_pretty(record)
            .map_err(|source| SessionError::Corrupt { path: path.clone(), source })?;
        fs::write(&path, raw).map_err(|source| Self::io_error(&path, source))
    }

    fn clear(&self) -> Result<(), SessionError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Self::io_error(&path, source)),
        }
    }
}

/// Test double; also handy for callers that never want a file on disk.
#[derive(Default)]
pub struct InMemorySessionStore {
    slot: Mutex<Option<SessionRecord>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slot.clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
        Ok(())
    }
}
