//! Persisted login session
//!
//! Keeps the logged-in identity between CLI invocations as a small JSON file.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::Session;

/// Errors reading or writing the session file
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data directory available for the session file")]
    NoDataDir,
}

/// Session file location and access
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/health-companion/session.json`
    pub fn default_location() -> Result<Self, SessionError> {
        let dir = dirs::data_local_dir().ok_or(SessionError::NoDataDir)?;
        Ok(Self::new(dir.join("health-companion").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// The saved session, or `None` when logged out
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Forget the saved session. Clearing twice is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Role;
    use tempfile::tempdir;

    fn nurse() -> Session {
        Session {
            username: "nurse_sarah".to_string(),
            full_name: "Sarah Jones".to_string(),
            role: Role::Caregiver,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&nurse()).unwrap();
        assert_eq!(store.load().unwrap(), Some(nurse()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionError::Json(_))));
    }
}
