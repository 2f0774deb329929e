//! Session file storage.

use std::path::{Path, PathBuf};

use grammers_session::Session;

use crate::CoreError;

/// On-disk location of a Telegram session.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    /// Storage backed by the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Session file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a session was saved before.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the stored session, or start an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file is unreadable.
    pub fn load(&self) -> Result<Session, CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Session::load_file_or_create(&self.path).map_err(|e| {
            CoreError::Auth(format!("loading session {}: {e}", self.path.display()))
        })
    }

    /// Persist `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), CoreError> {
        session.save_to_file(&self.path).map_err(|e| {
            CoreError::Auth(format!("saving session {}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_tracks_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = SessionStorage::new(dir.path().join("anon.session"));
        assert!(!storage.exists());
        std::fs::write(storage.path(), b"").expect("touch");
        assert!(storage.exists());
    }

    #[test]
    fn directories_are_not_sessions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = SessionStorage::new(dir.path().to_path_buf());
        assert!(!storage.exists());
    }
}
