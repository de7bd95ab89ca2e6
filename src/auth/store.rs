//! On-disk location of persisted sessions.

use std::path::{Path, PathBuf};

use crate::auth::Session;
use crate::{Error, Result};

/// Environment variable that relocates the preferences directory.
pub const PREFERENCES_DIR_ENV: &str = "GBM_PREFERENCES_DIR";

/// Directory name used under `$HOME` when the variable is unset.
const DEFAULT_DIR_NAME: &str = ".gbm";

/// Legacy digital API session pack file name.
const LAST_SESSION_FILE: &str = "last_session.json";

/// Per-user session files under the preferences directory.
///
/// Files are read and written whole, without locking. Two processes
/// sharing a directory can overwrite each other's sessions.
///
/// # Example
///
/// ```
/// use gbm::SessionStore;
///
/// let store = SessionStore::new("/tmp/gbm-prefs");
/// assert!(store.session_path("alice").unwrap().ends_with("alice_session.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Use `dir` as the preferences directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the preferences directory from `GBM_PREFERENCES_DIR`,
    /// falling back to `$HOME/.gbm`.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(PREFERENCES_DIR_ENV) {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not find home directory".to_string()))?;
        Ok(Self::new(home.join(DEFAULT_DIR_NAME)))
    }

    /// Use `dir` when given, otherwise resolve from the environment.
    pub fn resolve(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::from_env(),
        }
    }

    /// The preferences directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the preferences directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Path of the session file for `user`.
    pub fn session_path(&self, user: &str) -> Result<PathBuf> {
        if user.is_empty() || user.contains(['/', '\\']) || user == "." || user == ".." {
            return Err(Error::InvalidInput(format!(
                "User name {:?} cannot be used as a file name",
                user
            )));
        }
        Ok(self.dir.join(format!("{}_session.json", user)))
    }

    /// Path of the legacy digital API session pack.
    pub fn last_session_path(&self) -> PathBuf {
        self.dir.join(LAST_SESSION_FILE)
    }

    /// Persist `session` under its user's file and return the path written.
    pub fn save(&self, session: &Session) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.session_path(session.user())?;
        session.persist(&path)?;
        Ok(path)
    }

    /// Load the session previously saved for `user`.
    pub fn load(&self, user: &str) -> Result<Session> {
        Session::load(self.session_path(user)?)
    }

    /// Delete the saved session for `user`. Returns `false` when there was
    /// nothing to delete.
    pub fn remove(&self, user: &str) -> Result<bool> {
        let path = self.session_path(user)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(user: &str) -> Session {
        Session::new(
            user,
            &json!({
                "accessToken": "a",
                "identityToken": "i",
                "refreshToken": "r",
                "tokenType": "Bearer",
                "expiresIn": 1200,
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_save_creates_directory_and_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path().join("nested").join(".gbm"));

        let path = store.save(&session("alice")).unwrap();
        assert!(path.ends_with("alice_session.json"));
        assert!(path.exists());

        let loaded = store.load("alice").unwrap();
        assert_eq!(loaded.user(), "alice");
        assert_eq!(loaded.access_header(), "Bearer a");
    }

    #[test]
    fn test_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        store.save(&session("alice")).unwrap();

        assert!(store.remove("alice").unwrap());
        assert!(!store.remove("alice").unwrap());
        assert!(matches!(store.load("alice"), Err(Error::SessionFileNotFound(_))));
    }

    #[test]
    fn test_rejects_path_like_user_names() {
        let store = SessionStore::new("/tmp");
        assert!(store.session_path("../etc").is_err());
        assert!(store.session_path("").is_err());
        assert!(store.session_path("user@example.com").is_ok());
    }

    #[test]
    fn test_resolve_prefers_explicit_dir() {
        let store = SessionStore::resolve(Some(Path::new("/opt/prefs"))).unwrap();
        assert_eq!(store.dir(), Path::new("/opt/prefs"));
        assert_eq!(store.last_session_path(), Path::new("/opt/prefs/last_session.json"));
    }
}
