use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AutomationError, Result};

/// Username used when no credentials have been saved.
pub const DEFAULT_USERNAME: &str = "default_user";

const APP_DIR: &str = "linkedin-automation";
const FILE_NAME: &str = "credentials.json";

/// LinkedIn login used by automation jobs.
///
/// Stored locally as plain JSON, unencrypted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Fallback identity used when nothing has been saved.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_USERNAME, "")
    }

    /// Username used in log endpoint paths.
    pub fn username(&self) -> &str {
        if self.email.is_empty() {
            DEFAULT_USERNAME
        } else {
            &self.email
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// File-backed credential storage.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform config directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or_else(|| {
            AutomationError::Config("could not determine the user config directory".into())
        })?;
        Ok(Self::at(dir.join(APP_DIR).join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved credentials, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Credentials>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saved credentials, falling back to [`Credentials::fallback`] when the
    /// file is missing or unreadable.
    pub fn load_or_default(&self) -> Credentials {
        match self.load() {
            Ok(Some(creds)) => creds,
            Ok(None) => Credentials::fallback(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable credentials file");
                Credentials::fallback()
            }
        }
    }

    /// Persist credentials. Both fields are required.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if creds.email.trim().is_empty() || creds.password.is_empty() {
            return Err(AutomationError::Validation(
                "email and password are both required".into(),
            ));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(creds)?)?;
        tracing::info!(path = %self.path.display(), "Saved LinkedIn credentials");
        Ok(())
    }

    /// Remove saved credentials. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_clear() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::at(temp.path().join("nested").join("creds.json"));
        assert!(store.load().unwrap().is_none());

        let creds = Credentials::new("me@example.com", "hunter2");
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_fallback_on_corrupt_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("creds.json");
        fs::write(&path, "{not json").unwrap();
        let store = CredentialStore::at(&path);
        assert!(store.load().is_err());
        assert_eq!(store.load_or_default().username(), DEFAULT_USERNAME);
    }

    #[test]
    fn test_save_requires_both_fields() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::at(temp.path().join("creds.json"));
        let result = store.save(&Credentials::new("me@example.com", ""));
        assert!(matches!(result, Err(AutomationError::Validation(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("me@example.com", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("me@example.com"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_username_falls_back_when_empty() {
        assert_eq!(Credentials::new("", "").username(), "default_user");
        assert_eq!(Credentials::new("a@b.c", "x").username(), "a@b.c");
    }
}
