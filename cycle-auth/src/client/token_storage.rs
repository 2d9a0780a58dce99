use super::session::{CredentialStorage, StoredCredentials};
use crate::error::AuthError;
use std::fs;
use std::path::{Path, PathBuf};

const CREDENTIALS_FILE: &str = "credentials.json";

/// Keeps the credential pair in `<cache dir>/cycle/credentials.json`, readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new() -> Result<Self, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::TokenStorage("No cache directory on this platform".into()))?
            .join("cycle");
        Self::in_dir(&cache_dir)
    }

    pub fn in_dir(dir: &Path) -> Result<Self, AuthError> {
        // Create cache directory if it doesn't exist
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to create cache directory: {}", e))
            })?;
        }

        Ok(Self {
            path: dir.join(CREDENTIALS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self) -> Result<StoredCredentials, AuthError> {
        if !self.path.exists() {
            return Ok(StoredCredentials::default());
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to read credentials: {}", e)))?;

        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(credentials)?;

        fs::write(&self.path, json)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save credentials: {}", e)))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to delete credentials: {}", e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::in_dir(dir.path()).unwrap();
        assert_eq!(storage.load().unwrap(), StoredCredentials::default());
    }

    #[test]
    fn saves_under_fixed_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::in_dir(&dir.path().join("nested")).unwrap();

        storage.save(&StoredCredentials::new("acc", "ref")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(raw["access_token"], "acc");
        assert_eq!(raw["refresh_token"], "ref");
        assert_eq!(storage.load().unwrap(), StoredCredentials::new("acc", "ref"));

        storage.clear().unwrap();
        assert!(!storage.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn credentials_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::in_dir(dir.path()).unwrap();
        storage.save(&StoredCredentials::new("acc", "ref")).unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn partial_file_is_readable() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::in_dir(dir.path()).unwrap();
        fs::write(storage.path(), r#"{"access_token": "only-access"}"#).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("only-access"));
        assert!(!loaded.is_complete());
    }
}
