use crate::error::AuthError;
use cycle_api::endpoints::auth::TokenPair;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The persisted form of the credential pair, under fixed keys.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl StoredCredentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Both tokens present and non-empty.
    pub fn is_complete(&self) -> bool {
        let present = |token: &Option<String>| token.as_deref().is_some_and(|t| !t.is_empty());
        present(&self.access_token) && present(&self.refresh_token)
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("StoredCredentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Durable home of the credential pair between runs.
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<StoredCredentials, AuthError>;
    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Process-local storage, used by tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    credentials: Mutex<StoredCredentials>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }

    pub fn snapshot(&self) -> StoredCredentials {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoredCredentials> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self) -> Result<StoredCredentials, AuthError> {
        Ok(self.snapshot())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        *self.lock() = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.lock() = StoredCredentials::default();
        Ok(())
    }
}

impl<S: CredentialStorage + ?Sized> CredentialStorage for std::sync::Arc<S> {
    fn load(&self) -> Result<StoredCredentials, AuthError> {
        (**self).load()
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        (**self).save(credentials)
    }

    fn clear(&self) -> Result<(), AuthError> {
        (**self).clear()
    }
}

#[derive(Default)]
struct Session {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
}

impl Session {
    fn to_stored(&self) -> StoredCredentials {
        StoredCredentials {
            access_token: self
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        }
    }
}

/// Sole owner of the credential pair.
///
/// The in-memory pair is authoritative for the running process; every
/// mutation is mirrored to the storage backend, and a failed write is logged
/// rather than rolled back.
pub struct SessionStore {
    session: RwLock<Session>,
    storage: Box<dyn CredentialStorage>,
}

impl SessionStore {
    /// Starts unauthenticated; call [`SessionStore::rehydrate`] to pick up stored credentials.
    pub fn new(storage: impl CredentialStorage + 'static) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            storage: Box::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryCredentialStorage::new())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        non_empty(self.read().access_token.as_ref())
    }

    pub fn refresh_token(&self) -> Option<String> {
        non_empty(self.read().refresh_token.as_ref())
    }

    /// Login path: replaces both tokens.
    pub fn set_credentials(&self, tokens: &TokenPair) {
        let mut session = self.write();
        session.access_token = Some(SecretString::from(tokens.access_token.clone()));
        session.refresh_token = Some(SecretString::from(tokens.refresh_token.clone()));
        self.persist(&session.to_stored());
    }

    /// Refresh path: installs `access_token` only if `refresh_token` is still
    /// the current one.
    ///
    /// Returns `false` without touching anything when the session was cleared
    /// or replaced while the refresh was in flight.
    pub fn replace_access_token_if(&self, refresh_token: &str, access_token: &str) -> bool {
        let mut session = self.write();
        let current = session.refresh_token.as_ref().map(|t| t.expose_secret());
        if current != Some(refresh_token) {
            return false;
        }

        session.access_token = Some(SecretString::from(access_token.to_string()));
        self.persist(&session.to_stored());
        true
    }

    pub fn clear(&self) {
        let mut session = self.write();
        *session = Session::default();
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "Failed to clear stored credentials");
        }
    }

    /// Loads the stored pair and trusts it if both tokens are present.
    ///
    /// Anything less is treated as logged out and wiped, so a half-present
    /// pair never survives a restart. Returns whether a session was restored.
    pub fn rehydrate(&self) -> bool {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored credentials");
                StoredCredentials::default()
            }
        };

        if stored.is_complete() {
            let mut session = self.write();
            session.access_token = stored.access_token.map(SecretString::from);
            session.refresh_token = stored.refresh_token.map(SecretString::from);
            tracing::debug!("Restored stored session");
            true
        } else {
            if stored != StoredCredentials::default() {
                tracing::info!("Discarding incomplete stored credentials");
            }
            self.clear();
            false
        }
    }

    fn persist(&self, stored: &StoredCredentials) {
        if let Err(e) = self.storage.save(stored) {
            tracing::warn!(error = %e, "Failed to persist credentials");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

fn non_empty(token: Option<&SecretString>) -> Option<String> {
    token
        .map(|t| t.expose_secret())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
