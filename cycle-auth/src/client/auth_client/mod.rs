use super::config::Settings;
use super::gateway::Gateway;
use super::session::SessionStore;
use super::token_storage::FileCredentialStorage;
use crate::error::AuthError;
use cycle_api::endpoints::users::User;
use cycle_api::{Client, ErrorKind, Request, Transport};
use std::sync::Arc;

/// Login, registration and account management on top of the shared gateway.
pub struct AuthClient<T> {
    gateway: Arc<Gateway<T>>,
}

impl AuthClient<Client> {
    /// HTTP client for the configured server, persisting credentials in the user cache directory.
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        settings.validate().map_err(AuthError::Configuration)?;

        let session = Arc::new(SessionStore::new(FileCredentialStorage::new()?));
        let transport = Client::new(settings.server_url.clone());
        Ok(Self::new(Arc::new(Gateway::new(transport, session))))
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway<T>> {
        &self.gateway
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// `login` is a username or an email address.
    pub async fn login(&self, login: &str, password: &str) -> Result<(), AuthError> {
        let tokens = self.gateway.send(Request::auth().login(login, password)).await?;
        self.session().set_credentials(&tokens);
        tracing::info!(login, "Logged in");
        Ok(())
    }

    /// Creates the account; the caller logs in separately.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        let user = self
            .gateway
            .send(Request::auth().register(username, email, password, confirm_password))
            .await?;
        tracing::info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    pub fn logout(&self) {
        self.session().clear();
        tracing::info!("Logged out");
    }

    /// Restores a stored session and loads its profile.
    ///
    /// `Ok(None)` when there is nothing to restore or the server no longer
    /// accepts the stored pair (it has been cleared by then). Any other
    /// failure leaves the session in place and is returned as is.
    pub async fn initialize(&self) -> Result<Option<User>, AuthError> {
        if !self.session().rehydrate() {
            return Ok(None);
        }

        match self.current_user().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.kind() == ErrorKind::AuthInvalid => {
                tracing::info!(error = %e, "Stored session is no longer valid");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn current_user(&self) -> Result<User, AuthError> {
        self.gateway.send(Request::users().me()).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.gateway
            .send(Request::users().change_password(current_password, new_password))
            .await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Deletes the account and every record it owns, then forgets the session.
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        self.gateway.send(Request::users().delete_me()).await?;
        self.session().clear();
        tracing::info!("Account deleted");
        Ok(())
    }

    fn session(&self) -> &SessionStore {
        self.gateway.session()
    }
}
