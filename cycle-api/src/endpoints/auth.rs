use super::users::User;
use crate::{AuthScheme, Endpoint};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

// Responses

/// Credential pair issued on login.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
}

impl std::fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// Requests

#[derive(Clone, Serialize)]
pub struct Login {
    login: String,
    password: String,
}

impl Login {
    /// `login` is either the username or the email address.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Request for Login {
    type Data = Self;
    type Response = TokenPair;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/auth/login".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

impl Endpoint for Login {
    const AUTH: AuthScheme = AuthScheme::Public;
}

#[derive(Clone, Serialize)]
pub struct Register {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

impl Register {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

impl Request for Register {
    type Data = Self;
    type Response = User;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/auth/register".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

impl Endpoint for Register {
    const AUTH: AuthScheme = AuthScheme::Public;
}

/// Mints a new access token; authenticated with the refresh token.
#[derive(Default, Debug, Clone, Serialize)]
pub struct RefreshToken;

impl RefreshToken {
    pub fn new() -> Self {
        Self
    }
}

impl Request for RefreshToken {
    type Data = ();
    type Response = RefreshedToken;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/auth/refresh".into()
    }
}

impl Endpoint for RefreshToken {
    const AUTH: AuthScheme = AuthScheme::Refresh;
}
