pub mod endpoints;
mod error;
mod macros;
pub mod repositories;

// Always expose testing module (downstream crates drive their tests through it)
pub mod testing;

pub use crate::error::{CycleApiError, ErrorBody, ErrorKind};
use repositories::*;
use serde::de::DeserializeOwned;
use std::future::Future;
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Which credential, if any, an endpoint expects in its `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Regular authenticated call, carries the access token.
    Access,
    /// The refresh call itself, carries the refresh token.
    Refresh,
    /// Sent without credentials (login, register).
    Public,
}

/// A request description the gateway can send, and resend after a refresh.
pub trait Endpoint: ApiRequest<Response: DeserializeOwned + Send> + Clone + Send + Sync {
    const AUTH: AuthScheme = AuthScheme::Access;
}

/// The seam between the gateway and the wire.
///
/// `bearer` is attached verbatim as `Authorization: Bearer <token>` when present.
pub trait Transport: Send + Sync {
    fn send<R>(
        &self,
        request: R,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<R::Response, CycleApiError>> + Send
    where
        R: Endpoint;
}

/// HTTP transport backed by tower-api-client.
pub struct Client {
    base_url: String,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn inner(&self, bearer: Option<&str>) -> ApiClient {
        match bearer {
            Some(token) => ApiClient::new(self.base_url.as_str()).bearer_auth(token),
            None => ApiClient::new(self.base_url.as_str()),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Transport for Client {
    async fn send<R>(&self, request: R, bearer: Option<&str>) -> Result<R::Response, CycleApiError>
    where
        R: Endpoint,
    {
        tracing::trace!(endpoint = %request.endpoint(), method = %R::METHOD, "Sending request");
        self.inner(bearer).send(request).await.map_err(From::from)
    }
}

pub struct Request;

impl Request {
    pub fn new() -> Self {
        Self {}
    }

    pub fn auth() -> AuthRepository {
        AuthRepository::new()
    }

    pub fn users() -> UserRepository {
        UserRepository::new()
    }

    pub fn periods() -> PeriodRepository {
        PeriodRepository::new()
    }

    pub fn reports() -> ReportRepository {
        ReportRepository::new()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}
