use cycle_api::{CycleApiError, ErrorKind};
use thiserror::Error;

/// Why a token refresh did not produce a new access token.
///
/// `Clone` because one outcome is delivered to every request queued on it.
#[derive(Error, Debug, Clone)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingToken,

    #[error("Refresh rejected: {0}")]
    Rejected(CycleApiError),

    #[error("Refresh was abandoned before it completed")]
    Abandoned,

    #[error("Timed out waiting for the token refresh")]
    TimedOut,

    #[error("Session ended while the token was being refreshed")]
    SessionEnded,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] CycleApiError),

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Token refresh failed: {0}")]
    Refresh(RefreshError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Api(e) => e.kind(),
            AuthError::SessionExpired => ErrorKind::AuthInvalid,
            AuthError::Refresh(RefreshError::MissingToken | RefreshError::SessionEnded) => {
                ErrorKind::AuthInvalid
            }
            AuthError::Refresh(RefreshError::Rejected(e)) => e.kind(),
            AuthError::Refresh(RefreshError::TimedOut) => ErrorKind::NetworkFailure,
            AuthError::Refresh(RefreshError::Abandoned)
            | AuthError::Configuration(_)
            | AuthError::TokenStorage(_)
            | AuthError::Json(_) => ErrorKind::Other,
        }
    }
}

impl From<RefreshError> for AuthError {
    fn from(err: RefreshError) -> Self {
        match err {
            // The refresh token itself was refused: nothing left to recover with
            RefreshError::Rejected(e) if e.is_unauthorized() => AuthError::SessionExpired,
            other => AuthError::Refresh(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycle_api::ErrorBody;

    #[test]
    fn rejected_refresh_token_is_a_session_expiry() {
        let err: AuthError =
            RefreshError::Rejected(CycleApiError::Unauthorized(ErrorBody::new("revoked"))).into();
        assert!(matches!(err, AuthError::SessionExpired));
        assert_eq!(err.kind(), ErrorKind::AuthInvalid);
    }

    #[test]
    fn network_failure_during_refresh_keeps_its_kind() {
        let err: AuthError =
            RefreshError::Rejected(CycleApiError::Network("connection reset".into())).into();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn local_failures_are_classified() {
        let ended: AuthError = RefreshError::SessionEnded.into();
        assert_eq!(ended.kind(), ErrorKind::AuthInvalid);
        assert_eq!(
            AuthError::TokenStorage("read-only filesystem".into()).kind(),
            ErrorKind::Other
        );
    }
}
