use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_api_client::Error as ApiError;

/// Transport-level failure of a single request.
///
/// `Clone` so one refresh failure can be handed to every request queued behind it.
#[derive(Debug, Clone, Error)]
pub enum CycleApiError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(ErrorBody),

    #[error("({status}) Validation failed: {body}")]
    Validation { status: u16, body: ErrorBody },

    #[error("Not found: {0}")]
    NotFound(ErrorBody),

    #[error("Conflict: {0}")]
    Conflict(ErrorBody),

    #[error("({status}) Server error: {body}")]
    Server { status: u16, body: ErrorBody },

    #[error("Could not decode response: {0}")]
    Decode(String),

    /// Well-formed responses that make no sense together, such as paging that never ends.
    #[error("Unexpected server response: {0}")]
    Unexpected(String),
}

/// Coarse classification of failures surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    /// 401 that was not recovered by a refresh.
    AuthInvalid,
    ValidationFailure,
    NotFound,
    Conflict,
    Server,
    Other,
}

impl CycleApiError {
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        let body = ErrorBody::parse(raw_body);
        match status {
            401 => CycleApiError::Unauthorized(body),
            404 => CycleApiError::NotFound(body),
            409 => CycleApiError::Conflict(body),
            400..=499 => CycleApiError::Validation { status, body },
            _ => CycleApiError::Server { status, body },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CycleApiError::Unauthorized(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CycleApiError::Network(_) => ErrorKind::NetworkFailure,
            CycleApiError::Unauthorized(_) => ErrorKind::AuthInvalid,
            CycleApiError::Validation { .. } => ErrorKind::ValidationFailure,
            CycleApiError::NotFound(_) => ErrorKind::NotFound,
            CycleApiError::Conflict(_) => ErrorKind::Conflict,
            CycleApiError::Server { .. } => ErrorKind::Server,
            CycleApiError::Decode(_) | CycleApiError::Unexpected(_) => ErrorKind::Other,
        }
    }

    /// The structured body returned by the server, if the failure carried one.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            CycleApiError::Unauthorized(body)
            | CycleApiError::NotFound(body)
            | CycleApiError::Conflict(body)
            | CycleApiError::Validation { body, .. }
            | CycleApiError::Server { body, .. } => Some(body),
            CycleApiError::Network(_) | CycleApiError::Decode(_) | CycleApiError::Unexpected(_) => {
                None
            }
        }
    }
}

impl From<ApiError> for CycleApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, detail) | ApiError::ServerError(status, detail) => {
                CycleApiError::from_status(status.as_u16(), &detail)
            }
            e => CycleApiError::Network(e.to_string()),
        }
    }
}

/// Error payload of every non-2xx response: `{message, detail}`.
///
/// `detail` is either a flat field-error map or nested, so it is kept untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detail: Value,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Value::Null,
        }
    }

    /// Lenient parse; a body that is not the structured shape becomes the message.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) if !body.message.is_empty() || !body.detail.is_null() => body,
            _ => ErrorBody::new(raw.trim()),
        }
    }

    /// Every string found in `detail`, depth first, for user-facing messages.
    pub fn detail_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        collect_strings(&self.detail, &mut messages);
        messages
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details = self.detail_messages();
        if details.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} ({})", self.message, details.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_codes_map_to_taxonomy() {
        let body = r#"{"message": "nope", "detail": {"error": "nope"}}"#;
        assert!(CycleApiError::from_status(401, body).is_unauthorized());
        assert_eq!(CycleApiError::from_status(404, body).kind(), ErrorKind::NotFound);
        assert_eq!(CycleApiError::from_status(409, body).kind(), ErrorKind::Conflict);
        assert_eq!(
            CycleApiError::from_status(422, body).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(
            CycleApiError::from_status(400, body).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(CycleApiError::from_status(502, body).kind(), ErrorKind::Server);
    }

    #[test]
    fn flattens_nested_detail() {
        let body = ErrorBody {
            message: "Validation error".to_string(),
            detail: json!({
                "json": {
                    "password": ["Password must be at least 8 characters long."],
                    "email": ["Not a valid email address."]
                }
            }),
        };

        let mut messages = body.detail_messages();
        messages.sort();
        assert_eq!(
            messages,
            vec![
                "Not a valid email address.".to_string(),
                "Password must be at least 8 characters long.".to_string(),
            ]
        );
    }

    #[test]
    fn unstructured_body_becomes_message() {
        let body = ErrorBody::parse("<html>Bad Gateway</html>\n");
        assert_eq!(body.message, "<html>Bad Gateway</html>");
        assert!(body.detail.is_null());
    }
}
