use crate::{CycleApiError, Endpoint, ErrorBody, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tower_api_client::RequestData;

/// What the mock saw for one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub endpoint: String,
    pub bearer: Option<String>,
    pub query: Option<Value>,
    pub body: Option<Value>,
}

impl RecordedCall {
    fn capture<R: Endpoint>(request: &R, bearer: Option<&str>) -> Self {
        let (query, body) = match request.data() {
            RequestData::Query(query) => (serde_json::to_value(query).ok(), None),
            RequestData::Json(body) => (None, serde_json::to_value(body).ok()),
            _ => (None, None),
        };

        Self {
            method: R::METHOD.to_string(),
            endpoint: request.endpoint().into_owned(),
            bearer: bearer.map(str::to_string),
            query,
            body,
        }
    }
}

type Responder = dyn Fn(&RecordedCall) -> Result<Value, CycleApiError> + Send + Sync;

/// Scripted transport for tests (no network)
///
/// Every call is recorded before it is answered, so assertions can count
/// attempts per endpoint. An endpoint can be held behind a gate to keep its
/// calls in flight until the test releases them.
pub struct MockTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RecordedCall) -> Result<Value, CycleApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold every call to `endpoint` until a permit is added to the returned gate.
    pub fn hold(&self, endpoint: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }
}

impl Transport for MockTransport {
    async fn send<R>(&self, request: R, bearer: Option<&str>) -> Result<R::Response, CycleApiError>
    where
        R: Endpoint,
    {
        let call = RecordedCall::capture(&request, bearer);
        self.calls.lock().unwrap().push(call.clone());

        let gate = self.gates.lock().unwrap().get(&call.endpoint).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let value = (self.responder)(&call)?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, CycleApiError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Ok(decoded),
        // No-content replies: accept whichever empty shape the type wants
        Err(_) if value.is_null() => serde_json::from_value(Value::Object(Default::default()))
            .map_err(|e| CycleApiError::Decode(e.to_string())),
        Err(e) => Err(CycleApiError::Decode(e.to_string())),
    }
}

/// The 401 a server sends for an expired or revoked token.
pub fn unauthorized() -> CycleApiError {
    CycleApiError::from_status(
        401,
        r#"{"message": "Token has expired", "detail": {"error": "token_expired"}}"#,
    )
}

/// An error reply with the usual `{message, detail}` body.
pub fn reply_error(status: u16, message: &str) -> CycleApiError {
    let body = ErrorBody {
        message: message.to_string(),
        detail: serde_json::json!({ "error": message }),
    };
    CycleApiError::from_status(status, &serde_json::to_string(&body).unwrap_or_default())
}
