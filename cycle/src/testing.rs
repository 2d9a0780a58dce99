use crate::app::App;
use crate::config::AppConfig;
use chrono::NaiveDate;
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::{PeriodId, UserId};
use cycle_api::testing::{reply_error, unauthorized, MockTransport, RecordedCall};
use cycle_api::CycleApiError;
use cycle_auth::{Gateway, MemoryCredentialStorage, SessionStore, StoredCredentials};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const PASSWORD: &str = "correct horse";
const REFRESH_TOKEN: &str = "refresh-token";

/// Parse a `YYYY-MM-DD` literal
pub fn date(value: &str) -> NaiveDate {
    value.parse().unwrap_or_else(|_| panic!("bad test date {value}"))
}

/// A period record as the server would return it. The service counts both
/// the first and the last day in `duration`.
pub fn period(id: i64, start: &str, end: Option<&str>) -> Period {
    let start_date = date(start);
    let end_date = end.map(date);
    Period {
        id: PeriodId::new(id),
        user_id: UserId::from(1),
        start_date,
        end_date,
        duration: end_date.map(|end| end.signed_duration_since(start_date).num_days() + 1),
        created_at: start_date.and_hms_opt(8, 0, 0).unwrap(),
    }
}

struct ServerState {
    periods: Vec<Period>,
    next_id: i64,
    reports: HashMap<String, Value>,
    token_generation: u32,
    requests: Vec<String>,
}

impl ServerState {
    fn access_token(&self) -> String {
        format!("access-{}", self.token_generation)
    }
}

/// In-memory tracker service
///
/// Bearer tokens are checked on every call, refresh rotates the access token,
/// and period updates are validated the way the service validates them.
///
/// Reports are not computed. `/reports/*` answers with whatever fixture was
/// installed by [`FakeServer::set_report`], or with the empty-account answer.
#[derive(Clone)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::with_periods(Vec::new())
    }

    pub fn with_periods(periods: Vec<Period>) -> Self {
        let next_id = periods.iter().map(|p| p.id.inner()).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(ServerState {
                periods,
                next_id,
                reports: empty_reports(),
                token_generation: 1,
                requests: Vec::new(),
            })),
        }
    }

    /// Canned body for a report endpoint such as `/reports/cycle-stats`.
    pub fn set_report(&self, endpoint: &str, body: Value) {
        self.lock().reports.insert(endpoint.to_string(), body);
    }

    pub fn periods(&self) -> Vec<Period> {
        let mut periods = self.lock().periods.clone();
        periods.sort_by_key(Period::chronological_key);
        periods
    }

    /// Invalidate the current access token, as if it had expired.
    pub fn expire_access_token(&self) {
        self.lock().token_generation += 1;
    }

    /// Number of requests received for `endpoint`.
    pub fn requests_to(&self, endpoint: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|e| e.as_str() == endpoint)
            .count()
    }

    pub fn transport(&self) -> MockTransport {
        let server = self.clone();
        MockTransport::new(move |call| server.handle(call))
    }

    /// Credentials currently accepted by the server.
    pub fn credentials(&self) -> StoredCredentials {
        StoredCredentials::new(self.lock().access_token(), REFRESH_TOKEN)
    }

    pub fn logged_in_session(&self) -> Arc<SessionStore> {
        let session = SessionStore::new(MemoryCredentialStorage::with_credentials(self.credentials()));
        session.rehydrate();
        Arc::new(session)
    }

    pub fn logged_in_gateway(&self) -> Arc<Gateway<MockTransport>> {
        Arc::new(Gateway::new(self.transport(), self.logged_in_session()))
    }

    /// A full client against this server, already logged in, with a fixed clock.
    pub fn app(&self, today: NaiveDate) -> App<MockTransport> {
        App::with_transport(self.transport(), self.logged_in_session(), &AppConfig::default())
            .with_clock(move || today)
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    fn handle(&self, call: &RecordedCall) -> Result<Value, CycleApiError> {
        let mut state = self.lock();
        state.requests.push(call.endpoint.clone());

        let method = call.method.as_str();
        let endpoint = call.endpoint.as_str();
        match (method, endpoint) {
            ("POST", "/auth/login") => {
                let password = call.body.as_ref().and_then(|b| b["password"].as_str());
                if password == Some(PASSWORD) {
                    Ok(json!({"access_token": state.access_token(), "refresh_token": REFRESH_TOKEN}))
                } else {
                    Err(CycleApiError::from_status(
                        401,
                        r#"{"message": "Invalid credentials", "detail": {"error": "Invalid credentials"}}"#,
                    ))
                }
            }
            ("POST", "/auth/register") => Ok(user()),
            ("POST", "/auth/refresh") => {
                if call.bearer.as_deref() != Some(REFRESH_TOKEN) {
                    return Err(unauthorized());
                }
                state.token_generation += 1;
                Ok(json!({"access_token": state.access_token()}))
            }
            _ if call.bearer != Some(state.access_token()) => Err(unauthorized()),
            ("GET", "/users/me") => Ok(user()),
            ("POST", "/users/me/change-password") => Ok(Value::Null),
            ("DELETE", "/users/me") => {
                state.periods.clear();
                Ok(Value::Null)
            }
            ("GET", "/periods") => Ok(list_page(&state.periods, call.query.as_ref())),
            ("POST", "/periods") => {
                let start = body_date(call, "start_date")?;
                let created = period(state.next_id, &start.to_string(), None);
                state.next_id += 1;
                state.periods.push(created.clone());
                to_json(&created)
            }
            ("GET", path) if path.starts_with("/reports/") => state
                .reports
                .get(path)
                .cloned()
                .ok_or_else(|| reply_error(404, "Not found")),
            (_, path) if path.starts_with("/periods/") => {
                let id: i64 = path["/periods/".len()..]
                    .parse()
                    .map_err(|_| reply_error(404, "Not found"))?;
                let index = state
                    .periods
                    .iter()
                    .position(|p| p.id.inner() == id)
                    .ok_or_else(|| reply_error(404, &format!("Period with ID {id} not found for this user.")))?;

                match method {
                    "GET" => to_json(&state.periods[index]),
                    "PUT" => {
                        let end = body_date(call, "end_date")?;
                        let record = &mut state.periods[index];
                        if record.end_date.is_some() {
                            return Err(reply_error(400, &format!("Period {id} already has an end date.")));
                        }
                        if end < record.start_date {
                            return Err(reply_error(400, "End date cannot be before start date."));
                        }
                        *record = period(id, &record.start_date.to_string(), Some(&end.to_string()));
                        to_json(&state.periods[index])
                    }
                    "DELETE" => {
                        state.periods.remove(index);
                        Ok(Value::Null)
                    }
                    _ => Err(reply_error(405, "Method not allowed")),
                }
            }
            _ => Err(reply_error(404, "Not found")),
        }
    }
}

impl Default for FakeServer {
    fn default() -> Self {
        Self::new()
    }
}

/// What the service answers for an account without history.
fn empty_reports() -> HashMap<String, Value> {
    HashMap::from([
        (
            "/reports/period-stats".to_string(),
            json!({"count": 0, "average_duration": null, "max_duration": null, "min_duration": null}),
        ),
        (
            "/reports/cycle-stats".to_string(),
            json!({"count": 0, "average_length": null, "max_length": null, "min_length": null}),
        ),
        (
            "/reports/predicted-next-period".to_string(),
            json!({"predicted_start": null}),
        ),
        (
            "/reports/ovulation-window".to_string(),
            json!({"ovulation_date": null, "fertile_window_start": null, "fertile_window_end": null}),
        ),
        ("/reports/cycle-context".to_string(), json!({})),
    ])
}

fn user() -> Value {
    json!({
        "id": 1,
        "username": "ada",
        "email": "ada@example.com",
        "created_at": "2024-01-01T09:30:00"
    })
}

/// Newest first, paginated like the service (pages past the end are empty).
fn list_page(periods: &[Period], query: Option<&Value>) -> Value {
    let number = |key: &str, default: u64| {
        query
            .and_then(|q| q[key].as_u64())
            .unwrap_or(default)
            .max(1) as usize
    };
    let page = number("page", 1);
    let per_page = number("per_page", 10);

    let mut newest_first = periods.to_vec();
    newest_first.sort_by_key(|p| std::cmp::Reverse(p.chronological_key()));
    let items: Vec<Period> = newest_first
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    json!(items)
}

fn body_date(call: &RecordedCall, field: &str) -> Result<NaiveDate, CycleApiError> {
    call.body
        .as_ref()
        .and_then(|b| b[field].as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| reply_error(422, &format!("{field} is required")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CycleApiError> {
    serde_json::to_value(value).map_err(|e| CycleApiError::Decode(e.to_string()))
}
