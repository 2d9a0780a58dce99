use crate::config::AppConfig;
use crate::reports::ReportsClient;
use crate::repository::PeriodRepositoryClient;
use crate::tracker::Tracker;
use chrono::NaiveDate;
use cycle_api::{Client, Transport};
use cycle_auth::{AuthClient, AuthError, Gateway, SessionStore};
use std::sync::Arc;

/// Everything the CLI talks to, sharing one gateway and session.
pub struct App<T> {
    pub auth: AuthClient<T>,
    pub tracker: Tracker<T>,
    pub reports: ReportsClient<T>,
}

impl App<Client> {
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let auth = AuthClient::from_settings(&config.auth)?;
        Ok(Self::assemble(auth, config))
    }
}

impl<T: Transport> App<T> {
    pub fn with_transport(transport: T, session: Arc<SessionStore>, config: &AppConfig) -> Self {
        let auth = AuthClient::new(Arc::new(Gateway::new(transport, session)));
        Self::assemble(auth, config)
    }

    fn assemble(auth: AuthClient<T>, config: &AppConfig) -> Self {
        let gateway = auth.gateway().clone();
        let periods =
            PeriodRepositoryClient::new(gateway.clone()).with_page_size(config.periods.page_size);

        Self {
            tracker: Tracker::new(periods, config.analytics),
            reports: ReportsClient::new(gateway),
            auth,
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.tracker = self.tracker.with_clock(clock);
        self
    }
}
