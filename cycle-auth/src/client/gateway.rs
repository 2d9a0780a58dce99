use super::session::SessionStore;
use crate::error::{AuthError, RefreshError};
use cycle_api::endpoints::auth::RefreshToken;
use cycle_api::{AuthScheme, Endpoint, Transport};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// A request is replayed at most this many times after a refresh.
const MAX_REPLAYS: u8 = 1;

type RefreshOutcome = Result<String, RefreshError>;

#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
    /// How long a queued request waits on someone else's refresh. `None` waits indefinitely.
    pub queue_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing,
}

/// Refresh flag and wait set. Only ever touched under one lock, never across an await.
struct Coordinator {
    state: RefreshState,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

enum Ticket {
    Refresher,
    Queued(oneshot::Receiver<RefreshOutcome>),
}

/// Attaches credentials to outbound requests and recovers from expired access tokens.
///
/// A 401 on an access-token request triggers a refresh. Only one refresh is
/// ever in flight: whoever sees the first 401 performs it, later 401s queue
/// behind it and receive its outcome. Each caller then replays its own
/// request once with the new token. A second 401, or a 401 on the refresh
/// call itself, ends the session.
pub struct Gateway<T> {
    transport: T,
    session: Arc<SessionStore>,
    options: GatewayOptions,
    coordinator: Mutex<Coordinator>,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, session: Arc<SessionStore>) -> Self {
        Self::with_options(transport, session, GatewayOptions::default())
    }

    pub fn with_options(transport: T, session: Arc<SessionStore>, options: GatewayOptions) -> Self {
        Self {
            transport,
            session,
            options,
            coordinator: Mutex::new(Coordinator {
                state: RefreshState::Idle,
                waiters: Vec::new(),
            }),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().state == RefreshState::Refreshing
    }

    /// Requests currently suspended on a refresh.
    pub fn queued_requests(&self) -> usize {
        self.lock().waiters.len()
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, AuthError>
    where
        R: Endpoint,
    {
        match R::AUTH {
            AuthScheme::Public => self
                .transport
                .send(request, None)
                .await
                .map_err(AuthError::from),
            AuthScheme::Refresh => self.send_with_refresh_token(request).await,
            AuthScheme::Access => self.send_with_access_token(request).await,
        }
    }

    async fn send_with_refresh_token<R>(&self, request: R) -> Result<R::Response, AuthError>
    where
        R: Endpoint,
    {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(RefreshError::MissingToken.into());
        };

        match self.transport.send(request, Some(&refresh_token)).await {
            Err(e) if e.is_unauthorized() => {
                self.end_session("refresh token rejected");
                Err(AuthError::SessionExpired)
            }
            other => other.map_err(AuthError::from),
        }
    }

    async fn send_with_access_token<R>(&self, request: R) -> Result<R::Response, AuthError>
    where
        R: Endpoint,
    {
        let mut token = self.session.access_token();
        let mut replays = 0;

        loop {
            match self.transport.send(request.clone(), token.as_deref()).await {
                Err(e) if e.is_unauthorized() => {
                    if replays >= MAX_REPLAYS {
                        tracing::warn!(endpoint = %request.endpoint(), "Replay rejected after refresh");
                        self.end_session("access token rejected after refresh");
                        return Err(AuthError::SessionExpired);
                    }
                    replays += 1;
                    token = match self.session.access_token() {
                        // Rotated by a refresh that finished after this request went out
                        Some(current) if token.as_deref() != Some(current.as_str()) => {
                            tracing::debug!("Access token already refreshed, replaying");
                            Some(current)
                        }
                        _ => Some(self.refreshed_token().await?),
                    };
                }
                other => return other.map_err(AuthError::from),
            }
        }
    }

    /// Performs the refresh, or waits for the one already running.
    async fn refreshed_token(&self) -> RefreshOutcome {
        match self.acquire_or_enqueue() {
            Ticket::Refresher => {
                let lease = RefreshLease {
                    gateway: self,
                    completed: false,
                };
                let outcome = self.run_refresh().await;
                lease.complete(&outcome);
                outcome
            }
            Ticket::Queued(receiver) => self.wait_for_refresh(receiver).await,
        }
    }

    fn acquire_or_enqueue(&self) -> Ticket {
        let mut coordinator = self.lock();
        match coordinator.state {
            RefreshState::Idle => {
                coordinator.state = RefreshState::Refreshing;
                Ticket::Refresher
            }
            RefreshState::Refreshing => {
                let (sender, receiver) = oneshot::channel();
                coordinator.waiters.push(sender);
                tracing::debug!(queued = coordinator.waiters.len(), "Queued behind token refresh");
                Ticket::Queued(receiver)
            }
        }
    }

    async fn run_refresh(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.session.refresh_token() else {
            tracing::warn!("Access token rejected and no refresh token stored");
            self.end_session("missing refresh token");
            return Err(RefreshError::MissingToken);
        };

        tracing::info!("Access token rejected, refreshing");
        match self
            .transport
            .send(RefreshToken::new(), Some(&refresh_token))
            .await
        {
            Ok(refreshed) => {
                if !self
                    .session
                    .replace_access_token_if(&refresh_token, &refreshed.access_token)
                {
                    tracing::info!("Session ended during token refresh, discarding new token");
                    return Err(RefreshError::SessionEnded);
                }
                tracing::info!("Access token refreshed");
                Ok(refreshed.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.end_session("token refresh failed");
                Err(RefreshError::Rejected(e))
            }
        }
    }

    async fn wait_for_refresh(&self, receiver: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
        let received = match self.options.queue_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!(?limit, "Gave up waiting for token refresh");
                    return Err(RefreshError::TimedOut);
                }
            },
            None => receiver.await,
        };

        received.unwrap_or(Err(RefreshError::Abandoned))
    }

    /// Back to idle, then hand the outcome to everyone who queued.
    fn finish_refresh(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut coordinator = self.lock();
            coordinator.state = RefreshState::Idle;
            std::mem::take(&mut coordinator.waiters)
        };

        tracing::debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Releasing queued requests");
        for waiter in waiters {
            // A waiter that timed out has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
    }

    fn end_session(&self, reason: &str) {
        tracing::warn!(reason, "Logging out");
        self.session.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Coordinator> {
        self.coordinator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the refresher. Dropping it unfinished releases the waiters with `Abandoned`.
struct RefreshLease<'a, T: Transport> {
    gateway: &'a Gateway<T>,
    completed: bool,
}

impl<T: Transport> RefreshLease<'_, T> {
    fn complete(mut self, outcome: &RefreshOutcome) {
        self.completed = true;
        self.gateway.finish_refresh(outcome);
    }
}

impl<T: Transport> Drop for RefreshLease<'_, T> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("Token refresh dropped before completing");
            self.gateway.finish_refresh(&Err(RefreshError::Abandoned));
        }
    }
}
