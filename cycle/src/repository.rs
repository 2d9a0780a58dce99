use chrono::NaiveDate;
use cycle_api::endpoints::periods::{Period, DEFAULT_PAGE_SIZE};
use cycle_api::endpoints::PeriodId;
use cycle_api::{CycleApiError, Request, Transport};
use cycle_auth::{AuthError, Gateway};
use std::sync::Arc;

/// Upper bound on pages walked by [`PeriodRepositoryClient::fetch_all`].
const MAX_PAGES: u32 = 1000;

/// Period records on the server. Errors are passed through from the gateway unchanged.
pub struct PeriodRepositoryClient<T> {
    gateway: Arc<Gateway<T>>,
    page_size: u32,
}

impl<T: Transport> PeriodRepositoryClient<T> {
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self {
            gateway,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used by [`PeriodRepositoryClient::fetch_all`].
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// One page, newest first.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Vec<Period>, AuthError> {
        self.gateway
            .send(Request::periods().list(page, per_page))
            .await
    }

    pub async fn get(&self, period_id: PeriodId) -> Result<Period, AuthError> {
        self.gateway.send(Request::periods().get(period_id)).await
    }

    pub async fn create(&self, start_date: NaiveDate) -> Result<Period, AuthError> {
        self.gateway
            .send(Request::periods().create(start_date))
            .await
    }

    pub async fn update(&self, period_id: PeriodId, end_date: NaiveDate) -> Result<Period, AuthError> {
        self.gateway
            .send(Request::periods().update(period_id, end_date))
            .await
    }

    pub async fn delete(&self, period_id: PeriodId) -> Result<(), AuthError> {
        self.gateway
            .send(Request::periods().delete(period_id))
            .await?;
        Ok(())
    }

    /// The whole history, oldest first. Pages until the server returns a short page.
    ///
    /// A server that keeps returning full pages is cut off after [`MAX_PAGES`]
    /// with an error rather than a silently truncated history.
    pub async fn fetch_all(&self) -> Result<Vec<Period>, AuthError> {
        let mut periods = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list(page, self.page_size).await?;
            let last_page = batch.len() < self.page_size as usize;
            periods.extend(batch);
            if last_page {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!("Period listing still full after {} pages, giving up", page);
                return Err(CycleApiError::Unexpected(format!(
                    "period listing did not end after {} pages",
                    MAX_PAGES
                ))
                .into());
            }
            page += 1;
        }

        tracing::debug!("Fetched {} periods over {} pages", periods.len(), page);
        periods.sort_by_key(Period::chronological_key);
        Ok(periods)
    }
}
