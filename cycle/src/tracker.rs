use crate::analytics::{AnalyticsConfig, CycleReport};
use crate::repository::PeriodRepositoryClient;
use chrono::{Local, NaiveDate};
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::PeriodId;
use cycle_api::Transport;
use cycle_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Period {0} is still open; end it before starting a new one")]
    PeriodAlreadyOpen(PeriodId),

    #[error("There is no open period to end")]
    NoOpenPeriod,
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Writes period changes, then recomputes the report over the full history.
///
/// Concurrent edits from another client are not reconciled: every
/// operation works from the history as fetched at its start.
pub struct Tracker<T> {
    periods: PeriodRepositoryClient<T>,
    config: AnalyticsConfig,
    clock: Clock,
}

impl<T: Transport> Tracker<T> {
    pub fn new(periods: PeriodRepositoryClient<T>, config: AnalyticsConfig) -> Self {
        Self {
            periods,
            config,
            clock: Box::new(|| Local::now().date_naive()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn periods(&self) -> &PeriodRepositoryClient<T> {
        &self.periods
    }

    pub async fn history(&self) -> Result<Vec<Period>, TrackerError> {
        Ok(self.periods.fetch_all().await?)
    }

    pub async fn refresh(&self) -> Result<CycleReport, TrackerError> {
        self.report_for(self.today()).await
    }

    /// The report as it would read on `day`.
    pub async fn report_for(&self, day: NaiveDate) -> Result<CycleReport, TrackerError> {
        let history = self.history().await?;
        Ok(CycleReport::compute(&history, day, &self.config))
    }

    /// Opens a period. Only one may be open at a time.
    pub async fn start_period(&self, start_date: NaiveDate) -> Result<CycleReport, TrackerError> {
        let history = self.history().await?;
        if let Some(open) = current_period(&history) {
            return Err(TrackerError::PeriodAlreadyOpen(open.id));
        }

        let created = self.periods.create(start_date).await?;
        tracing::info!("Started period {} on {}", created.id, start_date);
        self.refresh().await
    }

    /// Closes the open period on `end_date`.
    pub async fn end_period(&self, end_date: NaiveDate) -> Result<CycleReport, TrackerError> {
        let history = self.history().await?;
        let open = current_period(&history).ok_or(TrackerError::NoOpenPeriod)?;

        self.periods.update(open.id, end_date).await?;
        tracing::info!("Ended period {} on {}", open.id, end_date);
        self.refresh().await
    }

    pub async fn delete_period(&self, period_id: PeriodId) -> Result<CycleReport, TrackerError> {
        self.periods.delete(period_id).await?;
        tracing::info!("Deleted period {}", period_id);
        self.refresh().await
    }
}

/// The open period that started last.
fn current_period(history: &[Period]) -> Option<&Period> {
    history
        .iter()
        .filter(|p| p.is_open())
        .max_by_key(|p| p.chronological_key())
}
