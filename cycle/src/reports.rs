use chrono::NaiveDate;
use cycle_api::endpoints::reports::{CycleContext, CycleStats, OvulationWindow, PeriodStats};
use cycle_api::{Request, Transport};
use cycle_auth::{AuthError, Gateway};
use serde::Serialize;
use std::sync::Arc;

/// The reports as computed by the server, for comparison with the local engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReports {
    pub period_stats: PeriodStats,
    pub cycle_stats: CycleStats,
    pub predicted_start: Option<NaiveDate>,
    pub ovulation: Option<OvulationWindow>,
    pub context: Option<CycleContext>,
}

pub struct ReportsClient<T> {
    gateway: Arc<Gateway<T>>,
}

impl<T: Transport> ReportsClient<T> {
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    pub async fn period_stats(&self) -> Result<PeriodStats, AuthError> {
        self.gateway.send(Request::reports().period_stats()).await
    }

    pub async fn cycle_stats(&self) -> Result<CycleStats, AuthError> {
        self.gateway.send(Request::reports().cycle_stats()).await
    }

    pub async fn predicted_next_period(&self) -> Result<Option<NaiveDate>, AuthError> {
        let prediction = self
            .gateway
            .send(Request::reports().predicted_next_period())
            .await?;
        Ok(prediction.predicted_start)
    }

    pub async fn ovulation_window(&self) -> Result<Option<OvulationWindow>, AuthError> {
        let response = self
            .gateway
            .send(Request::reports().ovulation_window())
            .await?;
        Ok(response.into_window())
    }

    /// `None` when the account has no periods yet.
    pub async fn cycle_context(&self) -> Result<Option<CycleContext>, AuthError> {
        let response = self
            .gateway
            .send(Request::reports().cycle_context())
            .await?;
        Ok(response.0)
    }

    /// Every report at once; the first failure wins.
    pub async fn all(&self) -> Result<ServerReports, AuthError> {
        tracing::info!("Loading server reports");
        let (period_stats, cycle_stats, predicted_start, ovulation, context) = futures::try_join!(
            self.period_stats(),
            self.cycle_stats(),
            self.predicted_next_period(),
            self.ovulation_window(),
            self.cycle_context(),
        )?;

        Ok(ServerReports {
            period_stats,
            cycle_stats,
            predicted_start,
            ovulation,
            context,
        })
    }
}
