use super::PeriodId;
use crate::Endpoint;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use tower_api_client::Request;

// Common

/// Statistics over closed periods. Every figure is absent when `count` is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub count: usize,
    pub average_duration: Option<f64>,
    pub max_duration: Option<i64>,
    pub min_duration: Option<i64>,
}

/// Statistics over start-to-start cycle intervals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub count: usize,
    pub average_length: Option<f64>,
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedPeriod {
    pub predicted_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationWindow {
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

impl OvulationWindow {
    /// Inclusive on both ends.
    pub fn is_fertile(&self, day: NaiveDate) -> bool {
        self.fertile_window_start <= day && day <= self.fertile_window_end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertileWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Where today falls relative to the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleContext {
    /// An open period exists.
    Period {
        current_period_id: PeriodId,
        days_running: i64,
    },
    /// Between periods.
    Waiting(WaitingContext),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitingContext {
    pub cycle_day: i64,
    pub cycle_length: Option<f64>,
    pub progress_percent: Option<f64>,
    pub predicted_start: Option<NaiveDate>,
    pub days_until_next_period: Option<i64>,
    pub ovulation_date: Option<NaiveDate>,
    #[serde(default)]
    pub fertile_window: FertileWindow,
    pub is_today_ovulation: bool,
    pub is_in_fertile_window: bool,
}

impl CycleContext {
    pub fn is_period(&self) -> bool {
        matches!(self, CycleContext::Period { .. })
    }
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetPeriodStats;

impl Request for GetPeriodStats {
    type Data = ();
    type Response = PeriodStats;

    fn endpoint(&self) -> Cow<'_, str> {
        "/reports/period-stats".into()
    }
}

impl Endpoint for GetPeriodStats {}

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetCycleStats;

impl Request for GetCycleStats {
    type Data = ();
    type Response = CycleStats;

    fn endpoint(&self) -> Cow<'_, str> {
        "/reports/cycle-stats".into()
    }
}

impl Endpoint for GetCycleStats {}

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetPredictedNextPeriod;

impl Request for GetPredictedNextPeriod {
    type Data = ();
    type Response = PredictedPeriod;

    fn endpoint(&self) -> Cow<'_, str> {
        "/reports/predicted-next-period".into()
    }
}

impl Endpoint for GetPredictedNextPeriod {}

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetOvulationWindow;

impl Request for GetOvulationWindow {
    type Data = ();
    type Response = OvulationWindowResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/reports/ovulation-window".into()
    }
}

impl Endpoint for GetOvulationWindow {}

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetCycleContext;

impl Request for GetCycleContext {
    type Data = ();
    type Response = CycleContextResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/reports/cycle-context".into()
    }
}

impl Endpoint for GetCycleContext {}

// Responses

/// The server sends nulls when it cannot predict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationWindowResponse {
    pub ovulation_date: Option<NaiveDate>,
    pub fertile_window_start: Option<NaiveDate>,
    pub fertile_window_end: Option<NaiveDate>,
}

impl OvulationWindowResponse {
    pub fn into_window(self) -> Option<OvulationWindow> {
        Some(OvulationWindow {
            ovulation_date: self.ovulation_date?,
            fertile_window_start: self.fertile_window_start?,
            fertile_window_end: self.fertile_window_end?,
        })
    }
}

/// The server answers `{}` when there is no history at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CycleContextResponse(pub Option<CycleContext>);

impl<'de> Deserialize<'de> for CycleContextResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let empty = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Ok(Self(None));
        }
        serde_json::from_value(value)
            .map(|context| Self(Some(context)))
            .map_err(serde::de::Error::custom)
    }
}
