//! Cycle statistics and predictions computed from the period history.
//!
//! Everything here is a pure function of the records and an explicit
//! `today`; dates are whole days with no timezone.

mod context;
mod prediction;
mod stats;

pub use context::cycle_context;
pub use prediction::{ovulation_window, predicted_next_period};
pub use stats::{cycle_intervals, cycle_stats, period_stats};

use chrono::NaiveDate;
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::reports::{CycleContext, CycleStats, OvulationWindow, PeriodStats};
use serde::{Deserialize, Serialize};

/// Days from ovulation to the next period.
pub const DEFAULT_LUTEAL_PHASE_DAYS: i64 = 14;
/// Length of the fertile window, ending on the ovulation day.
pub const DEFAULT_FERTILE_WINDOW_DAYS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub luteal_phase_days: i64,
    pub fertile_window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            luteal_phase_days: DEFAULT_LUTEAL_PHASE_DAYS,
            fertile_window_days: DEFAULT_FERTILE_WINDOW_DAYS,
        }
    }
}

/// Every figure the tracker shows, computed for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub today: NaiveDate,
    pub period_stats: PeriodStats,
    pub cycle_stats: CycleStats,
    pub predicted_start: Option<NaiveDate>,
    pub ovulation: Option<OvulationWindow>,
    pub context: Option<CycleContext>,
}

impl CycleReport {
    pub fn compute(periods: &[Period], today: NaiveDate, config: &AnalyticsConfig) -> Self {
        let cycle_stats = cycle_stats(periods);
        let predicted_start = predicted_next_period(periods, &cycle_stats);

        Self {
            today,
            period_stats: period_stats(periods),
            ovulation: predicted_start.and_then(|start| ovulation_window(start, config)),
            predicted_start,
            cycle_stats,
            context: cycle_context(periods, today, config),
        }
    }
}

/// Two decimal places, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, period};
    use cycle_api::endpoints::reports::WaitingContext;

    fn three_closed_periods() -> Vec<Period> {
        vec![
            period(1, "2024-01-01", Some("2024-01-05")),
            period(2, "2024-01-29", Some("2024-02-03")),
            period(3, "2024-02-25", Some("2024-03-01")),
        ]
    }

    #[test]
    fn empty_history_has_no_figures() {
        let report = CycleReport::compute(&[], date("2024-03-01"), &AnalyticsConfig::default());

        assert_eq!(report.period_stats, PeriodStats::default());
        assert_eq!(report.cycle_stats, CycleStats::default());
        assert_eq!(report.predicted_start, None);
        assert_eq!(report.ovulation, None);
        assert_eq!(report.context, None);
    }

    #[test]
    fn full_report_for_three_cycles() {
        let report = CycleReport::compute(
            &three_closed_periods(),
            date("2024-03-06"),
            &AnalyticsConfig::default(),
        );

        assert_eq!(report.predicted_start, Some(date("2024-03-24")));
        let ovulation = report.ovulation.unwrap();
        assert_eq!(ovulation.ovulation_date, date("2024-03-10"));
        assert_eq!(ovulation.fertile_window_start, date("2024-03-05"));
        assert_eq!(ovulation.fertile_window_end, date("2024-03-10"));

        let Some(CycleContext::Waiting(waiting)) = report.context else {
            panic!("expected a waiting context");
        };
        assert_eq!(waiting.cycle_day, 11);
        assert_eq!(waiting.days_until_next_period, Some(18));
        assert!(waiting.is_in_fertile_window);
        assert!(!waiting.is_today_ovulation);
    }

    #[test]
    fn configured_phase_lengths_shift_the_window() {
        let config = AnalyticsConfig {
            luteal_phase_days: 12,
            fertile_window_days: 3,
        };
        let report = CycleReport::compute(&three_closed_periods(), date("2024-03-12"), &config);

        let ovulation = report.ovulation.unwrap();
        assert_eq!(ovulation.ovulation_date, date("2024-03-12"));
        assert_eq!(ovulation.fertile_window_start, date("2024-03-10"));

        let Some(CycleContext::Waiting(WaitingContext {
            is_today_ovulation, ..
        })) = report.context
        else {
            panic!("expected a waiting context");
        };
        assert!(is_today_ovulation);
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(42.857142), 42.86);
        assert_eq!(round2(27.5), 27.5);
        assert_eq!(round2(0.125), 0.13);
    }
}
