use super::round2;
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::reports::{CycleStats, PeriodStats};
use itertools::Itertools;

/// Duration statistics over closed periods. Open periods are ignored.
pub fn period_stats(periods: &[Period]) -> PeriodStats {
    let durations: Vec<i64> = periods.iter().filter_map(Period::duration_days).collect();
    let Some(summary) = Summary::of(&durations) else {
        return PeriodStats::default();
    };

    PeriodStats {
        count: durations.len(),
        average_duration: Some(summary.average),
        max_duration: Some(summary.max),
        min_duration: Some(summary.min),
    }
}

/// Days between consecutive start dates, oldest first.
///
/// Open periods count, since only their start matters. Non-positive gaps
/// (two records on the same day) are dropped.
pub fn cycle_intervals(periods: &[Period]) -> Vec<i64> {
    periods
        .iter()
        .map(|p| p.start_date)
        .sorted()
        .tuple_windows()
        .map(|(current, next)| next.signed_duration_since(current).num_days())
        .filter(|length| *length > 0)
        .collect()
}

pub fn cycle_stats(periods: &[Period]) -> CycleStats {
    let intervals = cycle_intervals(periods);
    let Some(summary) = Summary::of(&intervals) else {
        return CycleStats::default();
    };

    CycleStats {
        count: intervals.len(),
        average_length: Some(summary.average),
        max_length: Some(summary.max),
        min_length: Some(summary.min),
    }
}

struct Summary {
    average: f64,
    max: i64,
    min: i64,
}

impl Summary {
    fn of(values: &[i64]) -> Option<Self> {
        let (min, max) = values.iter().copied().minmax().into_option()?;
        let average = values.iter().sum::<i64>() as f64 / values.len() as f64;
        Some(Self {
            average: round2(average),
            max,
            min,
        })
    }
}
