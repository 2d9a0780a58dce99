use super::AnalyticsConfig;
use chrono::{NaiveDate, TimeDelta};
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::reports::{CycleStats, OvulationWindow};

/// Latest start plus the average cycle length rounded to whole days.
pub fn predicted_next_period(periods: &[Period], cycle_stats: &CycleStats) -> Option<NaiveDate> {
    let average = cycle_stats.average_length?;
    let latest_start = periods.iter().map(|p| p.start_date).max()?;
    latest_start.checked_add_signed(TimeDelta::try_days(average.round() as i64)?)
}

/// Ovulation falls a luteal phase before the predicted start; the fertile
/// window ends on it, both ends inclusive.
pub fn ovulation_window(predicted_start: NaiveDate, config: &AnalyticsConfig) -> Option<OvulationWindow> {
    let ovulation_date =
        predicted_start.checked_sub_signed(TimeDelta::try_days(config.luteal_phase_days)?)?;
    let fertile_window_start = ovulation_date
        .checked_sub_signed(TimeDelta::try_days((config.fertile_window_days - 1).max(0))?)?;

    Some(OvulationWindow {
        ovulation_date,
        fertile_window_start,
        fertile_window_end: ovulation_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::cycle_stats;
    use crate::testing::{date, period};

    #[test]
    fn predicts_from_the_latest_start() {
        let periods = vec![
            period(1, "2024-01-01", Some("2024-01-05")),
            period(2, "2024-01-29", Some("2024-02-03")),
            period(3, "2024-02-25", Some("2024-03-01")),
        ];

        // 27.5 rounds up to 28 days after 2024-02-25
        let predicted = predicted_next_period(&periods, &cycle_stats(&periods));
        assert_eq!(predicted, Some(date("2024-03-24")));
    }

    #[test]
    fn no_prediction_without_an_average() {
        let periods = vec![period(1, "2024-01-01", None)];
        assert_eq!(predicted_next_period(&periods, &cycle_stats(&periods)), None);
        assert_eq!(predicted_next_period(&[], &CycleStats::default()), None);
    }

    #[test]
    fn fertile_window_is_six_days_ending_on_ovulation() {
        let window = ovulation_window(date("2024-03-24"), &AnalyticsConfig::default()).unwrap();

        assert_eq!(window.ovulation_date, date("2024-03-10"));
        assert_eq!(window.fertile_window_start, date("2024-03-05"));
        assert_eq!(window.fertile_window_end, date("2024-03-10"));

        assert!(window.is_fertile(date("2024-03-05")));
        assert!(window.is_fertile(date("2024-03-10")));
        assert!(!window.is_fertile(date("2024-03-04")));
        assert!(!window.is_fertile(date("2024-03-11")));
    }

    #[test]
    fn out_of_range_offsets_have_no_window() {
        let config = AnalyticsConfig {
            luteal_phase_days: i64::MAX,
            ..Default::default()
        };
        assert_eq!(ovulation_window(date("2024-03-24"), &config), None);

        let config = AnalyticsConfig {
            luteal_phase_days: 400_000_000,
            ..Default::default()
        };
        assert_eq!(ovulation_window(date("2024-03-24"), &config), None);
    }

    #[test]
    fn single_day_window() {
        let config = AnalyticsConfig {
            fertile_window_days: 1,
            ..Default::default()
        };
        let window = ovulation_window(date("2024-03-24"), &config).unwrap();
        assert_eq!(window.fertile_window_start, window.ovulation_date);
    }
}
