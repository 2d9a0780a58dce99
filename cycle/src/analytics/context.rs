use super::{cycle_stats, ovulation_window, predicted_next_period, round2, AnalyticsConfig};
use chrono::NaiveDate;
use cycle_api::endpoints::periods::Period;
use cycle_api::endpoints::reports::{CycleContext, FertileWindow, WaitingContext};

/// Where `today` falls in the cycle, or `None` with no history at all.
///
/// An open period always wins. If the history holds several (it should
/// not), the one that started last is reported.
pub fn cycle_context(
    periods: &[Period],
    today: NaiveDate,
    config: &AnalyticsConfig,
) -> Option<CycleContext> {
    if let Some(open) = periods
        .iter()
        .filter(|p| p.is_open())
        .max_by_key(|p| p.chronological_key())
    {
        return Some(CycleContext::Period {
            current_period_id: open.id,
            days_running: days_between(open.start_date, today),
        });
    }

    let last_start = periods.iter().map(|p| p.start_date).max()?;
    let cycle_day = days_between(last_start, today) + 1;

    let stats = cycle_stats(periods);
    let cycle_length = stats.average_length;
    let predicted_start = predicted_next_period(periods, &stats);
    let window = predicted_start.and_then(|start| ovulation_window(start, config));

    Some(CycleContext::Waiting(WaitingContext {
        cycle_day,
        cycle_length,
        // Not clamped: past 100 means the period is late
        progress_percent: cycle_length
            .filter(|length| *length > 0.0)
            .map(|length| round2(cycle_day as f64 / length * 100.0)),
        predicted_start,
        days_until_next_period: predicted_start.map(|start| days_between(today, start)),
        ovulation_date: window.map(|w| w.ovulation_date),
        fertile_window: FertileWindow {
            start: window.map(|w| w.fertile_window_start),
            end: window.map(|w| w.fertile_window_end),
        },
        is_today_ovulation: window.is_some_and(|w| w.ovulation_date == today),
        is_in_fertile_window: window.is_some_and(|w| w.is_fertile(today)),
    }))
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, period};
    use cycle_api::endpoints::PeriodId;

    fn waiting(context: Option<CycleContext>) -> WaitingContext {
        match context {
            Some(CycleContext::Waiting(waiting)) => waiting,
            other => panic!("expected a waiting context, got {:?}", other),
        }
    }

    #[test]
    fn no_history_no_context() {
        assert_eq!(cycle_context(&[], date("2024-03-01"), &AnalyticsConfig::default()), None);
    }

    #[test]
    fn open_period_counts_days_running() {
        let periods = vec![
            period(1, "2024-01-01", Some("2024-01-05")),
            period(2, "2024-02-25", None),
        ];

        let context = cycle_context(&periods, date("2024-02-28"), &AnalyticsConfig::default());

        assert_eq!(
            context,
            Some(CycleContext::Period {
                current_period_id: PeriodId::new(2),
                days_running: 3,
            })
        );
        assert!(context.unwrap().is_period());
    }

    #[test]
    fn latest_open_period_wins() {
        let periods = vec![
            period(7, "2024-02-25", None),
            period(4, "2024-01-29", None),
        ];

        let context = cycle_context(&periods, date("2024-02-25"), &AnalyticsConfig::default());
        assert_eq!(
            context,
            Some(CycleContext::Period {
                current_period_id: PeriodId::new(7),
                days_running: 0,
            })
        );
    }

    #[test]
    fn single_closed_period_has_no_prediction() {
        let periods = vec![period(1, "2024-02-25", Some("2024-03-01"))];

        let context = waiting(cycle_context(
            &periods,
            date("2024-03-06"),
            &AnalyticsConfig::default(),
        ));

        assert_eq!(context.cycle_day, 11);
        assert_eq!(context.cycle_length, None);
        assert_eq!(context.progress_percent, None);
        assert_eq!(context.predicted_start, None);
        assert_eq!(context.days_until_next_period, None);
        assert_eq!(context.fertile_window, FertileWindow::default());
        assert!(!context.is_today_ovulation);
        assert!(!context.is_in_fertile_window);
    }

    #[test]
    fn late_period_runs_past_one_hundred_percent() {
        let periods = vec![
            period(1, "2024-01-01", Some("2024-01-05")),
            period(2, "2024-01-29", Some("2024-02-02")),
        ];

        // Predicted 2024-02-26, five days overdue
        let context = waiting(cycle_context(
            &periods,
            date("2024-03-02"),
            &AnalyticsConfig::default(),
        ));

        assert_eq!(context.cycle_day, 34);
        assert_eq!(context.days_until_next_period, Some(-5));
        assert_eq!(context.progress_percent, Some(121.43));
        assert!(!context.is_in_fertile_window);
    }

    #[test]
    fn ovulation_day_is_flagged() {
        let periods = vec![
            period(1, "2024-01-01", Some("2024-01-05")),
            period(2, "2024-01-29", Some("2024-02-02")),
        ];

        // Predicted 2024-02-26, ovulation 2024-02-12
        let context = waiting(cycle_context(
            &periods,
            date("2024-02-12"),
            &AnalyticsConfig::default(),
        ));

        assert!(context.is_today_ovulation);
        assert!(context.is_in_fertile_window);
        assert_eq!(context.fertile_window.start, Some(date("2024-02-07")));
        assert_eq!(context.progress_percent, Some(53.57));
    }
}
