use chrono::{Local, NaiveDate, TimeDelta};

/// Accepted layouts for explicit dates, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a day as typed on the command line, relative to `today`.
///
/// Examples:
/// - "today", "yesterday"
/// - "-3" -> three days before today
/// - "2024-02-25", "02/25/2024", "25.02.2024"
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "" => return Err("empty date".to_string()),
        "today" => return Ok(today),
        "yesterday" => {
            return today
                .pred_opt()
                .ok_or_else(|| "day offset out of range: yesterday".to_string())
        }
        _ => {}
    }

    if let Some(days) = input.strip_prefix('-') {
        let days: i64 = days
            .parse()
            .map_err(|_| format!("invalid day offset: {}", input))?;
        return TimeDelta::try_days(days)
            .and_then(|offset| today.checked_sub_signed(offset))
            .ok_or_else(|| format!("day offset out of range: {}", input));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| format!("unrecognized date: {} (expected YYYY-MM-DD)", input))
}

/// clap value parser for day arguments, relative to the local date.
pub fn parse_day_arg(input: &str) -> Result<NaiveDate, String> {
    parse_day(input, Local::now().date_naive())
}
