//! Formatting helpers shared by presentation layers.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Round to the nearest whole degree (half away from zero) and render it.
///
/// Values that round to zero from below render as `"0"`, never `"-0"`.
pub fn format_temperature(celsius: f64) -> String {
    let rounded = celsius.round();
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded:.0}")
}

/// Whole-degree value for daily min/max rows, truncated toward zero.
pub fn truncate_temperature(celsius: f64) -> String {
    let truncated = celsius.trunc();
    if truncated == 0.0 {
        return "0".to_string();
    }
    format!("{truncated:.0}")
}

/// Label for a forecast day: "Today", the weekday name, or "Unknown date" when
/// the provider timestamp cannot be parsed. Timestamps are read in the local
/// time zone.
pub fn day_label(date: &str, today: NaiveDate) -> String {
    day_label_in(date, today, &Local)
}

/// [`day_label`] with the calendar day taken in `tz`.
pub fn day_label_in<Tz: TimeZone>(date: &str, today: NaiveDate, tz: &Tz) -> String {
    match parse_day(date, tz) {
        Some(day) if day == today => "Today".to_string(),
        Some(day) => day.format("%A").to_string(),
        None => "Unknown date".to_string(),
    }
}

fn parse_day<Tz: TimeZone>(date: &str, tz: &Tz) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.with_timezone(tz).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn rounds_to_nearest_degree() {
        assert_eq!(format_temperature(272.95), "273");
        assert_eq!(format_temperature(21.5), "22");
        assert_eq!(format_temperature(-3.6), "-4");
    }

    #[test]
    fn near_zero_never_renders_negative_zero() {
        assert_eq!(format_temperature(-0.2), "0");
        assert_eq!(format_temperature(0.49), "0");
        assert_eq!(format_temperature(-0.0), "0");
        assert_eq!(format_temperature(-0.5), "-1");
    }

    #[test]
    fn truncation_drops_fraction() {
        assert_eq!(truncate_temperature(7.9), "7");
        assert_eq!(truncate_temperature(-0.7), "0");
        assert_eq!(truncate_temperature(-4.2), "-4");
    }

    #[test]
    fn day_label_variants() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();

        assert_eq!(day_label_in("2024-03-25T04:00:00Z", today, &Utc), "Today");
        assert_eq!(day_label_in("2024-03-26T04:00:00Z", today, &Utc), "Tuesday");
        assert_eq!(day_label_in("2024-03-27", today, &Utc), "Wednesday");
        assert_eq!(day_label("garbage", today), "Unknown date");
    }

    #[test]
    fn day_label_uses_the_local_calendar_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();

        // 21:00 UTC on the 24th is already the 25th in Tokyo.
        assert_eq!(day_label_in("2024-03-24T21:00:00Z", today, &tokyo), "Today");
        assert_eq!(day_label_in("2024-03-25T21:00:00Z", today, &tokyo), "Tuesday");
        assert_eq!(day_label_in("2024-03-25T02:00:00Z", today, &new_york), "Sunday");
        assert_eq!(day_label_in("2024-03-25T06:00:00+09:00", today, &Utc), "Sunday");
    }
}
