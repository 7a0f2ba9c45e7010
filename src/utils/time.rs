use chrono::{Duration, NaiveDate};

/// This is the standard way of converting a date to a store key in codetime.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_record_name(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Renders a duration as `H:MM:SS`. Hours are not bounded and fractional seconds are dropped.
/// Negative durations render as `0:00:00`.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

/// Parses `H:MM:SS`. Components are not required to be zero padded, and minutes or seconds
/// above 59 are carried over, so `0:75:00` is the same as `1:15:00`.
pub fn parse_clock(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let hours = hours.trim().parse::<u32>().ok()?;
    let minutes = minutes.trim().parse::<u32>().ok()?;
    let seconds = seconds.trim().parse::<u32>().ok()?;

    Some(
        Duration::hours(hours as i64)
            + Duration::minutes(minutes as i64)
            + Duration::seconds(seconds as i64),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{date_to_record_name, format_clock, parse_clock, parse_record_name};

    #[test]
    fn test_clock_round_trip() {
        for value in ["0:00:00", "0:05:00", "1:02:03", "12:30:59", "25:00:01", "101:59:59"] {
            let parsed = parse_clock(value).unwrap();
            assert_eq!(format_clock(parsed), value);
        }
    }

    #[test]
    fn test_clock_normalizes_padding() {
        assert_eq!(format_clock(parse_clock("01:5:7").unwrap()), "1:05:07");
        assert_eq!(format_clock(parse_clock("0:75:00").unwrap()), "1:15:00");
    }

    #[test]
    fn test_clock_rejects_garbage() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("abc"), None);
        assert_eq!(parse_clock("1:00"), None);
        assert_eq!(parse_clock("1:00:00:00"), None);
        assert_eq!(parse_clock("-1:00:00"), None);
        assert_eq!(parse_clock("1 day, 0:00:00"), None);
    }

    #[test]
    fn test_clock_drops_fractions() {
        let value = Duration::seconds(299) + Duration::milliseconds(999);
        assert_eq!(format_clock(value), "0:04:59");
        assert_eq!(format_clock(Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_record_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date_to_record_name(date), "2024-01-01");
        assert_eq!(parse_record_name(" 2024-01-01 "), Some(date));
        assert_eq!(parse_record_name("Date"), None);
    }
}
