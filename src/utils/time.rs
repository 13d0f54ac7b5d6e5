use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";
const CLOCK_FORMAT: &str = "%H:%M:%S";

pub fn now(timezone: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&timezone)
}

// e.g. "2024-07-01 14:05:09 CDT"
pub fn format_last_updated(time: &DateTime<Tz>) -> String {
    time.format(LAST_UPDATED_FORMAT).to_string()
}

pub fn format_clock(time: &DateTime<Tz>) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats_in_local_zone() {
        let tz: Tz = "US/Central".parse().unwrap();
        let time = Utc
            .with_ymd_and_hms(2024, 7, 1, 19, 5, 9)
            .unwrap()
            .with_timezone(&tz);

        assert_eq!(format_last_updated(&time), "2024-07-01 14:05:09 CDT");
        assert_eq!(format_clock(&time), "14:05:09");
    }

    #[test]
    fn test_standard_time_abbreviation() {
        let tz: Tz = "US/Central".parse().unwrap();
        let time = Utc
            .with_ymd_and_hms(2024, 1, 15, 6, 0, 0)
            .unwrap()
            .with_timezone(&tz);

        assert_eq!(format_last_updated(&time), "2024-01-15 00:00:00 CST");
    }
}
