//! Date display and parsing helpers.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// `dd/mm/yyyy hh:mm`
pub fn format_datetime<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dt.format("%d/%m/%Y %H:%M").to_string()
}

/// `dd/mm/yyyy`
pub fn format_date<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dt.format("%d/%m/%Y").to_string()
}

/// True when `dt` falls on `today` in its own time zone.
pub fn is_same_day<Tz: TimeZone>(dt: &DateTime<Tz>, today: NaiveDate) -> bool {
    dt.date_naive() == today
}

/// True when `dt` is today in local time.
pub fn is_today<Tz: TimeZone>(dt: &DateTime<Tz>) -> bool {
    is_same_day(&dt.with_timezone(&Local), Local::now().date_naive())
}

/// Formats epoch seconds as local `dd/mm/yyyy hh:mm`.
pub fn format_epoch_secs(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    let dt = DateTime::<Utc>::from_timestamp(secs, 0)?;
    Some(format_datetime(&dt.with_timezone(&Local)))
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare `YYYY-MM-DD`
/// (UTC midnight).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Last representable instant of the day `input` names; other forms are
/// taken as-is.
pub fn parse_range_end(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
        return Some(day.and_time(end).and_utc());
    }
    parse_timestamp(trimmed)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};

    use super::*;

    #[test]
    fn test_formats_pad_fields() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 0).unwrap();
        assert_eq!(format_datetime(&dt), "05/03/2024 07:09");
        assert_eq!(format_date(&dt), "05/03/2024");
    }

    #[test]
    fn test_same_day_uses_own_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = tz.with_ymd_and_hms(2024, 3, 5, 0, 30, 0).unwrap();
        assert!(is_same_day(&dt, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
        assert!(!is_same_day(
            &dt.with_timezone(&Utc),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        ));
    }

    #[test]
    fn test_is_today() {
        assert!(is_today(&Local::now()));
        assert!(!is_today(&(Local::now() - Duration::days(2))));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-31T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-31T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-31 12:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-31"),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("31/01/2024"), None);
    }

    #[test]
    fn test_parse_range_end_covers_whole_day() {
        let end = parse_range_end("2024-01-31").unwrap();
        assert_eq!(end.to_rfc3339(), "2024-01-31T23:59:59.999+00:00");
    }

    #[test]
    fn test_format_epoch_secs() {
        assert!(format_epoch_secs(1_700_000_000).is_some());
        assert_eq!(format_epoch_secs(u64::MAX), None);
    }
}
