//! Date and timestamp normalisation.
//!
//! Dates arrive from forms and patient directories in whatever shape the user or upstream
//! system chose. Day-first numeric dates are the norm: the first numeric group is always the
//! day and the second the month, with no locale-dependent swapping.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
};

/// Generic date layouts tried after the numeric forms.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Local date-time layouts accepted for timestamps.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a free-form calendar date.
///
/// Accepted, in order:
/// - ISO `yyyy-mm-dd`
/// - `dd-mm-yyyy` / `dd/mm/yyyy`, with a 2-digit year read as 19xx
/// - RFC 3339 / RFC 2822 timestamps and a handful of written forms (`5 Aug 1990`,
///   `August 5, 1990`, `1990/08/05`)
///
/// Returns `None` when nothing applies or the date does not exist (`31-02-1990`).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(date) = parse_numeric_date(input) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.date());
        }
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
}

/// Normalises a free-form date to `yyyy-mm-dd`.
pub fn normalize_date(input: &str) -> Option<String> {
    parse_date(input).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_numeric_date(input: &str) -> Option<NaiveDate> {
    let separator = if input.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = input.split(separator).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };
    if !parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    // ISO only with '-' and a four-digit leading year.
    if separator == '-' && first.len() == 4 {
        if second.len() > 2 || third.len() > 2 {
            return None;
        }
        return NaiveDate::from_ymd_opt(
            first.parse().ok()?,
            second.parse().ok()?,
            third.parse().ok()?,
        );
    }

    if first.len() > 2 || second.len() > 2 {
        return None;
    }
    let year: i32 = match third.len() {
        2 => 1900 + third.parse::<i32>().ok()?,
        4 => third.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, second.parse().ok()?, first.parse().ok()?)
}

/// Parses a free-form local wall-clock date-time.
///
/// RFC 3339 input is converted to the executing environment's local wall clock; date-only
/// input resolves to midnight.
pub fn parse_local_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }
    parse_date(input).map(|d| d.and_time(NaiveTime::MIN))
}

/// Renders a wall-clock time with an explicit numeric offset, e.g. `2024-03-01T09:30:00+05:30`.
///
/// UTC renders as `+00:00`, never `Z`.
pub fn to_offset_timestamp_at(wall_clock: NaiveDateTime, offset: FixedOffset) -> String {
    let stamped = offset
        .from_local_datetime(&wall_clock)
        .single()
        .unwrap_or_else(|| offset.from_utc_datetime(&wall_clock));
    stamped.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Renders `wall_clock` (or now) using the executing environment's local offset at that instant.
pub fn to_offset_timestamp(wall_clock: Option<NaiveDateTime>) -> String {
    let local = match wall_clock {
        Some(wall) => Local
            .from_local_datetime(&wall)
            .earliest()
            .unwrap_or_else(|| {
                tracing::warn!(%wall, "local time does not exist, using current time");
                Local::now()
            }),
        None => Local::now(),
    };
    to_offset_timestamp_at(local.naive_local(), local.offset().fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_first_dashes() {
        assert_eq!(normalize_date("05-08-1990").as_deref(), Some("1990-08-05"));
    }

    #[test]
    fn iso_dates_are_unchanged() {
        assert_eq!(normalize_date("2024-01-01").as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(normalize_date("not-a-date"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
    }

    #[test]
    fn day_first_slashes_with_short_year() {
        assert_eq!(parse_date("5/8/90"), Some(date(1990, 8, 5)));
        assert_eq!(parse_date("31/12/1999"), Some(date(1999, 12, 31)));
    }

    #[test]
    fn first_group_is_always_day() {
        // Would be Dec 1st under a month-first reading.
        assert_eq!(parse_date("12-01-2020"), Some(date(2020, 1, 12)));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert_eq!(parse_date("31-02-1990"), None);
        assert_eq!(parse_date("13/13/2000"), None);
        assert_eq!(parse_date("05-08-199"), None);
    }

    #[test]
    fn generic_fallback_forms() {
        assert_eq!(parse_date("5 Aug 1990"), Some(date(1990, 8, 5)));
        assert_eq!(parse_date("August 5, 1990"), Some(date(1990, 8, 5)));
        assert_eq!(parse_date("1990/08/05"), Some(date(1990, 8, 5)));
        assert_eq!(parse_date("1990-08-05T10:15:00+05:30"), Some(date(1990, 8, 5)));
        assert_eq!(parse_date("1990-08-05T10:15:00"), Some(date(1990, 8, 5)));
    }

    #[test]
    fn local_datetime_accepts_date_only() {
        let parsed = parse_local_datetime("05-08-1990").expect("parses");
        assert_eq!(parsed, date(1990, 8, 5).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn local_datetime_accepts_minutes() {
        let parsed = parse_local_datetime("2024-03-01 09:30").expect("parses");
        assert_eq!(parsed, date(2024, 3, 1).and_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn offset_timestamp_uses_numeric_offset() {
        let wall = date(2024, 3, 1).and_hms_opt(9, 30, 0).unwrap();
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(to_offset_timestamp_at(wall, ist), "2024-03-01T09:30:00+05:30");
        assert_eq!(to_offset_timestamp_at(wall, utc), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn offset_timestamp_is_deterministic() {
        let wall = date(2024, 3, 1).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(to_offset_timestamp(Some(wall)), to_offset_timestamp(Some(wall)));
        assert!(!to_offset_timestamp(None).ends_with('Z'));
    }
}
