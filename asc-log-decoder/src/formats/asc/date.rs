//! Session date from the `date` header line
//!
//! CANoe/CANalyzer write the measurement start in the locale of the
//! recording machine:
//!
//! ```text
//! date Thu Mar 9 10:35:20.123 am 2017
//! date Do Mär 9 10:35:20.123 2017
//! ```
//!
//! The English form is recognised by its am/pm marker, everything else is
//! read as the German 24 hour form.

use crate::types::TimeSpec;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const ENGLISH_FORMAT: &str = "%B %d %I:%M:%S%.f %p %Y";
const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.f";

/// True for lines carrying the measurement start date
pub(crate) fn is_date_line(line: &str) -> bool {
    line.split_whitespace().next() == Some("date")
}

/// Parse a `date` line into seconds since the epoch, reading the date as
/// local standard time. Sub-second digits are dropped.
///
/// Returns `None` when neither form matches or the date lies before 1970.
pub(crate) fn session_date_from_line(line: &str) -> Option<TimeSpec> {
    let naive = parse_date_line(line)?;
    let seconds = naive.and_utc().timestamp() - i64::from(standard_offset(naive.year())?);
    if seconds < 0 {
        return None;
    }
    Some(TimeSpec::new(seconds, 0))
}

/// UTC offset in seconds of the local zone outside daylight saving time
///
/// Daylight saving always moves clocks forward, so the standard offset is
/// the smaller of the midwinter and midsummer offsets of `year`.
fn standard_offset(year: i32) -> Option<i32> {
    [1, 7]
        .into_iter()
        .filter_map(|month| {
            let noon = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(12, 0, 0)?;
            Local
                .from_local_datetime(&noon)
                .earliest()
                .map(|local| local.offset().local_minus_utc())
        })
        .min()
}

fn parse_date_line(line: &str) -> Option<NaiveDateTime> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "date" {
        return None;
    }
    // weekday name
    parts.next()?;
    let fields: Vec<&str> = parts.collect();

    let has_am_pm = fields
        .iter()
        .any(|f| f.eq_ignore_ascii_case("am") || f.eq_ignore_ascii_case("pm"));

    if has_am_pm {
        parse_english(&fields)
    } else {
        parse_german(&fields)
    }
}

/// `<Month> <day> <hh:mm:ss[.fff]> <am|pm> <year>`
fn parse_english(fields: &[&str]) -> Option<NaiveDateTime> {
    if fields.len() != 5 {
        return None;
    }
    NaiveDateTime::parse_from_str(&fields.join(" "), ENGLISH_FORMAT).ok()
}

/// `<Monat> <day> <HH:MM:SS[.fff]> <year>`
fn parse_german(fields: &[&str]) -> Option<NaiveDateTime> {
    let [month, day, time, year] = fields else {
        return None;
    };

    let month = german_month(month)?;
    let day: u32 = day.trim_end_matches('.').parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let time = NaiveTime::parse_from_str(time, TIME_OF_DAY_FORMAT).ok()?;

    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(time))
}

/// Month number for a German month name or abbreviation
fn german_month(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.').to_lowercase();
    let month = match name.as_str() {
        "januar" | "jänner" | "jan" | "jän" => 1,
        "februar" | "feb" => 2,
        "märz" | "maerz" | "mär" | "mrz" => 3,
        "april" | "apr" => 4,
        "mai" => 5,
        "juni" | "jun" => 6,
        "juli" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "oktober" | "okt" => 10,
        "november" | "nov" => 11,
        "dezember" | "dez" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_epoch(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap();
        naive.and_utc().timestamp() - i64::from(standard_offset(y).unwrap())
    }

    #[test]
    fn test_standard_offset_ignores_daylight_saving() {
        let winter = NaiveDate::from_ymd_opt(2019, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let summer = NaiveDate::from_ymd_opt(2019, 7, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let offset = |naive: &NaiveDateTime| {
            Local
                .from_local_datetime(naive)
                .earliest()
                .unwrap()
                .offset()
                .local_minus_utc()
        };
        let (winter_offset, summer_offset) = (offset(&winter), offset(&summer));

        assert_eq!(standard_offset(2019), Some(winter_offset.min(summer_offset)));
    }

    #[test]
    fn test_summer_and_winter_dates_share_the_offset() {
        let winter = session_date_from_line("date Mon Jan 7 02:00:00 pm 2019").unwrap();
        let summer = session_date_from_line("date Mon Jul 8 02:00:00 pm 2019").unwrap();
        // 182 days apart on the wall clock, no DST hour in between
        assert_eq!(summer.seconds - winter.seconds, 182 * 86_400);
    }

    #[test]
    fn test_detects_date_line() {
        assert!(is_date_line("date Thu Mar 9 10:35:20 am 2017"));
        assert!(!is_date_line("DATE Thu Mar 9 10:35:20 am 2017"));
        assert!(!is_date_line("base hex  timestamps absolute"));
        assert!(!is_date_line(""));
    }

    #[test]
    fn test_parses_english_pm() {
        let date = session_date_from_line("date Wed Jun 12 02:06:08 pm 2019").unwrap();
        assert_eq!(date, TimeSpec::new(local_epoch(2019, 6, 12, 14, 6, 8), 0));
    }

    #[test]
    fn test_parses_english_with_milliseconds() {
        let date = session_date_from_line("date Thu Mar 9 10:35:20.123 am 2017").unwrap();
        assert_eq!(date, TimeSpec::new(local_epoch(2017, 3, 9, 10, 35, 20), 0));
    }

    #[test]
    fn test_twelve_am_is_midnight() {
        let date = session_date_from_line("date Mon March 10 12:00:00 AM 2025").unwrap();
        assert_eq!(date.seconds, local_epoch(2025, 3, 10, 0, 0, 0));
    }

    #[test]
    fn test_parses_german() {
        let date = session_date_from_line("date Do Mär 9 22:35:20 2017").unwrap();
        assert_eq!(date.seconds, local_epoch(2017, 3, 9, 22, 35, 20));

        let date = session_date_from_line("date Mo Dez 24 08:00:01.500 2018").unwrap();
        assert_eq!(date.seconds, local_epoch(2018, 12, 24, 8, 0, 1));
    }

    #[test]
    fn test_german_month_names() {
        assert_eq!(german_month("Mrz"), Some(3));
        assert_eq!(german_month("März"), Some(3));
        assert_eq!(german_month("Okt."), Some(10));
        assert_eq!(german_month("Mai"), Some(5));
        assert_eq!(german_month("May"), None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(session_date_from_line("date"), None);
        assert_eq!(session_date_from_line("date Thu"), None);
        assert_eq!(session_date_from_line("date Thu Foo 9 10:35:20 am 2017"), None);
        assert_eq!(session_date_from_line("date Do Mär 9 25:35:20 2017"), None);
        assert_eq!(session_date_from_line("date Do Mär 9 2017"), None);
    }

    #[test]
    fn test_rejects_dates_before_epoch() {
        assert_eq!(session_date_from_line("date Mo Jan 1 00:00:00 1900"), None);
    }
}
