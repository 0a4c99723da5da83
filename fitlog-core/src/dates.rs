//! Local calendar helpers.
//!
//! Dates are stored as zero-padded `YYYY-MM-DD` strings and timestamps as
//! `YYYY-MM-DDTHH:MM:SS`, both in local time, so plain string comparison
//! orders them chronologically.

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn local_date() -> String {
    format_date(today())
}

pub fn local_timestamp() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", date))
}

/// Monday of the week containing `date`. Sunday belongs to the week that
/// started six days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().number_from_monday() - 1;
    date - Days::new(u64::from(offset))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `DD/MM` chart label for a stored date; anything unparseable is returned as is.
pub fn short_label(date: &str) -> String {
    match parse_date(date) {
        Ok(d) => d.format("%d/%m").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Calendar-day part of a stored timestamp.
pub fn day_of(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// Normalise a user-supplied measurement time. A bare date gets the current
/// local time of day appended; a full timestamp is kept; nothing means now.
pub fn measurement_timestamp(when: Option<&str>) -> Result<String> {
    match when.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(local_timestamp()),
        Some(w) if w.contains('T') => {
            NaiveDateTime::parse_from_str(w, TIMESTAMP_FORMAT)
                .with_context(|| format!("Invalid timestamp {:?}", w))?;
            Ok(w.to_string())
        }
        Some(w) => {
            let date = parse_date(w)?;
            let time = Local::now().time();
            Ok(date.and_time(time).format(TIMESTAMP_FORMAT).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-01-10 is a Wednesday.
        assert_eq!(week_start(d("2024-01-10")), d("2024-01-08"));
        assert_eq!(week_start(d("2024-01-08")), d("2024-01-08"));
    }

    #[test]
    fn sunday_closes_the_previous_week() {
        assert_eq!(week_start(d("2024-01-14")), d("2024-01-08"));
    }

    #[test]
    fn month_start_is_first_day() {
        assert_eq!(month_start(d("2024-02-29")), d("2024-02-01"));
    }

    #[test]
    fn labels_and_days() {
        assert_eq!(short_label("2024-01-05"), "05/01");
        assert_eq!(short_label("garbage"), "garbage");
        assert_eq!(day_of("2024-01-05T07:30:00"), "2024-01-05");
    }

    #[test]
    fn measurement_timestamps() {
        assert_eq!(
            measurement_timestamp(Some("2024-01-05T07:30:00")).unwrap(),
            "2024-01-05T07:30:00"
        );
        let stamped = measurement_timestamp(Some("2024-01-05")).unwrap();
        assert!(stamped.starts_with("2024-01-05T"));
        assert_eq!(stamped.len(), 19);
        assert!(measurement_timestamp(Some("05/01/2024")).is_err());
        assert_eq!(measurement_timestamp(None).unwrap().len(), 19);
    }
}
