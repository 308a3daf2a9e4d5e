//! Report date resolution

use crate::{CoreError, CoreResult};
use chrono::{Local, NaiveDate};
use std::fmt::Write;

/// The day before `today`
pub fn yesterday(today: NaiveDate) -> CoreResult<NaiveDate> {
    today
        .pred_opt()
        .ok_or_else(|| CoreError::InvalidDate(format!("no day before {}", today)))
}

/// Format `date` the way the report subject writes it, e.g. `Sep 18`
///
/// Fails when `format` is malformed or asks for fields a date does not
/// carry, such as `%H` or `%Z`.
pub fn date_label(date: NaiveDate, format: &str) -> CoreResult<String> {
    let mut label = String::new();
    write!(label, "{}", date.format(format))
        .map_err(|_| CoreError::InvalidDate(format!("cannot format {} with {:?}", date, format)))?;
    Ok(label)
}

pub fn yesterday_label(today: NaiveDate, format: &str) -> CoreResult<String> {
    date_label(yesterday(today)?, format)
}

/// Date of the report to fetch: the explicit override, else yesterday by the local clock
pub fn resolve_report_date(override_date: Option<NaiveDate>) -> CoreResult<NaiveDate> {
    match override_date {
        Some(date) => Ok(date),
        None => yesterday(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_yesterday_label() {
        assert_eq!(yesterday_label(ymd(2024, 9, 19), "%b %d").unwrap(), "Sep 18");
    }

    #[test]
    fn test_day_is_zero_padded() {
        assert_eq!(yesterday_label(ymd(2024, 9, 9), "%b %d").unwrap(), "Sep 08");
    }

    #[test]
    fn test_crosses_month_and_year() {
        assert_eq!(yesterday(ymd(2024, 3, 1)).unwrap(), ymd(2024, 2, 29));
        assert_eq!(yesterday(ymd(2025, 1, 1)).unwrap(), ymd(2024, 12, 31));
        assert_eq!(yesterday_label(ymd(2025, 1, 1), "%b %d").unwrap(), "Dec 31");
    }

    #[test]
    fn test_time_fields_are_an_error() {
        for format in ["%b %d %H", "%b %d %Z", "%"] {
            assert!(
                matches!(date_label(ymd(2024, 9, 18), format), Err(CoreError::InvalidDate(_))),
                "{format}"
            );
        }
        assert_eq!(date_label(ymd(2024, 9, 18), "%d/%m").unwrap(), "18/09");
    }

    #[test]
    fn test_calendar_underflow() {
        assert!(matches!(yesterday(NaiveDate::MIN), Err(CoreError::InvalidDate(_))));
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(resolve_report_date(Some(ymd(2024, 9, 18))).unwrap(), ymd(2024, 9, 18));

        let expected = Local::now().date_naive().pred_opt().unwrap();
        let resolved = resolve_report_date(None).unwrap();
        // Tolerate the clock ticking over midnight between the two reads
        assert!(resolved == expected || resolved == expected.succ_opt().unwrap());
    }
}
