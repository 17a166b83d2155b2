use chrono::{Days, NaiveDate};

use crate::format::format_date;

pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

/// Reads the calendar date out of a stored `YYYY-MM-DD[THH:MM:SS]` value.
///
/// The date parts are taken as plain integers and built into a naive date, so
/// no timezone can shift the day.
pub fn parse_quote_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(['T', ' ']).next()?;
    let mut parts = date_part.split('-');

    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn validity_date(raw: &str, validity_days: u32) -> Option<NaiveDate> {
    parse_quote_date(raw)?.checked_add_days(Days::new(u64::from(validity_days)))
}

pub fn calculate_validity_date(raw: &str, validity_days: u32, pattern: &str) -> Option<String> {
    validity_date(raw, validity_days).and_then(|date| format_date(date, pattern))
}
