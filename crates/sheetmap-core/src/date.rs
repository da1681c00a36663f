//! Spreadsheet serial date conversion
//!
//! Notes:
//! - Dates are stored as serial numbers (days since a base date) with the
//!   time of day as the fractional part.
//! - The 1900 date system includes the historical "1900 leap year" bug: serial 60
//!   is the non-existent 1900-02-29, so serials from 61 on are offset by one day.
//! - The 1904 date system counts from 1904-01-01 and has no such quirk.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Serial of 9999-12-31, the last date spreadsheets can represent
const MAX_SERIAL: f64 = 2_958_465.0;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Convert a serial number to a date/time.
///
/// Returns `None` for negative, non-finite or out-of-range serials.
pub fn serial_to_date_time(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let mut days = serial.floor() as i64;
    let mut millis = ((serial - serial.floor()) * MILLIS_PER_DAY as f64).round() as i64;
    if millis >= MILLIS_PER_DAY {
        days += 1;
        millis -= MILLIS_PER_DAY;
    }

    let date = if date_1904 {
        ymd(1904, 1, 1).checked_add_signed(Duration::days(days))?
    } else if days < 60 {
        ymd(1899, 12, 31).checked_add_signed(Duration::days(days))?
    } else if days == 60 {
        // 1900-02-29 does not exist
        ymd(1900, 2, 28)
    } else {
        ymd(1899, 12, 30).checked_add_signed(Duration::days(days))?
    };

    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a date/time to a serial number.
pub fn date_time_to_serial(value: NaiveDateTime, date_1904: bool) -> Result<f64> {
    let date = value.date();
    let days = if date_1904 {
        (date - ymd(1904, 1, 1)).num_days()
    } else if date < ymd(1900, 3, 1) {
        (date - ymd(1899, 12, 31)).num_days()
    } else {
        (date - ymd(1899, 12, 30)).num_days()
    };

    if days < 0 {
        return Err(Error::DateOutOfRange(value.to_string()));
    }

    let time = value.time();
    let seconds = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
    Ok(days as f64 + seconds / 86_400.0)
}
