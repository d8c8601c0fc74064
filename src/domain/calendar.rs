//! Calendar and currency helpers shared by the engines.

use chrono::{Datelike, NaiveDate};

/// Mean length of a Gregorian year in days.
pub const DAYS_PER_YEAR: f64 = 365.2422;

/// Round to whole cents, half away from zero.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

pub fn end_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

/// Fraction of a year between two dates, using [`DAYS_PER_YEAR`].
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Fraction of the year left from `date` to December 31.
pub fn fraction_remaining(date: NaiveDate) -> f64 {
    years_between(date, end_of_year(date))
}

/// Fraction of the year elapsed from January 1 to `date`.
pub fn fraction_elapsed(date: NaiveDate) -> f64 {
    years_between(start_of_year(date), date)
}

/// Calendar year plus the elapsed fraction, e.g. 2020-07-02 → ~2020.50.
pub fn scalar_year(date: NaiveDate) -> f64 {
    date.year() as f64 + fraction_elapsed(date)
}
