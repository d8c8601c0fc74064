//! Random selection of holding windows over an irregular trading calendar.

use crate::domain::calendar::DAYS_PER_YEAR;
use crate::domain::error::LevsimError;
use crate::domain::observation::DailySeries;
use crate::domain::window::HoldingWindow;
use chrono::{Duration, NaiveDate};
use rand::Rng;

/// Limits on the holding length and on the calendar span windows may cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingBounds {
    pub min_years: f64,
    pub max_years: f64,
    /// Windows start no earlier than January 1 of this year.
    pub min_start_year: Option<i32>,
    /// Windows end no later than December 31 of this year.
    pub max_end_year: Option<i32>,
}

impl Default for SamplingBounds {
    fn default() -> Self {
        Self {
            min_years: 2.0,
            max_years: 20.0,
            min_start_year: None,
            max_end_year: None,
        }
    }
}

pub struct SamplingEngine<'a> {
    series: &'a DailySeries,
    bounds: SamplingBounds,
}

impl<'a> SamplingEngine<'a> {
    pub fn new(series: &'a DailySeries, bounds: SamplingBounds) -> Self {
        Self { series, bounds }
    }

    /// Shortest and longest holding lengths, in days.
    pub fn length_range(&self) -> (i64, i64) {
        (
            (self.bounds.min_years * DAYS_PER_YEAR).round() as i64,
            (self.bounds.max_years * DAYS_PER_YEAR).round() as i64,
        )
    }

    /// Fails when even the longest holding length has no valid start, so a
    /// run either fails up front or every draw succeeds.
    pub fn validate(&self) -> Result<(), LevsimError> {
        let (min_days, max_days) = self.length_range();
        if min_days > max_days {
            return Err(LevsimError::NoSamplingRange {
                reason: format!(
                    "minimum holding length ({} years) exceeds maximum ({} years)",
                    self.bounds.min_years, self.bounds.max_years
                ),
            });
        }
        self.start_index_range(holding_days(max_days)?).map(|_| ())
    }

    pub fn draw_length<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Duration, LevsimError> {
        let (min_days, max_days) = self.length_range();
        holding_days(rng.gen_range(min_days..=max_days))
    }

    /// Inclusive range of start indices that leave room for `length`.
    pub fn start_index_range(&self, length: Duration) -> Result<(usize, usize), LevsimError> {
        let (first, last) = self.series.date_range().ok_or_else(|| {
            LevsimError::NoSamplingRange {
                reason: "the price series is empty".to_string(),
            }
        })?;

        let lower = match self.bounds.min_start_year {
            Some(year) => first.max(year_boundary(year, 1, 1)?),
            None => first,
        };
        let latest_end = match self.bounds.max_end_year {
            Some(year) => last.min(year_boundary(year, 12, 31)?),
            None => last,
        };
        let upper = latest_end
            .checked_sub_signed(length)
            .ok_or_else(|| LevsimError::NoSamplingRange {
                reason: format!("holding length of {} days is out of range", length.num_days()),
            })?;

        if lower > upper {
            return Err(LevsimError::no_range(lower, upper));
        }

        let lower_index = first_index_on_or_after(self.series, lower);
        let upper_index = last_index_on_or_before(self.series, upper);
        match (lower_index, upper_index) {
            (Some(lo), Some(hi)) if lo <= hi => Ok((lo, hi)),
            _ => Err(LevsimError::no_range(lower, upper)),
        }
    }

    /// Draws a holding length, then a start day, then maps start + length to
    /// the nearest trading day.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<HoldingWindow, LevsimError> {
        let length = self.draw_length(rng)?;
        let (lo, hi) = self.start_index_range(length)?;
        let start = rng.gen_range(lo..=hi);

        let start_date = self.series.observations()[start].date;
        let target = start_date + length;
        let end = nearest_index(self.series, target).unwrap_or(start);

        HoldingWindow::new(self.series, start, end)
    }
}

fn holding_days(days: i64) -> Result<Duration, LevsimError> {
    Duration::try_days(days).ok_or_else(|| LevsimError::NoSamplingRange {
        reason: format!("holding length of {days} days is out of range"),
    })
}

fn year_boundary(year: i32, month: u32, day: u32) -> Result<NaiveDate, LevsimError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| LevsimError::NoSamplingRange {
        reason: format!("year {year} is out of range"),
    })
}

/// Earliest index whose date is on or after `date`.
pub fn first_index_on_or_after(series: &DailySeries, date: NaiveDate) -> Option<usize> {
    series.observations().iter().position(|o| o.date >= date)
}

/// Latest index whose date is on or before `date`.
pub fn last_index_on_or_before(series: &DailySeries, date: NaiveDate) -> Option<usize> {
    series.observations().iter().rposition(|o| o.date <= date)
}

/// Index of the observation closest to `target` by squared day distance.
/// Equidistant candidates resolve to the earliest index.
pub fn nearest_index(series: &DailySeries, target: NaiveDate) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, obs) in series.observations().iter().enumerate() {
        let delta = (target - obs.date).num_days();
        let distance = delta * delta;
        if best.is_none_or(|(_, lowest)| distance < lowest) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
