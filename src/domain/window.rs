//! Holding windows into a [`DailySeries`].

use crate::domain::error::LevsimError;
use crate::domain::observation::DailySeries;
use chrono::NaiveDate;

/// Inclusive index range `[start, end]` into a series, with its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingWindow {
    start: usize,
    end: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl HoldingWindow {
    pub fn new(series: &DailySeries, start: usize, end: usize) -> Result<Self, LevsimError> {
        let count = series.len();
        let start_obs = series
            .get(start)
            .ok_or(LevsimError::IndexOutOfRange { index: start, count })?;
        let end_obs = series
            .get(end)
            .ok_or(LevsimError::IndexOutOfRange { index: end, count })?;
        if start > end {
            return Err(LevsimError::NoSamplingRange {
                reason: format!("window start index {start} is after end index {end}"),
            });
        }
        Ok(Self {
            start,
            end,
            start_date: start_obs.date,
            end_date: end_obs.date,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Calendar days between the first and last observation.
    pub fn days_held(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}
