//! Daily price observations and the ordered series they form.

use crate::domain::calendar::round_cents;
use crate::domain::error::LevsimError;
use chrono::NaiveDate;

/// One row of raw price history, prices already rounded to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
    /// Close minus the prior trading day's close, rounded to cents.
    pub dollar_change: f64,
    /// `dollar_change / prior close`; zero for the first observation.
    pub ratio_change: f64,
}

impl DailyObservation {
    pub fn previous_close(&self) -> f64 {
        round_cents(self.close - self.dollar_change)
    }
}

/// Date-ordered, index-addressable sequence of observations.
#[derive(Debug, Clone)]
pub struct DailySeries {
    observations: Vec<DailyObservation>,
}

impl DailySeries {
    /// Builds the series from raw bars, sorting by date and deriving the
    /// day-over-day changes.
    pub fn from_bars(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);

        let mut observations: Vec<DailyObservation> = Vec::with_capacity(bars.len());
        for bar in bars {
            let (dollar_change, ratio_change) = match observations.last() {
                Some(prev) if prev.close != 0.0 => {
                    let dollar = round_cents(bar.close - prev.close);
                    (dollar, dollar / prev.close)
                }
                _ => (0.0, 0.0),
            };
            observations.push(DailyObservation {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                dollar_change,
                ratio_change,
            });
        }

        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DailyObservation> {
        self.observations.get(index)
    }

    pub fn observations(&self) -> &[DailyObservation] {
        &self.observations
    }

    pub fn first(&self) -> Option<&DailyObservation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&DailyObservation> {
        self.observations.last()
    }

    /// First and last dates, or `None` for an empty series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// Replays every stored change from the first close, rounding to cents
    /// after each step, and checks that the last close comes back out.
    pub fn verify_consistency(&self) -> Result<(), LevsimError> {
        let (Some(first), Some(last)) = (self.first(), self.last()) else {
            return Ok(());
        };

        let mut value = first.close;
        for obs in &self.observations {
            value = round_cents(value * (1.0 + obs.ratio_change));
        }

        if (value - last.close).abs() >= 0.005 {
            return Err(LevsimError::DataIntegrity {
                replayed: value,
                last_close: last.close,
            });
        }
        Ok(())
    }
}
