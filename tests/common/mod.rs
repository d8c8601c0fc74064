#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use levsim::domain::error::LevsimError;
use levsim::domain::observation::{DailySeries, PriceBar};
use levsim::ports::cost_port::{CostDividendPort, YearAdjustment};
use levsim::ports::series_port::SeriesPort;
use std::collections::{BTreeMap, HashMap};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: None,
    }
}

/// One observation per consecutive calendar day.
pub fn make_series(start: NaiveDate, closes: &[f64]) -> DailySeries {
    DailySeries::from_bars(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| make_bar(start + Duration::days(i as i64), close))
            .collect(),
    )
}

/// Weekday observations from `start` with a deterministic zig-zag drift.
pub fn make_trading_series(start: NaiveDate, count: usize) -> DailySeries {
    let mut bars = Vec::with_capacity(count);
    let mut day = start;
    let mut close: f64 = 100.0;
    let pattern = [0.012, -0.008, 0.004, -0.011, 0.009, 0.002, -0.003];
    while bars.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let step = pattern[bars.len() % pattern.len()];
            close = ((close * (1.0 + step)) * 100.0).round() / 100.0;
            bars.push(make_bar(day, close));
        }
        day += Duration::days(1);
    }
    DailySeries::from_bars(bars)
}

pub struct NoCosts;

impl CostDividendPort for NoCosts {
    fn adjustment(&self, _year: i32, _leverage: f64) -> YearAdjustment {
        YearAdjustment::default()
    }
}

/// Same adjustment for every year and ratio above 1.0.
pub struct FlatCosts {
    pub adjustment: YearAdjustment,
}

impl CostDividendPort for FlatCosts {
    fn adjustment(&self, _year: i32, leverage: f64) -> YearAdjustment {
        if leverage > 1.0 {
            self.adjustment
        } else {
            YearAdjustment::default()
        }
    }
}

pub struct MockSeriesPort {
    pub series: HashMap<String, DailySeries>,
    pub dividends: HashMap<String, BTreeMap<i32, f64>>,
}

impl MockSeriesPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            dividends: HashMap::new(),
        }
    }

    pub fn with_series(mut self, source: &str, series: DailySeries) -> Self {
        self.series.insert(source.to_string(), series);
        self
    }

    pub fn with_dividends(mut self, source: &str, dividends: BTreeMap<i32, f64>) -> Self {
        self.dividends.insert(source.to_string(), dividends);
        self
    }
}

impl SeriesPort for MockSeriesPort {
    fn fetch_series(&self, source: &str) -> Result<DailySeries, LevsimError> {
        self.series
            .get(source)
            .cloned()
            .ok_or_else(|| LevsimError::DataRead {
                path: source.to_string(),
                reason: "no such mock series".to_string(),
            })
    }

    fn fetch_dividends(&self, source: &str) -> Result<BTreeMap<i32, f64>, LevsimError> {
        self.dividends
            .get(source)
            .cloned()
            .ok_or_else(|| LevsimError::DataRead {
                path: source.to_string(),
                reason: "no such mock dividend table".to_string(),
            })
    }
}
