//! CSV file adapter for price history and dividend tables.

use crate::domain::calendar::round_cents;
use crate::domain::error::LevsimError;
use crate::domain::observation::{DailySeries, PriceBar};
use crate::ports::series_port::SeriesPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Two-digit years are tried before four-digit ones so `01/04/00` is 2000.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%b %d, %Y", "%Y/%m/%d"];

/// Reads CSV files relative to `base_path`; absolute sources are used as-is.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    fn reader(&self, path: &Path) -> Result<csv::Reader<std::fs::File>, LevsimError> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| read_error(path, e))
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl SeriesPort for CsvAdapter {
    /// Reads `date, open, high, low, close[, volume]` rows. A short row or an
    /// empty date cell marks the end of the data.
    fn fetch_series(&self, source: &str) -> Result<DailySeries, LevsimError> {
        let path = self.resolve(source);
        let mut rdr = self.reader(&path)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| read_error(&path, e))?;
            let date_cell = record.get(0).unwrap_or("");
            if record.len() < 5 || date_cell.is_empty() {
                break;
            }

            let line = bars.len() + 2;
            let date = parse_date(date_cell).ok_or_else(|| LevsimError::DataRead {
                path: path.display().to_string(),
                reason: format!("line {line}: invalid date '{date_cell}'"),
            })?;
            let price = |column: usize, name: &str| {
                let cell = record.get(column).unwrap_or("");
                parse_amount(cell).ok_or_else(|| LevsimError::DataRead {
                    path: path.display().to_string(),
                    reason: format!("line {line}: invalid {name} '{cell}'"),
                })
            };

            bars.push(PriceBar {
                date,
                open: price(1, "open")?,
                high: price(2, "high")?,
                low: price(3, "low")?,
                close: price(4, "close")?,
                volume: record.get(5).and_then(parse_volume),
            });
        }

        if bars.is_empty() {
            return Err(LevsimError::EmptySeries {
                path: path.display().to_string(),
            });
        }
        debug!(path = %path.display(), rows = bars.len(), "loaded price series");
        Ok(DailySeries::from_bars(bars))
    }

    /// Reads `year, ratio` rows. A trailing `%` divides the ratio by 100; a
    /// malformed ratio counts as zero and a malformed year ends the table.
    fn fetch_dividends(&self, source: &str) -> Result<BTreeMap<i32, f64>, LevsimError> {
        let path = self.resolve(source);
        let mut rdr = self.reader(&path)?;
        let mut dividends = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| read_error(&path, e))?;
            let Some(year) = record.get(0).and_then(|y| y.parse::<i32>().ok()) else {
                break;
            };
            let ratio = record.get(1).and_then(parse_ratio).unwrap_or(0.0);
            dividends.insert(year, ratio);
        }

        debug!(path = %path.display(), years = dividends.len(), "loaded dividend table");
        Ok(dividends)
    }
}

fn read_error(path: &Path, err: csv::Error) -> LevsimError {
    LevsimError::DataRead {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell.trim(), fmt).ok())
}

/// Parses a price such as `$1,234.56`, rounded to cents.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(round_cents)
}

fn parse_volume(cell: &str) -> Option<i64> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<i64>().ok()
}

fn parse_ratio(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    match cell.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok().map(|v| v / 100.0),
        None => cell.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("dow.csv"),
            "Date,Open,High,Low,Close,Volume\n\
             01/04/2000,\"$11,501.85\",\"$11,522.01\",\"$11,305.69\",\"$11,357.51\",\"169,750,000\"\n\
             2000-01-03,11501.85,11522.01,11305.69,11501.85,\n\
             \"Jan 05, 2000\",11357.51,11350.06,11232.68,11447.58\n",
        )
        .unwrap();
        fs::write(
            path.join("trailing.csv"),
            "date,open,high,low,close\n\
             2020-01-02,10,10,10,10\n\
             2020-01-03,11,11,11,11\n\
             ,,,,\n\
             2020-01-06,12,12,12,12\n",
        )
        .unwrap();
        fs::write(path.join("empty.csv"), "date,open,high,low,close\n").unwrap();
        fs::write(
            path.join("bad.csv"),
            "date,open,high,low,close\n2020-01-02,10,10,10,ten\n",
        )
        .unwrap();
        fs::write(
            path.join("dividends.csv"),
            "year,dividend\n2000,1.5%\n2001,0.0175\n2002,n/a\ntotal,9\n2003,0.02\n",
        )
        .unwrap();

        (dir, CsvAdapter::new(path))
    }

    #[test]
    fn fetch_series_parses_formats_and_sorts() {
        let (_dir, adapter) = setup_test_data();
        let series = adapter.fetch_series("dow.csv").unwrap();

        assert_eq!(series.len(), 3);
        let obs = series.observations();
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2000, 1, 3).unwrap());
        assert_eq!(obs[0].volume, None);
        assert_eq!(obs[1].close, 11357.51);
        assert_eq!(obs[1].volume, Some(169_750_000));
        assert_eq!(obs[1].dollar_change, -144.34);
        assert_eq!(obs[2].date, NaiveDate::from_ymd_opt(2000, 1, 5).unwrap());
    }

    #[test]
    fn blank_row_ends_ingestion() {
        let (_dir, adapter) = setup_test_data();
        let series = adapter.fetch_series("trailing.csv").unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn empty_file_is_an_error() {
        let (_dir, adapter) = setup_test_data();
        assert!(matches!(
            adapter.fetch_series("empty.csv"),
            Err(LevsimError::EmptySeries { .. })
        ));
    }

    #[test]
    fn malformed_price_is_an_error() {
        let (_dir, adapter) = setup_test_data();
        let err = adapter.fetch_series("bad.csv").unwrap_err();
        match err {
            LevsimError::DataRead { reason, .. } => assert!(reason.contains("close")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let (_dir, adapter) = setup_test_data();
        assert!(matches!(
            adapter.fetch_series("nope.csv"),
            Err(LevsimError::DataRead { .. })
        ));
    }

    #[test]
    fn fetch_dividends_reads_until_bad_year() {
        let (_dir, adapter) = setup_test_data();
        let dividends = adapter.fetch_dividends("dividends.csv").unwrap();

        assert_eq!(dividends.len(), 3);
        assert_eq!(dividends[&2000], 0.015);
        assert_eq!(dividends[&2001], 0.0175);
        assert_eq!(dividends[&2002], 0.0);
        assert!(!dividends.contains_key(&2003));
    }

    #[test]
    fn parse_amount_strips_currency_formatting() {
        assert_eq!(parse_amount("$1,234.567"), Some(1234.57));
        assert_eq!(parse_amount(" 12 "), Some(12.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn parse_date_accepts_several_layouts() {
        let expected = NaiveDate::from_ymd_opt(1987, 10, 19);
        assert_eq!(parse_date("1987-10-19"), expected);
        assert_eq!(parse_date("10/19/1987"), expected);
        assert_eq!(parse_date("Oct 19, 1987"), expected);
        assert_eq!(parse_date("10/19/87"), expected);
        assert_eq!(parse_date("19.10.1987"), None);
    }
}
