//! Daily price series and dividend table ports.

use crate::domain::error::LevsimError;
use crate::domain::observation::DailySeries;
use std::collections::BTreeMap;

pub trait SeriesPort {
    /// Loads the full daily series for `source` (a file path for the CSV
    /// adapter).
    fn fetch_series(&self, source: &str) -> Result<DailySeries, LevsimError>;

    /// Loads the per-year dividend ratio of the unleveraged index.
    fn fetch_dividends(&self, source: &str) -> Result<BTreeMap<i32, f64>, LevsimError>;
}
