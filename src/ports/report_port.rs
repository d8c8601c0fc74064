//! Report generation port trait.

use crate::domain::error::LevsimError;
use crate::domain::stats::StatsAggregator;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Add the best/worst trial drill-down and the threshold columns.
    pub extended: bool,
    /// Annual growth rate, as a ratio, that the threshold columns split on.
    pub cagr_threshold: f64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            extended: false,
            cagr_threshold: 0.0,
        }
    }
}

/// Port for rendering aggregated simulation results.
pub trait ReportPort {
    fn render(&self, stats: &StatsAggregator, settings: &ReportSettings) -> String;

    /// Default implementation: renders and writes the result to `output_path`.
    fn write(
        &self,
        stats: &StatsAggregator,
        settings: &ReportSettings,
        output_path: &Path,
    ) -> Result<(), LevsimError> {
        fs::write(output_path, self.render(stats, settings))?;
        Ok(())
    }
}
