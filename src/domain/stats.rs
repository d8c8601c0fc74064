//! Per-leverage aggregation of trial outcomes.

use crate::domain::calendar::scalar_year;
use crate::domain::compounding::{TotalLoss, TrialOutcome};
use crate::domain::error::LevsimError;
use crate::domain::leverage::LeverageSpec;

/// Numeric field of a trial that summaries can be taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CompoundGrowth,
    DollarReturn,
    ReturnRatio,
}

impl Metric {
    pub fn of(&self, record: &TrialRecord) -> f64 {
        match self {
            Metric::CompoundGrowth => record.outcome.compound_growth,
            Metric::DollarReturn => record.outcome.dollar_return,
            Metric::ReturnRatio => record.outcome.return_ratio,
        }
    }
}

/// A best or worst value and the trial it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extreme {
    pub value: f64,
    pub index: usize,
}

/// One trial for one leverage, with how it ranked against the other ratios
/// held over the same window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub outcome: TrialOutcome,
    pub was_largest: bool,
    pub beat_baseline: bool,
    pub start_year: f64,
    pub end_year: f64,
    pub holding_years: f64,
}

impl TrialRecord {
    pub fn new(outcome: TrialOutcome, was_largest: bool, beat_baseline: bool) -> Self {
        let start_year = scalar_year(outcome.start_date);
        let end_year = scalar_year(outcome.end_date);
        Self {
            outcome,
            was_largest,
            beat_baseline,
            start_year,
            end_year,
            holding_years: end_year - start_year,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeverageStats {
    spec: LeverageSpec,
    records: Vec<TrialRecord>,
    losses: Vec<TotalLoss>,
}

impl LeverageStats {
    pub fn new(spec: LeverageSpec) -> Self {
        Self {
            spec,
            records: Vec::new(),
            losses: Vec::new(),
        }
    }

    pub fn spec(&self) -> &LeverageSpec {
        &self.spec
    }

    pub fn ratio(&self) -> f64 {
        self.spec.ratio()
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Result<&TrialRecord, LevsimError> {
        self.records.get(index).ok_or(LevsimError::IndexOutOfRange {
            index,
            count: self.records.len(),
        })
    }

    /// Windows excluded because this ratio was wiped out.
    pub fn losses(&self) -> &[TotalLoss] {
        &self.losses
    }

    pub fn average(&self, metric: Metric) -> Option<f64> {
        mean(self.records.iter().map(|r| metric.of(r)))
    }

    /// Largest value; the first trial wins ties.
    pub fn best(&self, metric: Metric) -> Option<Extreme> {
        self.extreme(metric, |candidate, current| candidate > current)
    }

    /// Smallest value; the first trial wins ties.
    pub fn worst(&self, metric: Metric) -> Option<Extreme> {
        self.extreme(metric, |candidate, current| candidate < current)
    }

    fn extreme(&self, metric: Metric, replaces: impl Fn(f64, f64) -> bool) -> Option<Extreme> {
        let mut found: Option<Extreme> = None;
        for (index, record) in self.records.iter().enumerate() {
            let value = metric.of(record);
            if found.is_none_or(|e| replaces(value, e.value)) {
                found = Some(Extreme { value, index });
            }
        }
        found
    }

    pub fn largest_count(&self) -> usize {
        self.records.iter().filter(|r| r.was_largest).count()
    }

    pub fn largest_frequency(&self) -> Option<f64> {
        self.frequency(self.largest_count())
    }

    pub fn beat_baseline_count(&self) -> usize {
        self.records.iter().filter(|r| r.beat_baseline).count()
    }

    pub fn beat_baseline_frequency(&self) -> Option<f64> {
        self.frequency(self.beat_baseline_count())
    }

    pub fn average_start_year(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.start_year))
    }

    pub fn average_end_year(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.end_year))
    }

    pub fn average_holding_years(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.holding_years))
    }

    /// Share of trials whose `metric` is below `threshold`.
    pub fn frequency_below(&self, metric: Metric, threshold: f64) -> Option<f64> {
        let below = self
            .records
            .iter()
            .filter(|r| metric.of(r) < threshold)
            .count();
        self.frequency(below)
    }

    /// Mean of `metric` over trials below `threshold`; `None` when none are.
    pub fn average_below(&self, metric: Metric, threshold: f64) -> Option<f64> {
        mean(
            self.records
                .iter()
                .map(|r| metric.of(r))
                .filter(|v| *v < threshold),
        )
    }

    /// Mean of `metric` over trials at or above `threshold`.
    pub fn average_at_or_above(&self, metric: Metric, threshold: f64) -> Option<f64> {
        mean(
            self.records
                .iter()
                .map(|r| metric.of(r))
                .filter(|v| *v >= threshold),
        )
    }

    fn frequency(&self, count: usize) -> Option<f64> {
        if self.records.is_empty() {
            None
        } else {
            Some(count as f64 / self.records.len() as f64)
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Collects outcomes window by window for a fixed, ordered set of leverage
/// specs.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    by_ratio: Vec<LeverageStats>,
    excluded_windows: usize,
}

impl StatsAggregator {
    pub fn new(specs: &[LeverageSpec]) -> Self {
        Self {
            by_ratio: specs.iter().copied().map(LeverageStats::new).collect(),
            excluded_windows: 0,
        }
    }

    /// Records one window. `outcomes` must follow the spec order given to
    /// [`StatsAggregator::new`].
    pub fn record_window(&mut self, outcomes: Vec<TrialOutcome>) {
        debug_assert_eq!(outcomes.len(), self.by_ratio.len());

        let mut largest: Option<usize> = None;
        for (i, outcome) in outcomes.iter().enumerate() {
            if largest.is_none_or(|l| outcome.dollar_return > outcomes[l].dollar_return) {
                largest = Some(i);
            }
        }
        let baseline = outcomes
            .iter()
            .find(|o| o.leverage.is_baseline())
            .map(|o| o.dollar_return);

        for (i, (stats, outcome)) in self.by_ratio.iter_mut().zip(outcomes).enumerate() {
            let beat_baseline = baseline.is_some_and(|b| outcome.dollar_return > b);
            stats.push(TrialRecord::new(outcome, largest == Some(i), beat_baseline));
        }
    }

    /// Records a window left out of the aggregates because some ratios were
    /// wiped out; `losses` pairs the spec index with its loss.
    pub fn record_excluded(&mut self, losses: Vec<(usize, TotalLoss)>) {
        self.excluded_windows += 1;
        for (index, loss) in losses {
            if let Some(stats) = self.by_ratio.get_mut(index) {
                stats.losses.push(loss);
            }
        }
    }

    pub fn stats(&self) -> &[LeverageStats] {
        &self.by_ratio
    }

    pub fn get(&self, ratio: f64) -> Option<&LeverageStats> {
        self.by_ratio
            .iter()
            .find(|s| (s.ratio() - ratio).abs() < 1e-9)
    }

    /// Windows recorded into the aggregates.
    pub fn window_count(&self) -> usize {
        self.by_ratio.first().map_or(0, LeverageStats::len)
    }

    pub fn excluded_windows(&self) -> usize {
        self.excluded_windows
    }

    /// Outcomes of every ratio for the `index`-th recorded window.
    pub fn window(&self, index: usize) -> Result<Vec<&TrialOutcome>, LevsimError> {
        self.by_ratio
            .iter()
            .map(|s| s.record(index).map(|r| &r.outcome))
            .collect()
    }
}
