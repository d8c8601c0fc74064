//! Monte-Carlo driver: draws windows, holds every leverage spec over each
//! one and feeds the results to a [`StatsAggregator`].

use crate::domain::compounding::{CompoundingEngine, EngineSettings, TotalLoss, TrialOutcome};
use crate::domain::error::LevsimError;
use crate::domain::leverage::LeverageSpec;
use crate::domain::observation::DailySeries;
use crate::domain::sampling::{SamplingBounds, SamplingEngine};
use crate::domain::stats::StatsAggregator;
use crate::domain::window::HoldingWindow;
use crate::ports::cost_port::CostDividendPort;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::str::FromStr;
use tracing::{info, warn};

/// What to do when a trial's value reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalLossPolicy {
    /// Stop the whole run with [`LevsimError::TotalLoss`].
    #[default]
    Abort,
    /// Leave the window out of the aggregates and count the loss.
    Exclude,
}

impl FromStr for TotalLossPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(TotalLossPolicy::Abort),
            "exclude" => Ok(TotalLossPolicy::Exclude),
            other => Err(format!("unknown total loss policy '{other}' (expected abort or exclude)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub trials: usize,
    pub bounds: SamplingBounds,
    /// Fixed seed for reproducible runs; drawn at random when absent.
    pub seed: Option<u64>,
    pub parallel: bool,
    pub on_total_loss: TotalLossPolicy,
    pub engine: EngineSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            bounds: SamplingBounds::default(),
            seed: None,
            parallel: true,
            on_total_loss: TotalLossPolicy::Abort,
            engine: EngineSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub stats: StatsAggregator,
    pub windows: Vec<HoldingWindow>,
    pub seed: u64,
}

type WindowOutcomes = Vec<Result<TrialOutcome, TotalLoss>>;

/// Runs `config.trials` windows over `series` for every spec in `specs`.
///
/// Windows are drawn one after another from a single seeded generator, so
/// the same seed gives the same windows whether or not trials are evaluated
/// in parallel.
pub fn run_simulation(
    series: &DailySeries,
    costs: &dyn CostDividendPort,
    specs: &[LeverageSpec],
    config: &SimulationConfig,
) -> Result<SimulationResult, LevsimError> {
    let sampler = SamplingEngine::new(series, config.bounds);
    sampler.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let windows = (0..config.trials)
        .map(|_| sampler.sample(&mut rng))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        trials = config.trials,
        ratios = specs.len(),
        seed,
        parallel = config.parallel,
        "running simulation"
    );

    let engine = CompoundingEngine::new(series, costs, config.engine);
    let evaluate = |window: &HoldingWindow| -> WindowOutcomes {
        specs
            .iter()
            .map(|spec| engine.run_trial(window, spec))
            .collect()
    };
    let evaluated: Vec<WindowOutcomes> = if config.parallel {
        windows.par_iter().map(evaluate).collect()
    } else {
        windows.iter().map(evaluate).collect()
    };

    let mut stats = StatsAggregator::new(specs);
    let mut kept = Vec::with_capacity(windows.len());
    for (window, outcomes) in windows.into_iter().zip(evaluated) {
        let mut recorded = Vec::with_capacity(outcomes.len());
        let mut losses: Vec<(usize, TotalLoss)> = Vec::new();
        for (i, result) in outcomes.into_iter().enumerate() {
            match result {
                Ok(outcome) => recorded.push(outcome),
                Err(loss) => losses.push((i, loss)),
            }
        }

        if losses.is_empty() {
            stats.record_window(recorded);
            kept.push(window);
            continue;
        }

        match config.on_total_loss {
            TotalLossPolicy::Abort => {
                let (_, loss) = losses.remove(0);
                return Err(loss.into());
            }
            TotalLossPolicy::Exclude => {
                for (_, loss) in &losses {
                    warn!(
                        start = %window.start_date(),
                        end = %window.end_date(),
                        "{loss}; window excluded"
                    );
                }
                stats.record_excluded(losses);
            }
        }
    }

    info!(
        recorded = stats.window_count(),
        excluded = stats.excluded_windows(),
        "simulation finished"
    );

    Ok(SimulationResult {
        stats,
        windows: kept,
        seed,
    })
}
