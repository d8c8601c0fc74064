//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReport;
use crate::adapters::tsv_report::TsvReport;
use crate::domain::compounding::{DEFAULT_INITIAL_CAPITAL, EngineSettings};
use crate::domain::config_validation::{
    optional_value, parse_tier_section, validate_data_config, validate_report_config,
    validate_simulation_config,
};
use crate::domain::error::LevsimError;
use crate::domain::instrument::{CostSettings, CostTable, InstrumentTable, TierInfo};
use crate::domain::leverage::{LeverageSpec, format_ratio, parse_ratios, with_baseline};
use crate::domain::sampling::SamplingBounds;
use crate::domain::simulation::{SimulationConfig, SimulationResult, run_simulation};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::{ReportPort, ReportSettings};
use crate::ports::series_port::SeriesPort;

pub const DEFAULT_INSTRUMENT: &str = "dow";
pub const DEFAULT_RATIOS: [f64; 3] = [1.0, 2.0, 3.0];

#[derive(Parser, Debug)]
#[command(
    name = "levsim",
    about = "Monte-Carlo comparison of leveraged index funds over historical holding periods"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Price series CSV, overriding [data] series
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        trials: Option<usize>,
        /// Write the tab-separated overview here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a price series and check that its daily changes replay to the last close
    Verify {
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data: Option<String>,
    pub seed: Option<u64>,
    pub trials: Option<usize>,
    pub output: Option<PathBuf>,
    /// Directory of the config file; relative `[report] output` paths
    /// resolve against it.
    pub config_dir: Option<PathBuf>,
}

/// Everything a simulate run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub result: SimulationResult,
    pub summary: String,
    pub table: String,
    /// Where the table was written, when it was not meant for stdout.
    pub table_path: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            data,
            seed,
            trials,
            output,
        } => {
            let overrides = Overrides {
                data: data.map(|p| absolute(&p).display().to_string()),
                seed,
                trials,
                output: output.map(|p| absolute(&p)),
                config_dir: Some(config_dir(&config)),
            };
            run_simulate(&config, &overrides)
        }
        Command::Verify { data } => run_verify(&data),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, LevsimError> {
    FileConfigAdapter::from_file(path).map_err(|e| LevsimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn fail(err: &LevsimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Relative paths in a config file are resolved against its directory.
fn config_dir(path: &Path) -> PathBuf {
    absolute(path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run_simulate(config_path: &Path, overrides: &Overrides) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let series_port = CsvAdapter::new(config_dir(config_path));

    match execute(&adapter, &series_port, overrides) {
        Ok(output) => {
            println!("{}", output.summary);
            match &output.table_path {
                Some(path) => info!(path = %path.display(), "overview written"),
                None => println!("Total results:\n{}", output.table),
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_verify(data_path: &Path) -> ExitCode {
    let port = CsvAdapter::default();
    let source = absolute(data_path).display().to_string();
    let series = match port.fetch_series(&source) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if let Err(e) = series.verify_consistency() {
        return fail(&e);
    }
    if let Some((first, last)) = series.date_range() {
        println!("{}: {} observations", data_path.display(), series.len());
        println!("  First date: {first}");
        println!("  Last date:  {last}");
    }
    println!("Series is consistent.");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let checked = validate_all(&adapter, &Overrides::default()).and_then(|()| {
        let table = build_instrument_table(&adapter)?;
        let instrument = resolve_instrument(&adapter, &table)?;
        let specs = build_specs(&adapter, &table, &instrument)?;
        Ok((instrument, specs))
    });
    let (instrument, specs) = match checked {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    eprintln!("\nInstrument: {instrument}");
    eprintln!("Leverage ratios:");
    for spec in &specs {
        eprintln!("  {spec}");
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn validate_all(config: &dyn ConfigPort, overrides: &Overrides) -> Result<(), LevsimError> {
    validate_simulation_config(config)?;
    validate_data_config(config, overrides.data.is_some())?;
    validate_report_config(config)
}

pub fn build_simulation_config(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<SimulationConfig, LevsimError> {
    let defaults = SimulationConfig::default();
    let trials = match overrides.trials {
        Some(t) => t,
        None => usize::try_from(config.get_int("simulation", "trials", defaults.trials as i64))
            .unwrap_or(0),
    };
    if trials == 0 {
        return Err(LevsimError::ConfigInvalid {
            section: "simulation".into(),
            key: "trials".into(),
            reason: "trials must be at least 1".into(),
        });
    }

    let bounds = SamplingBounds {
        min_years: config.get_double("simulation", "min_years", defaults.bounds.min_years),
        max_years: config.get_double("simulation", "max_years", defaults.bounds.max_years),
        min_start_year: optional_value(config, "simulation", "min_start_year")?,
        max_end_year: optional_value(config, "simulation", "max_end_year")?,
    };

    Ok(SimulationConfig {
        trials,
        bounds,
        seed: match overrides.seed {
            Some(seed) => Some(seed),
            None => optional_value(config, "simulation", "seed")?,
        },
        parallel: config.get_bool("simulation", "parallel", defaults.parallel),
        on_total_loss: optional_value(config, "simulation", "on_total_loss")?
            .unwrap_or(defaults.on_total_loss),
        engine: EngineSettings {
            initial_capital: config.get_double(
                "simulation",
                "initial_capital",
                DEFAULT_INITIAL_CAPITAL,
            ),
            year_end_adjustment: config.get_bool("costs", "year_end_adjustment", true),
        },
    })
}

/// Built-in tiers plus any `[tier:<instrument>:<ratio>]` sections.
pub fn build_instrument_table(config: &dyn ConfigPort) -> Result<InstrumentTable, LevsimError> {
    let mut table = InstrumentTable::builtin();
    for section in config.sections() {
        let Some(parsed) = parse_tier_section(&section) else {
            continue;
        };
        let (instrument, ratio) = parsed?;
        let existing = table.tiers(&instrument).iter().find(|t| t.ratio == ratio);
        let symbol = config
            .get_string(&section, "symbol")
            .or_else(|| existing.map(|t| t.info.symbol.clone()))
            .unwrap_or_else(|| format!("{}x {instrument}", format_ratio(ratio)));
        let expense_ratio = optional_value(config, &section, "expense_ratio")?
            .or_else(|| existing.map(|t| t.info.expense_ratio))
            .unwrap_or(0.0);
        let dividend_multiplier = optional_value(config, &section, "dividend_multiplier")?
            .or_else(|| existing.map(|t| t.info.dividend_multiplier))
            .unwrap_or(0.0);
        table.insert(
            &instrument,
            ratio,
            TierInfo {
                symbol,
                expense_ratio,
                dividend_multiplier,
            },
        );
    }
    Ok(table)
}

pub fn build_cost_settings(config: &dyn ConfigPort) -> CostSettings {
    let defaults = CostSettings::default();
    CostSettings {
        include_dividends: config.get_bool("costs", "include_dividends", defaults.include_dividends),
        charge_expenses: config.get_bool("costs", "charge_expenses", defaults.charge_expenses),
    }
}

pub fn build_report_settings(config: &dyn ConfigPort) -> Result<ReportSettings, LevsimError> {
    let defaults = ReportSettings::default();
    Ok(ReportSettings {
        extended: config.get_bool("report", "extended", defaults.extended),
        cagr_threshold: optional_value(config, "report", "cagr_threshold")?
            .unwrap_or(defaults.cagr_threshold),
    })
}

fn resolve_instrument(
    config: &dyn ConfigPort,
    table: &InstrumentTable,
) -> Result<String, LevsimError> {
    let instrument = config
        .get_string("data", "instrument")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string());
    if !table.contains(&instrument) {
        return Err(LevsimError::ConfigInvalid {
            section: "data".into(),
            key: "instrument".into(),
            reason: format!("unknown instrument '{instrument}'"),
        });
    }
    Ok(instrument)
}

/// Configured ratios (1.0 always included) mapped to what gets simulated.
pub fn build_specs(
    config: &dyn ConfigPort,
    table: &InstrumentTable,
    instrument: &str,
) -> Result<Vec<LeverageSpec>, LevsimError> {
    let ratios = match config.get_string("simulation", "leverage_ratios") {
        Some(raw) => parse_ratios(&raw).map_err(|reason| LevsimError::ConfigInvalid {
            section: "simulation".into(),
            key: "leverage_ratios".into(),
            reason,
        })?,
        None => with_baseline(DEFAULT_RATIOS.to_vec()),
    };
    let blend = config.get_bool("simulation", "blend", true);
    Ok(ratios
        .into_iter()
        .map(|r| table.spec_for(instrument, r, blend))
        .collect())
}

fn build_costs(
    config: &dyn ConfigPort,
    series_port: &dyn SeriesPort,
    table: &InstrumentTable,
    instrument: &str,
) -> Result<CostTable, LevsimError> {
    if let Some(rate) = optional_value::<f64>(config, "costs", "flat_decay")? {
        info!(rate, "using flat year-end decay for leveraged ratios");
        return Ok(CostTable::flat_decay(rate));
    }
    let settings = build_cost_settings(config);
    let dividends = match config.get_string("data", "dividends") {
        Some(source) if !source.trim().is_empty() => series_port.fetch_dividends(source.trim())?,
        _ => {
            if settings.include_dividends {
                warn!("no [data] dividends table configured; dividends count as zero");
            }
            Default::default()
        }
    };
    Ok(CostTable::new(table, instrument, dividends, settings))
}

/// Where the overview table goes: `--output` first, then `[report] output`
/// relative to the config file's directory. `None` means stdout.
pub fn resolve_output_path(config: &dyn ConfigPort, overrides: &Overrides) -> Option<PathBuf> {
    if let Some(path) = &overrides.output {
        return Some(path.clone());
    }
    let configured = config
        .get_string("report", "output")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))?;
    match &overrides.config_dir {
        Some(dir) if configured.is_relative() => Some(dir.join(configured)),
        _ => Some(configured),
    }
}

/// Loads, simulates and renders. Fatal problems surface before any report
/// is produced.
pub fn execute(
    config: &dyn ConfigPort,
    series_port: &dyn SeriesPort,
    overrides: &Overrides,
) -> Result<RunOutput, LevsimError> {
    validate_all(config, overrides)?;

    let sim_config = build_simulation_config(config, overrides)?;
    let report_settings = build_report_settings(config)?;
    let table = build_instrument_table(config)?;
    let instrument = resolve_instrument(config, &table)?;
    let specs = build_specs(config, &table, &instrument)?;
    let costs = build_costs(config, series_port, &table, &instrument)?;

    let source = match &overrides.data {
        Some(data) => data.clone(),
        None => config
            .get_string("data", "series")
            .map(|s| s.trim().to_string())
            .ok_or_else(|| LevsimError::ConfigMissing {
                section: "data".into(),
                key: "series".into(),
            })?,
    };
    info!(source = %source, instrument = %instrument, "loading price series");
    let series = series_port.fetch_series(&source)?;
    series.verify_consistency()?;

    let result = run_simulation(&series, &costs, &specs, &sim_config)?;
    info!(seed = result.seed, "seed used for this run");

    let summary = TextReport.render(&result.stats, &report_settings);
    let table_text = TsvReport.render(&result.stats, &report_settings);

    let output_path = resolve_output_path(config, overrides);
    if let Some(path) = &output_path {
        TsvReport.write(&result.stats, &report_settings, path)?;
    }

    Ok(RunOutput {
        result,
        summary,
        table: table_text,
        table_path: output_path,
    })
}
