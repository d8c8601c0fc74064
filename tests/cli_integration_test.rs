//! CLI integration tests for the simulate command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_simulation_config, build_instrument_table,
//!   build_specs, build_report_settings)
//! - Command-line overrides taking precedence over the file
//! - Full pipeline with MockSeriesPort
//! - Full pipeline with real CSV files and an output file on disk

mod common;

use common::*;
use levsim::adapters::csv_adapter::CsvAdapter;
use levsim::adapters::file_config_adapter::FileConfigAdapter;
use levsim::cli::{self, Overrides};
use levsim::domain::error::LevsimError;
use levsim::domain::instrument::InstrumentTable;
use levsim::domain::leverage::LeverageSpec;
use levsim::domain::simulation::TotalLossPolicy;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;

const VALID_INI: &str = r#"
[simulation]
initial_capital = 5000
leverage_ratios = 2.0, 2.5, 3.0
trials = 25
min_years = 1
max_years = 3
seed = 42
parallel = false
on_total_loss = exclude
blend = true

[data]
series = dow.csv
instrument = dow
dividends = dow_dividends.csv

[costs]
year_end_adjustment = true
include_dividends = true
charge_expenses = true

[tier:dow:4.0]
symbol = QDOW
expense_ratio = 0.0120
dividend_multiplier = 0.05

[report]
extended = true
cagr_threshold = 0.05
"#;

fn adapter(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

fn dividends() -> BTreeMap<i32, f64> {
    (1995..=2010).map(|y| (y, 0.02)).collect()
}

fn mock_port() -> MockSeriesPort {
    MockSeriesPort::new()
        .with_series("dow.csv", make_trading_series(date(1996, 1, 2), 2_500))
        .with_dividends("dow_dividends.csv", dividends())
}

mod config_loading {
    use super::*;

    #[test]
    fn build_simulation_config_reads_every_key() {
        let cfg = cli::build_simulation_config(&adapter(VALID_INI), &Overrides::default()).unwrap();
        assert_eq!(cfg.trials, 25);
        assert_eq!(cfg.seed, Some(42));
        assert!(!cfg.parallel);
        assert_eq!(cfg.on_total_loss, TotalLossPolicy::Exclude);
        assert_eq!(cfg.bounds.min_years, 1.0);
        assert_eq!(cfg.bounds.max_years, 3.0);
        assert_eq!(cfg.bounds.min_start_year, None);
        assert_eq!(cfg.engine.initial_capital, 5000.0);
        assert!(cfg.engine.year_end_adjustment);
    }

    #[test]
    fn build_simulation_config_uses_defaults() {
        let cfg = cli::build_simulation_config(&adapter("[simulation]\n"), &Overrides::default())
            .unwrap();
        assert_eq!(cfg.trials, 1000);
        assert_eq!(cfg.seed, None);
        assert!(cfg.parallel);
        assert_eq!(cfg.on_total_loss, TotalLossPolicy::Abort);
        assert_eq!(cfg.bounds.min_years, 2.0);
        assert_eq!(cfg.bounds.max_years, 20.0);
        assert_eq!(cfg.engine.initial_capital, 10_000.0);
    }

    #[test]
    fn overrides_take_precedence() {
        let overrides = Overrides {
            seed: Some(7),
            trials: Some(3),
            ..Overrides::default()
        };
        let cfg = cli::build_simulation_config(&adapter(VALID_INI), &overrides).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.trials, 3);
    }

    #[test]
    fn zero_trials_override_is_rejected() {
        let overrides = Overrides {
            trials: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            cli::build_simulation_config(&adapter(VALID_INI), &overrides),
            Err(LevsimError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn tier_sections_extend_builtin_table() {
        let table = cli::build_instrument_table(&adapter(VALID_INI)).unwrap();
        let ratios: Vec<f64> = table.tiers("dow").iter().map(|t| t.ratio).collect();
        assert_eq!(ratios, vec![1.0, 2.0, 3.0, 4.0]);
        let added = table.tier_for("dow", 4.0).unwrap();
        assert_eq!(added.info.symbol, "QDOW");
        assert_eq!(added.info.expense_ratio, 0.012);
    }

    #[test]
    fn tier_section_overrides_keep_unset_fields() {
        let table = cli::build_instrument_table(&adapter(
            "[tier:sp500:2.0]\nexpense_ratio = 0.0100\n",
        ))
        .unwrap();
        let tier = table.tier_for("sp500", 2.0).unwrap();
        assert_eq!(tier.info.symbol, "SSO");
        assert_eq!(tier.info.expense_ratio, 0.01);
        assert_eq!(tier.info.dividend_multiplier, 0.2);
    }

    #[test]
    fn build_specs_blends_between_tiers_and_adds_baseline() {
        let cfg = adapter(VALID_INI);
        let table = InstrumentTable::builtin();
        let specs = cli::build_specs(&cfg, &table, "dow").unwrap();
        assert_eq!(
            specs,
            vec![
                LeverageSpec::Single(2.0),
                LeverageSpec::blended(2.5, 2.0, 3.0),
                LeverageSpec::Single(3.0),
                LeverageSpec::Single(1.0),
            ]
        );
    }

    #[test]
    fn build_specs_without_blending_holds_directly() {
        let cfg = adapter("[simulation]\nleverage_ratios = 1.5\nblend = false\n");
        let specs = cli::build_specs(&cfg, &InstrumentTable::builtin(), "dow").unwrap();
        assert_eq!(
            specs,
            vec![LeverageSpec::Single(1.5), LeverageSpec::Single(1.0)]
        );
    }

    #[test]
    fn build_report_settings_reads_threshold() {
        let settings = cli::build_report_settings(&adapter(VALID_INI)).unwrap();
        assert!(settings.extended);
        assert_eq!(settings.cagr_threshold, 0.05);
    }

    #[test]
    fn build_cost_settings_toggles() {
        let settings = cli::build_cost_settings(&adapter(
            "[costs]\ninclude_dividends = false\n",
        ));
        assert!(!settings.include_dividends);
        assert!(settings.charge_expenses);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = cli::load_config(std::path::Path::new("/nonexistent/levsim.ini")).unwrap_err();
        assert!(matches!(err, LevsimError::ConfigParse { .. }));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn execute_with_mock_series_port() {
        let output = cli::execute(&adapter(VALID_INI), &mock_port(), &Overrides::default()).unwrap();

        assert_eq!(output.result.seed, 42);
        assert_eq!(output.result.stats.window_count(), 25);
        assert_eq!(output.result.stats.stats().len(), 4);
        assert!(output.summary.contains("Leverage Ratio: 2.5 (2.0/3.0 blend)"));
        assert!(output.table.starts_with("Leverage Ratio\tAverage CAGR (%)"));
        assert!(output.table.contains("Best CAGR Info:"));
        assert!(output.table_path.is_none());
    }

    #[test]
    fn execute_is_repeatable_with_seed() {
        let first = cli::execute(&adapter(VALID_INI), &mock_port(), &Overrides::default()).unwrap();
        let second = cli::execute(&adapter(VALID_INI), &mock_port(), &Overrides::default()).unwrap();
        assert_eq!(first.table, second.table);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn data_override_replaces_configured_series() {
        let port = mock_port().with_series("other.csv", make_trading_series(date(2001, 1, 2), 1_500));
        let overrides = Overrides {
            data: Some("other.csv".to_string()),
            trials: Some(5),
            ..Overrides::default()
        };
        let output = cli::execute(&adapter(VALID_INI), &port, &overrides).unwrap();
        for window in &output.result.windows {
            assert!(window.start_date() >= date(2001, 1, 2));
        }
    }

    #[test]
    fn missing_series_key_is_a_config_error() {
        let ini = VALID_INI.replace("series = dow.csv\n", "");
        let err = cli::execute(&adapter(&ini), &mock_port(), &Overrides::default()).unwrap_err();
        assert!(matches!(err, LevsimError::ConfigMissing { .. }));
    }

    #[test]
    fn unknown_instrument_is_rejected() {
        let ini = VALID_INI.replace("instrument = dow", "instrument = ftse");
        let err = cli::execute(&adapter(&ini), &mock_port(), &Overrides::default()).unwrap_err();
        match err {
            LevsimError::ConfigInvalid { key, .. } => assert_eq!(key, "instrument"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn series_too_short_for_bounds_fails_before_trials() {
        let port = mock_port().with_series("dow.csv", make_trading_series(date(2010, 1, 4), 200));
        let err = cli::execute(&adapter(VALID_INI), &port, &Overrides::default()).unwrap_err();
        assert!(matches!(err, LevsimError::NoSamplingRange { .. }));
    }

    #[test]
    fn flat_decay_runs_without_dividend_table() {
        let ini = VALID_INI
            .replace("dividends = dow_dividends.csv\n", "")
            .replace("[costs]\n", "[costs]\nflat_decay = 0.01\n");
        let port = MockSeriesPort::new()
            .with_series("dow.csv", make_trading_series(date(1996, 1, 2), 2_500));
        let output = cli::execute(&adapter(&ini), &port, &Overrides::default()).unwrap();
        assert_eq!(output.result.stats.window_count(), 25);
    }
}

mod on_disk {
    use super::*;

    fn write_series_csv(path: &std::path::Path) {
        let series = make_trading_series(date(1998, 1, 2), 1_800);
        let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
        for obs in series.observations() {
            let _ = writeln!(
                csv,
                "{},{:.2},{:.2},{:.2},\"${:.2}\",1000",
                obs.date.format("%m/%d/%Y"),
                obs.open,
                obs.high,
                obs.low,
                obs.close
            );
        }
        fs::write(path, csv).unwrap();
    }

    #[test]
    fn execute_with_csv_files_writes_output() {
        let dir = tempfile::TempDir::new().unwrap();
        write_series_csv(&dir.path().join("dow.csv"));
        fs::write(
            dir.path().join("dow_dividends.csv"),
            "year,dividend\n1998,1.6%\n1999,1.5%\n2000,1.4%\n2001,1.5%\n2002,1.8%\n2003,2.0%\n2004,2.1%\n",
        )
        .unwrap();
        let output_path = dir.path().join("results.tsv");

        let config = adapter(VALID_INI);
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let overrides = Overrides {
            output: Some(output_path.clone()),
            ..Overrides::default()
        };
        let output = cli::execute(&config, &port, &overrides).unwrap();

        assert_eq!(output.table_path.as_deref(), Some(output_path.as_path()));
        let written = fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, output.table);
        assert_eq!(written.lines().next().unwrap().split('\t').count(), 21);
    }

    #[test]
    fn configured_output_resolves_against_config_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        write_series_csv(&dir.path().join("dow.csv"));
        fs::write(dir.path().join("dow_dividends.csv"), "year,dividend\n1998,1.6%\n").unwrap();
        let ini = VALID_INI.replace("[report]\n", "[report]\noutput = out/results.tsv\n");
        fs::create_dir(dir.path().join("out")).unwrap();

        let config = adapter(&ini);
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let overrides = Overrides {
            config_dir: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        };
        let expected = dir.path().join("out").join("results.tsv");
        assert_eq!(cli::resolve_output_path(&config, &overrides), Some(expected.clone()));

        let output = cli::execute(&config, &port, &overrides).unwrap();
        assert_eq!(output.table_path, Some(expected.clone()));
        assert_eq!(fs::read_to_string(&expected).unwrap(), output.table);
    }

    #[test]
    fn command_line_output_wins_over_config() {
        let ini = VALID_INI.replace("[report]\n", "[report]\noutput = results.tsv\n");
        let overrides = Overrides {
            output: Some("/tmp/elsewhere.tsv".into()),
            config_dir: Some("/data/runs".into()),
            ..Overrides::default()
        };
        assert_eq!(
            cli::resolve_output_path(&adapter(&ini), &overrides),
            Some("/tmp/elsewhere.tsv".into())
        );
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("levsim.ini");
        fs::write(&path, VALID_INI).unwrap();
        let config = cli::load_config(&path).unwrap();
        let cfg = cli::build_simulation_config(&config, &Overrides::default()).unwrap();
        assert_eq!(cfg.trials, 25);
    }
}
