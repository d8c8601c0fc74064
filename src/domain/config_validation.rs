//! Configuration validation.
//!
//! Validates all config fields before a simulation runs.

use crate::domain::error::LevsimError;
use crate::domain::leverage::parse_ratios;
use crate::domain::simulation::TotalLossPolicy;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub const TIER_SECTION_PREFIX: &str = "tier:";

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    validate_initial_capital(config)?;
    validate_leverage_ratios(config)?;
    validate_trials(config)?;
    validate_holding_years(config)?;
    validate_calendar_bounds(config)?;
    optional_value::<u64>(config, "simulation", "seed")?;
    optional_value::<TotalLossPolicy>(config, "simulation", "on_total_loss")?;
    Ok(())
}

pub fn validate_data_config(
    config: &dyn ConfigPort,
    series_override: bool,
) -> Result<(), LevsimError> {
    if !series_override {
        match config.get_string("data", "series") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(LevsimError::ConfigMissing {
                    section: "data".to_string(),
                    key: "series".to_string(),
                });
            }
        }
    }
    validate_flat_decay(config)?;
    validate_tier_sections(config)
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    if let Some(threshold) = optional_value::<f64>(config, "report", "cagr_threshold")? {
        if !threshold.is_finite() {
            return Err(invalid("report", "cagr_threshold", "cagr_threshold must be finite"));
        }
    }
    Ok(())
}

/// Parses `[section] key` when present. A present but unparsable value is an
/// error rather than a silent default.
pub fn optional_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, LevsimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            invalid(section, key, &format!("'{}' is not a valid {key}", raw.trim()))
        }),
    }
}

/// Splits a `tier:<instrument>:<ratio>` section name.
pub fn parse_tier_section(section: &str) -> Option<Result<(String, f64), LevsimError>> {
    let rest = section.strip_prefix(TIER_SECTION_PREFIX)?;
    let parsed = match rest.rsplit_once(':') {
        Some((instrument, ratio)) if !instrument.trim().is_empty() => ratio
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r > 0.0)
            .map(|r| (instrument.trim().to_lowercase(), r)),
        _ => None,
    };
    Some(parsed.ok_or_else(|| {
        invalid(
            section,
            "section",
            "tier sections are named [tier:<instrument>:<leverage>] with a positive leverage",
        )
    }))
}

fn invalid(section: &str, key: &str, reason: &str) -> LevsimError {
    LevsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    let value = optional_value::<f64>(config, "simulation", "initial_capital")?.unwrap_or(10_000.0);
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid(
            "simulation",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_leverage_ratios(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    if let Some(raw) = config.get_string("simulation", "leverage_ratios") {
        parse_ratios(&raw).map_err(|reason| invalid("simulation", "leverage_ratios", &reason))?;
    }
    Ok(())
}

fn validate_trials(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    if optional_value::<i64>(config, "simulation", "trials")?.unwrap_or(1000) < 1 {
        return Err(invalid("simulation", "trials", "trials must be at least 1"));
    }
    Ok(())
}

fn validate_holding_years(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    let min_years = optional_value::<f64>(config, "simulation", "min_years")?.unwrap_or(2.0);
    let max_years = optional_value::<f64>(config, "simulation", "max_years")?.unwrap_or(20.0);
    if !(min_years > 0.0) || !min_years.is_finite() {
        return Err(invalid("simulation", "min_years", "min_years must be positive"));
    }
    if !max_years.is_finite() {
        return Err(invalid("simulation", "max_years", "max_years must be finite"));
    }
    if max_years < min_years {
        return Err(invalid(
            "simulation",
            "max_years",
            "max_years must not be less than min_years",
        ));
    }
    Ok(())
}

fn validate_calendar_bounds(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    let min_start = optional_value::<i32>(config, "simulation", "min_start_year")?;
    let max_end = optional_value::<i32>(config, "simulation", "max_end_year")?;
    if let (Some(start), Some(end)) = (min_start, max_end) {
        if start > end {
            return Err(invalid(
                "simulation",
                "min_start_year",
                "min_start_year must not be after max_end_year",
            ));
        }
    }
    Ok(())
}

fn validate_flat_decay(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    if let Some(rate) = optional_value::<f64>(config, "costs", "flat_decay")? {
        if !(0.0..1.0).contains(&rate) {
            return Err(invalid("costs", "flat_decay", "flat_decay must be between 0 and 1"));
        }
    }
    Ok(())
}

fn validate_tier_sections(config: &dyn ConfigPort) -> Result<(), LevsimError> {
    for section in config.sections() {
        let Some(parsed) = parse_tier_section(&section) else {
            continue;
        };
        parsed?;
        if let Some(expense) = optional_value::<f64>(config, &section, "expense_ratio")? {
            if !(0.0..1.0).contains(&expense) {
                return Err(invalid(
                    &section,
                    "expense_ratio",
                    "expense_ratio must be between 0 and 1",
                ));
            }
        }
        if let Some(multiplier) = optional_value::<f64>(config, &section, "dividend_multiplier")? {
            if multiplier < 0.0 {
                return Err(invalid(
                    &section,
                    "dividend_multiplier",
                    "dividend_multiplier must be non-negative",
                ));
            }
        }
    }
    Ok(())
}
