//! Tradeable leverage tiers per instrument and the year-by-year cost table
//! built on top of them.

use crate::domain::leverage::LeverageSpec;
use crate::ports::cost_port::{CostDividendPort, YearAdjustment};
use std::collections::{BTreeMap, HashMap};

/// A real fund at a given leverage.
#[derive(Debug, Clone, PartialEq)]
pub struct TierInfo {
    pub symbol: String,
    /// Annual expense ratio (0.0095 = 0.95%).
    pub expense_ratio: f64,
    /// Fund dividend yield as a multiple of the index dividend yield.
    pub dividend_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub ratio: f64,
    pub info: TierInfo,
}

/// Mapping from (instrument, leverage tier) to fund metadata.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    instruments: HashMap<String, Vec<Tier>>,
}

impl InstrumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index ETFs and their 2x/3x counterparts for the major U.S. indexes.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        let rows: [(&str, f64, &str, f64, f64); 9] = [
            ("dow", 1.0, "DIA", 0.0016, 1.0),
            ("dow", 2.0, "DDM", 0.0095, 0.25),
            ("dow", 3.0, "UDOW", 0.0095, 0.12),
            ("sp500", 1.0, "SPY", 0.000945, 1.0),
            ("sp500", 2.0, "SSO", 0.0089, 0.2),
            ("sp500", 3.0, "UPRO", 0.0091, 0.1),
            ("nasdaq100", 1.0, "QQQ", 0.002, 1.0),
            ("nasdaq100", 2.0, "QLD", 0.0095, 0.1),
            ("nasdaq100", 3.0, "TQQQ", 0.0088, 0.05),
        ];
        for (instrument, ratio, symbol, expense_ratio, dividend_multiplier) in rows {
            table.insert(
                instrument,
                ratio,
                TierInfo {
                    symbol: symbol.to_string(),
                    expense_ratio,
                    dividend_multiplier,
                },
            );
        }
        table
    }

    /// Adds a tier, replacing any existing tier with the same ratio.
    pub fn insert(&mut self, instrument: &str, ratio: f64, info: TierInfo) {
        let tiers = self
            .instruments
            .entry(instrument.to_lowercase())
            .or_default();
        match tiers.iter_mut().find(|t| same_ratio(t.ratio, ratio)) {
            Some(existing) => existing.info = info,
            None => {
                tiers.push(Tier { ratio, info });
                tiers.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));
            }
        }
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.instruments
            .get(&instrument.to_lowercase())
            .is_some_and(|t| !t.is_empty())
    }

    /// Tiers of `instrument`, ascending by ratio.
    pub fn tiers(&self, instrument: &str) -> &[Tier] {
        self.instruments
            .get(&instrument.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The tier whose costs apply to `leverage`: an exact match, else the
    /// smallest tier above it, else the largest tier.
    pub fn tier_for(&self, instrument: &str, leverage: f64) -> Option<&Tier> {
        select_tier(self.tiers(instrument), leverage)
    }

    /// How to simulate `leverage`: a tier ratio or anything outside the tier
    /// range is held directly; with blending on, a ratio between two tiers is
    /// split across the nearest tier below and above.
    pub fn spec_for(&self, instrument: &str, leverage: f64, blend: bool) -> LeverageSpec {
        let tiers = self.tiers(instrument);
        if !blend || tiers.iter().any(|t| same_ratio(t.ratio, leverage)) {
            return LeverageSpec::Single(leverage);
        }
        let below = tiers.iter().rev().find(|t| t.ratio < leverage);
        let above = tiers.iter().find(|t| t.ratio > leverage);
        match (below, above) {
            (Some(s), Some(b)) => LeverageSpec::blended(leverage, s.ratio, b.ratio),
            _ => LeverageSpec::Single(leverage),
        }
    }
}

fn same_ratio(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn select_tier(tiers: &[Tier], leverage: f64) -> Option<&Tier> {
    tiers
        .iter()
        .find(|t| same_ratio(t.ratio, leverage) || t.ratio > leverage)
        .or_else(|| tiers.last())
}

/// Which parts of the year-end adjustment are switched on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSettings {
    pub include_dividends: bool,
    pub charge_expenses: bool,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            include_dividends: true,
            charge_expenses: true,
        }
    }
}

/// Cost/dividend provider for one instrument: tier metadata plus the index
/// dividend ratio for each calendar year.
#[derive(Debug, Clone)]
pub struct CostTable {
    tiers: Vec<Tier>,
    dividends: BTreeMap<i32, f64>,
    settings: CostSettings,
}

impl CostTable {
    pub fn new(
        table: &InstrumentTable,
        instrument: &str,
        dividends: BTreeMap<i32, f64>,
        settings: CostSettings,
    ) -> Self {
        Self {
            tiers: table.tiers(instrument).to_vec(),
            dividends,
            settings,
        }
    }

    /// Flat annual decay applied to every leveraged ratio, no dividends.
    pub fn flat_decay(rate: f64) -> Self {
        let info = |symbol: &str, expense_ratio| TierInfo {
            symbol: symbol.to_string(),
            expense_ratio,
            dividend_multiplier: 0.0,
        };
        Self {
            tiers: vec![
                Tier {
                    ratio: 1.0,
                    info: info("INDEX", 0.0),
                },
                Tier {
                    ratio: f64::INFINITY,
                    info: info("LEVERAGED", rate),
                },
            ],
            dividends: BTreeMap::new(),
            settings: CostSettings {
                include_dividends: false,
                charge_expenses: true,
            },
        }
    }

    pub fn dividend_ratio(&self, year: i32) -> f64 {
        self.dividends.get(&year).copied().unwrap_or(0.0)
    }
}

impl CostDividendPort for CostTable {
    fn adjustment(&self, year: i32, leverage: f64) -> YearAdjustment {
        let Some(tier) = select_tier(&self.tiers, leverage) else {
            return YearAdjustment::default();
        };
        let dividend_yield = if self.settings.include_dividends {
            self.dividend_ratio(year) * tier.info.dividend_multiplier
        } else {
            0.0
        };
        let expense_ratio = if self.settings.charge_expenses {
            tier.info.expense_ratio
        } else {
            0.0
        };
        YearAdjustment {
            dividend_yield,
            expense_ratio,
        }
    }
}
