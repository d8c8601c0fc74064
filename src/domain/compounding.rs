//! Daily compounding of a leveraged position over a holding window.
//!
//! The running value is rounded to cents after every daily step and after
//! every year-boundary adjustment, the way a fund's NAV is published. That
//! repeated rounding changes results slightly versus exact arithmetic and is
//! part of the model.

use crate::domain::blend;
use crate::domain::calendar::{
    DAYS_PER_YEAR, fraction_elapsed, fraction_remaining, round_cents,
};
use crate::domain::leverage::LeverageSpec;
use crate::domain::observation::DailySeries;
use crate::domain::window::HoldingWindow;
use crate::ports::cost_port::CostDividendPort;
use chrono::{Datelike, NaiveDate};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// The position reached zero or below; the leveraged fund would have closed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("total loss on {date} at {leverage}x leverage (value fell to ${value:.2})")]
pub struct TotalLoss {
    pub date: NaiveDate,
    pub leverage: f64,
    pub value: f64,
}

/// Result of holding one leverage spec over one window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub leverage: LeverageSpec,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_value: f64,
    pub final_value: f64,
    pub dollar_return: f64,
    pub return_ratio: f64,
    /// Implied constant annual growth rate, as a ratio.
    pub compound_growth: f64,
}

impl TrialOutcome {
    pub fn new(
        leverage: LeverageSpec,
        window: &HoldingWindow,
        initial_value: f64,
        final_value: f64,
    ) -> Self {
        let dollar_return = round_cents(final_value - initial_value);
        let return_ratio = dollar_return / initial_value;
        let days_held = window.days_held();
        // A zero-day window cannot be annualised.
        let compound_growth = if days_held > 0 {
            (final_value / initial_value).powf(DAYS_PER_YEAR / days_held as f64) - 1.0
        } else {
            return_ratio
        };
        Self {
            leverage,
            start_date: window.start_date(),
            end_date: window.end_date(),
            initial_value,
            final_value,
            dollar_return,
            return_ratio,
            compound_growth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub initial_capital: f64,
    /// Apply the prorated dividend/expense adjustment at each year boundary
    /// and at the end of the window.
    pub year_end_adjustment: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            year_end_adjustment: true,
        }
    }
}

pub struct CompoundingEngine<'a> {
    series: &'a DailySeries,
    costs: &'a dyn CostDividendPort,
    settings: EngineSettings,
}

impl<'a> CompoundingEngine<'a> {
    pub fn new(
        series: &'a DailySeries,
        costs: &'a dyn CostDividendPort,
        settings: EngineSettings,
    ) -> Self {
        Self {
            series,
            costs,
            settings,
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.settings.initial_capital
    }

    /// Outcome of holding `spec` over `window`, starting from the configured
    /// initial capital.
    pub fn run_trial(
        &self,
        window: &HoldingWindow,
        spec: &LeverageSpec,
    ) -> Result<TrialOutcome, TotalLoss> {
        match spec {
            LeverageSpec::Single(ratio) => {
                let final_value = self.compound(window, *ratio, self.initial_capital())?;
                Ok(TrialOutcome::new(
                    *spec,
                    window,
                    self.initial_capital(),
                    final_value,
                ))
            }
            LeverageSpec::Blended(blend_spec) => blend::run_blended(self, window, blend_spec),
        }
    }

    /// Final value of `amount` held at `leverage` over `window`.
    pub fn compound(
        &self,
        window: &HoldingWindow,
        leverage: f64,
        amount: f64,
    ) -> Result<f64, TotalLoss> {
        let days = &self.series.observations()[window.start()..=window.end()];
        let start_year = window.start_date().year();
        let mut value = amount;
        let mut previous_date: Option<NaiveDate> = None;

        for day in days {
            value = round_cents(value * (1.0 + day.ratio_change * leverage));
            ensure_solvent(value, day.date, leverage)?;

            if self.settings.year_end_adjustment {
                if let Some(prev) = previous_date.filter(|p| day.date.year() > p.year()) {
                    let prorate = if prev.year() == start_year {
                        fraction_remaining(window.start_date())
                    } else {
                        1.0
                    };
                    value = self.adjust(value, prev.year(), leverage, prorate);
                    ensure_solvent(value, day.date, leverage)?;
                }
            }
            previous_date = Some(day.date);
        }

        // The closing charge always covers January 1 to the end date, even
        // when the window opened later in that same year.
        if self.settings.year_end_adjustment {
            let end = window.end_date();
            value = self.adjust(value, end.year(), leverage, fraction_elapsed(end));
            ensure_solvent(value, end, leverage)?;
        }

        Ok(value)
    }

    fn adjust(&self, value: f64, year: i32, leverage: f64, prorate: f64) -> f64 {
        let adjustment = self.costs.adjustment(year, leverage);
        round_cents(value * (1.0 + prorate * adjustment.net()))
    }
}

fn ensure_solvent(value: f64, date: NaiveDate, leverage: f64) -> Result<(), TotalLoss> {
    if value <= 0.0 {
        return Err(TotalLoss {
            date,
            leverage,
            value,
        });
    }
    Ok(())
}
