//! Two-fund approximation of a leverage ratio no single fund offers.
//!
//! Solves `x + y = 1`, `s·x + b·y = v` for the share of capital held in the
//! smaller tier `s` and the larger tier `b`, then compounds each share
//! independently and sums the results.

use crate::domain::calendar::{round_cents, round_to};
use crate::domain::compounding::{CompoundingEngine, TotalLoss, TrialOutcome};
use crate::domain::leverage::{BlendSpec, LeverageSpec};
use crate::domain::window::HoldingWindow;
use tracing::debug;

/// Decimal places kept on each blend weight.
pub const WEIGHT_PRECISION: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub small: f64,
    pub large: f64,
}

/// Capital shares for `spec`, or `None` when the target cannot be reached
/// with non-negative holdings of both tiers.
pub fn solve_weights(spec: &BlendSpec) -> Option<BlendWeights> {
    let span = spec.large - spec.small;
    if span.abs() < f64::EPSILON {
        return None;
    }
    let large = round_to((spec.target - spec.small) / span, WEIGHT_PRECISION);
    let small = round_to(1.0 - large, WEIGHT_PRECISION);
    let in_unit = |w: f64| (0.0..=1.0).contains(&w);
    if !in_unit(small) || !in_unit(large) {
        return None;
    }
    Some(BlendWeights { small, large })
}

/// Holds the blend over `window`. An infeasible blend is held directly at
/// the target ratio instead.
pub fn run_blended(
    engine: &CompoundingEngine<'_>,
    window: &HoldingWindow,
    spec: &BlendSpec,
) -> Result<TrialOutcome, TotalLoss> {
    let initial = engine.initial_capital();
    let leverage = LeverageSpec::Blended(*spec);

    let Some(weights) = solve_weights(spec) else {
        debug!(
            target = spec.target,
            small = spec.small,
            large = spec.large,
            "blend infeasible, holding target ratio directly"
        );
        let final_value = engine.compound(window, spec.target, initial)?;
        return Ok(TrialOutcome::new(leverage, window, initial, final_value));
    };

    let small_capital = round_cents(initial * weights.small);
    let large_capital = round_cents(initial - small_capital);

    let small_leg = hold_leg(engine, window, spec.small, small_capital);
    let large_leg = hold_leg(engine, window, spec.large, large_capital);
    let combined = round_cents(small_leg.value + large_leg.value);

    if combined <= 0.0 {
        let date = [small_leg.lost_on, large_leg.lost_on]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(window.end_date());
        return Err(TotalLoss {
            date,
            leverage: spec.target,
            value: combined,
        });
    }

    Ok(TrialOutcome::new(leverage, window, initial, combined))
}

struct Leg {
    value: f64,
    lost_on: Option<chrono::NaiveDate>,
}

/// A leg that is wiped out is worth nothing but does not end the blend.
fn hold_leg(
    engine: &CompoundingEngine<'_>,
    window: &HoldingWindow,
    leverage: f64,
    capital: f64,
) -> Leg {
    if capital <= 0.0 {
        return Leg {
            value: 0.0,
            lost_on: None,
        };
    }
    match engine.compound(window, leverage, capital) {
        Ok(value) => Leg {
            value,
            lost_on: None,
        },
        Err(loss) => {
            debug!(leverage, date = %loss.date, "blend leg lost all capital");
            Leg {
                value: 0.0,
                lost_on: Some(loss.date),
            }
        }
    }
}
