//! Cost/dividend lookup port.

/// Annualised figures applied at a year boundary, as ratios (0.0095 = 0.95%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YearAdjustment {
    pub dividend_yield: f64,
    pub expense_ratio: f64,
}

impl YearAdjustment {
    /// Net annual change: dividend credit minus expense charge.
    pub fn net(&self) -> f64 {
        self.dividend_yield - self.expense_ratio
    }
}

pub trait CostDividendPort: Send + Sync {
    /// Adjustment for holding `leverage` through calendar `year`.
    fn adjustment(&self, year: i32, leverage: f64) -> YearAdjustment;
}
