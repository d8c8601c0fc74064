//! Leverage specifications: a single tradeable ratio, or a two-tier blend.

use std::fmt;

/// Target ratio reached by splitting capital between a smaller and a larger
/// tradeable tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendSpec {
    pub target: f64,
    pub small: f64,
    pub large: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeverageSpec {
    Single(f64),
    Blended(BlendSpec),
}

impl LeverageSpec {
    pub fn blended(target: f64, small: f64, large: f64) -> Self {
        LeverageSpec::Blended(BlendSpec {
            target,
            small,
            large,
        })
    }

    /// The leverage ratio this spec is meant to reach.
    pub fn ratio(&self) -> f64 {
        match self {
            LeverageSpec::Single(r) => *r,
            LeverageSpec::Blended(b) => b.target,
        }
    }

    /// True for the unleveraged 1.0 baseline.
    pub fn is_baseline(&self) -> bool {
        (self.ratio() - 1.0).abs() < 1e-9
    }
}

impl fmt::Display for LeverageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeverageSpec::Single(r) => f.write_str(&format_ratio(*r)),
            LeverageSpec::Blended(b) => write!(
                f,
                "{} ({}/{} blend)",
                format_ratio(b.target),
                format_ratio(b.small),
                format_ratio(b.large)
            ),
        }
    }
}

/// `2` as `2.0`, `1.25` as `1.25`.
pub fn format_ratio(ratio: f64) -> String {
    if ratio.fract() == 0.0 {
        format!("{ratio:.1}")
    } else {
        ratio.to_string()
    }
}

/// Parses a comma-separated list of ratios, adding the 1.0 baseline when it
/// is missing. Order is preserved; duplicates are dropped.
pub fn parse_ratios(input: &str) -> Result<Vec<f64>, String> {
    let mut ratios: Vec<f64> = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err("empty entry in leverage ratio list".to_string());
        }
        let ratio: f64 = trimmed
            .parse()
            .map_err(|_| format!("'{trimmed}' is not a number"))?;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(format!("leverage ratio {trimmed} must be positive"));
        }
        if !ratios.iter().any(|r| (r - ratio).abs() < 1e-9) {
            ratios.push(ratio);
        }
    }
    Ok(with_baseline(ratios))
}

/// Appends 1.0 when no baseline ratio is present.
pub fn with_baseline(mut ratios: Vec<f64>) -> Vec<f64> {
    if !ratios.iter().any(|r| (r - 1.0).abs() < 1e-9) {
        ratios.push(1.0);
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ratios_appends_baseline() {
        assert_eq!(parse_ratios("2.0, 3.0").unwrap(), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn parse_ratios_keeps_existing_baseline_position() {
        assert_eq!(parse_ratios("1.0,2.5").unwrap(), vec![1.0, 2.5]);
    }

    #[test]
    fn parse_ratios_drops_duplicates() {
        assert_eq!(parse_ratios("2.0,2,1.0").unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    fn parse_ratios_rejects_bad_entries() {
        assert!(parse_ratios("2.0,,3.0").is_err());
        assert!(parse_ratios("abc").is_err());
        assert!(parse_ratios("-1.0").is_err());
    }

    #[test]
    fn spec_ratio_and_baseline() {
        assert!(LeverageSpec::Single(1.0).is_baseline());
        let blend = LeverageSpec::blended(1.5, 1.0, 2.0);
        assert_eq!(blend.ratio(), 1.5);
        assert!(!blend.is_baseline());
        assert_eq!(blend.to_string(), "1.5 (1.0/2.0 blend)");
    }

    #[test]
    fn display_keeps_significant_decimals() {
        assert_eq!(LeverageSpec::Single(3.0).to_string(), "3.0");
        assert_eq!(LeverageSpec::Single(1.25).to_string(), "1.25");
    }
}
