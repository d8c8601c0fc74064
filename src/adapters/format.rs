//! Number formatting shared by the report adapters.

pub const NOT_AVAILABLE: &str = "n/a";

/// A ratio shown as a percentage with two decimals, without the sign.
pub fn percent(value: Option<f64>) -> String {
    fixed(value.map(|v| v * 100.0))
}

/// Two decimals, or `n/a` when there is no value.
pub fn fixed(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn with_suffix(value: String, suffix: &str) -> String {
    if value == NOT_AVAILABLE {
        value
    } else {
        value + suffix
    }
}

pub fn with_prefix(prefix: &str, value: String) -> String {
    if value == NOT_AVAILABLE {
        value
    } else {
        format!("{prefix}{value}")
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
