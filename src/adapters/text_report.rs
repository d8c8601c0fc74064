//! Plain-text narrative report, one block per leverage ratio.

use crate::adapters::format::{fixed, percent, with_prefix, with_suffix};
use crate::domain::compounding::TrialOutcome;
use crate::domain::stats::{LeverageStats, Metric, StatsAggregator};
use crate::ports::report_port::{ReportPort, ReportSettings};
use std::fmt::Write;

pub struct TextReport;

impl ReportPort for TextReport {
    fn render(&self, stats: &StatsAggregator, settings: &ReportSettings) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Windows simulated: {}", stats.window_count());
        if stats.excluded_windows() > 0 {
            let _ = writeln!(
                out,
                "Windows excluded after a total loss: {}",
                stats.excluded_windows()
            );
        }
        for ratio in stats.stats() {
            out.push('\n');
            out.push_str(&render_ratio(ratio, settings));
        }
        out
    }
}

fn pct(value: Option<f64>) -> String {
    with_suffix(percent(value), "%")
}

fn usd(value: Option<f64>) -> String {
    with_prefix("$", fixed(value))
}

fn render_ratio(stats: &LeverageStats, settings: &ReportSettings) -> String {
    let best = |m| stats.best(m).map(|e| e.value);
    let worst = |m| stats.worst(m).map(|e| e.value);

    let mut out = String::new();
    let _ = writeln!(out, "Leverage Ratio: {}", stats.spec());
    let _ = writeln!(out, "   - Largest gain # times:   {}", stats.largest_count());
    let _ = writeln!(out, "   - Largest gain % of time: {}", pct(stats.largest_frequency()));
    let _ = writeln!(out, "   - Average Gain: {}", usd(stats.average(Metric::DollarReturn)));
    let _ = writeln!(out, "   - Best Gain:    {}", usd(best(Metric::DollarReturn)));
    let _ = writeln!(out, "   - Worst Gain:   {}", usd(worst(Metric::DollarReturn)));
    let _ = writeln!(
        out,
        "   - Average    overall return: {}",
        pct(stats.average(Metric::ReturnRatio))
    );
    let _ = writeln!(out, "   - Best       overall return: {}", pct(best(Metric::ReturnRatio)));
    let _ = writeln!(out, "   - Worst      overall return: {}", pct(worst(Metric::ReturnRatio)));
    let _ = writeln!(out, "   - Average CAGR: {}", pct(stats.average(Metric::CompoundGrowth)));
    let _ = writeln!(out, "   - Best    CAGR: {}", pct(best(Metric::CompoundGrowth)));
    let _ = writeln!(out, "   - Worst   CAGR: {}", pct(worst(Metric::CompoundGrowth)));
    let _ = writeln!(
        out,
        "   - Percentage of time > 1.0: {}",
        pct(stats.beat_baseline_frequency())
    );
    let _ = writeln!(out, "   - Number of times > 1.0:    {}", stats.beat_baseline_count());
    let _ = writeln!(out, "   - Average start year:     {}", fixed(stats.average_start_year()));
    let _ = writeln!(out, "   - Average end year:       {}", fixed(stats.average_end_year()));
    let _ = writeln!(
        out,
        "   - Average investment time: {}",
        with_suffix(fixed(stats.average_holding_years()), " yrs")
    );

    if settings.extended {
        let threshold = settings.cagr_threshold;
        let label = percent(Some(threshold));
        let _ = writeln!(
            out,
            "   - CAGR below {label}% of time: {}",
            pct(stats.frequency_below(Metric::CompoundGrowth, threshold))
        );
        let _ = writeln!(
            out,
            "   - Average CAGR below {label}%: {}",
            pct(stats.average_below(Metric::CompoundGrowth, threshold))
        );
        let _ = writeln!(
            out,
            "   - Average CAGR at or above {label}%: {}",
            pct(stats.average_at_or_above(Metric::CompoundGrowth, threshold))
        );
    }

    if !stats.losses().is_empty() {
        let _ = writeln!(out, "   - Total losses (window excluded): {}", stats.losses().len());
        for loss in stats.losses() {
            let _ = writeln!(out, "       {loss}");
        }
    }
    out
}

/// Describes every ratio's result for one window, e.g. from
/// [`StatsAggregator::window`].
pub fn format_window(outcomes: &[&TrialOutcome]) -> String {
    let mut out = String::new();
    let Some(first) = outcomes.first() else {
        return out;
    };
    let _ = writeln!(out, "Start date: {}", first.start_date);
    let _ = writeln!(out, "End date:   {}", first.end_date);
    let _ = writeln!(out, "Original Investment: ${:.2}", first.initial_value);
    for outcome in outcomes {
        let _ = writeln!(out, "Ratio: {}", outcome.leverage);
        let _ = writeln!(out, "   End Value: ${:.2}", outcome.final_value);
        let _ = writeln!(out, "   Total Gain: ${:.2}", outcome.dollar_return);
        let _ = writeln!(out, "   Total % Return: {}", pct(Some(outcome.return_ratio)));
        let _ = writeln!(out, "   CAGR: {}", pct(Some(outcome.compound_growth)));
    }
    out
}
