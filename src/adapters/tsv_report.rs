//! Tab-separated overview table, ready to paste into a spreadsheet.
//!
//! One row per leverage ratio. With `extended` set, threshold columns are
//! added and the best/worst trials of each ratio follow the overview.

use crate::adapters::format::{fixed, percent, yes_no};
use crate::domain::stats::{LeverageStats, Metric, StatsAggregator};
use crate::ports::report_port::{ReportPort, ReportSettings};
use std::fmt::Write;

pub const OVERVIEW_HEADERS: [&str; 18] = [
    "Leverage Ratio",
    "Average CAGR (%)",
    "Best CAGR (%)",
    "Worst CAGR (%)",
    "Average Gain ($)",
    "Best Gain ($)",
    "Worst Gain ($)",
    "Average Return (%)",
    "Best Return (%)",
    "Worst Return (%)",
    "Largest Gain (#)",
    "Largest Gain (%)",
    "Beat 1.0 (#)",
    "Beat 1.0 (%)",
    "Average Start Year",
    "Average End Year",
    "Average Period (yrs)",
    "Total Losses",
];

pub const TRIAL_HEADERS: [&str; 9] = [
    "Leverage Ratio",
    "CAGR",
    "Total Gain",
    "% Return",
    "Was largest gain for ratios",
    "Gained more than 1.0 ratio",
    "Start Date",
    "End Date",
    "Investment Period (yrs)",
];

pub struct TsvReport;

impl ReportPort for TsvReport {
    fn render(&self, stats: &StatsAggregator, settings: &ReportSettings) -> String {
        let mut out = String::new();
        out.push_str(&overview_header(settings));
        out.push('\n');
        for ratio in stats.stats() {
            out.push_str(&overview_row(ratio, settings));
            out.push('\n');
        }

        if settings.extended {
            let sections: [(&str, Metric, bool); 4] = [
                ("Best CAGR Info:", Metric::CompoundGrowth, true),
                ("Worst CAGR Info:", Metric::CompoundGrowth, false),
                ("Worst Overall return Info:", Metric::ReturnRatio, false),
                ("Best overall return Info:", Metric::ReturnRatio, true),
            ];
            for (title, metric, best) in sections {
                out.push('\n');
                out.push_str(&extreme_section(stats, title, metric, best));
            }
        }
        out
    }
}

pub fn overview_header(settings: &ReportSettings) -> String {
    let mut columns: Vec<String> = OVERVIEW_HEADERS.iter().map(|h| h.to_string()).collect();
    if settings.extended {
        let label = percent(Some(settings.cagr_threshold));
        columns.push(format!("CAGR < {label}% (% of time)"));
        columns.push(format!("Average CAGR < {label}% (%)"));
        columns.push(format!("Average CAGR >= {label}% (%)"));
    }
    columns.join("\t")
}

pub fn overview_row(stats: &LeverageStats, settings: &ReportSettings) -> String {
    let best = |m| stats.best(m).map(|e| e.value);
    let worst = |m| stats.worst(m).map(|e| e.value);

    let mut cells = vec![
        stats.spec().to_string(),
        percent(stats.average(Metric::CompoundGrowth)),
        percent(best(Metric::CompoundGrowth)),
        percent(worst(Metric::CompoundGrowth)),
        fixed(stats.average(Metric::DollarReturn)),
        fixed(best(Metric::DollarReturn)),
        fixed(worst(Metric::DollarReturn)),
        percent(stats.average(Metric::ReturnRatio)),
        percent(best(Metric::ReturnRatio)),
        percent(worst(Metric::ReturnRatio)),
        stats.largest_count().to_string(),
        percent(stats.largest_frequency()),
        stats.beat_baseline_count().to_string(),
        percent(stats.beat_baseline_frequency()),
        fixed(stats.average_start_year()),
        fixed(stats.average_end_year()),
        fixed(stats.average_holding_years()),
        stats.losses().len().to_string(),
    ];
    if settings.extended {
        let t = settings.cagr_threshold;
        cells.push(percent(stats.frequency_below(Metric::CompoundGrowth, t)));
        cells.push(percent(stats.average_below(Metric::CompoundGrowth, t)));
        cells.push(percent(stats.average_at_or_above(Metric::CompoundGrowth, t)));
    }
    cells.join("\t")
}

/// One trial as a drill-down row; `None` when `index` was never recorded.
pub fn trial_row(stats: &LeverageStats, index: usize) -> Option<String> {
    let record = stats.record(index).ok()?;
    let outcome = &record.outcome;
    Some(
        [
            stats.spec().to_string(),
            percent(Some(outcome.compound_growth)),
            fixed(Some(outcome.dollar_return)),
            percent(Some(outcome.return_ratio)),
            yes_no(record.was_largest).to_string(),
            yes_no(record.beat_baseline).to_string(),
            outcome.start_date.to_string(),
            outcome.end_date.to_string(),
            fixed(Some(record.holding_years)),
        ]
        .join("\t"),
    )
}

fn extreme_section(stats: &StatsAggregator, title: &str, metric: Metric, best: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", TRIAL_HEADERS.join("\t"));
    for ratio in stats.stats() {
        let extreme = if best {
            ratio.best(metric)
        } else {
            ratio.worst(metric)
        };
        if let Some(row) = extreme.and_then(|e| trial_row(ratio, e.index)) {
            let _ = writeln!(out, "{row}");
        }
    }
    out
}
