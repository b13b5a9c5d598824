use std::time::Duration;

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::analysis::{FitSummary, InitialEstimate};
use crate::models::SECONDS_PER_HOUR;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render a duration as hours and minutes, e.g. `5h 02m`.
pub fn format_duration(duration: Duration) -> String {
    if duration == Duration::MAX {
        return "unbounded".to_string();
    }
    let total_minutes = (duration.as_secs_f64() / 60.0).round() as u64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

fn with_std_dev(value: String, sd: Option<f64>) -> String {
    match sd {
        Some(sd) => format!("{value} ± {sd:.3e}"),
        None => value,
    }
}

/// Format a growth curve fit as a table string.
pub fn format_fit_table(summary: &FitSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Growth Curve Fit".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    if !summary.converged {
        output.push_str(&format!(
            "  {} no growth curve could be fitted to {} points\n",
            "Warning:".yellow(),
            summary.points
        ));
    }

    let sd = summary.std_devs;
    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value", "Unit"]);
    table.add_row(vec![
        Cell::new("Data Points"),
        Cell::new(summary.points),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Lag Time"),
        Cell::new(with_std_dev(
            format_duration(
                Duration::try_from_secs_f64(summary.lag_time_seconds).unwrap_or(Duration::MAX),
            ),
            sd.map(|s| s.lag_time),
        )),
        Cell::new("h:m"),
    ]);
    table.add_row(vec![
        Cell::new("Growth Rate"),
        Cell::new(with_std_dev(
            format!("{:.4}", summary.growth_rate_per_hour),
            sd.map(|s| s.growth_rate * SECONDS_PER_HOUR),
        )),
        Cell::new("log2[area]/hour"),
    ]);
    table.add_row(vec![
        Cell::new("Carrying Capacity"),
        Cell::new(with_std_dev(
            format!("{:.3}", summary.carrying_capacity),
            sd.map(|s| s.carrying_capacity),
        )),
        Cell::new("log2[area]"),
    ]);
    table.add_row(vec![
        Cell::new("Doubling Time"),
        Cell::new(format_duration(
            Duration::try_from_secs_f64(summary.doubling_time_seconds).unwrap_or(Duration::MAX),
        )),
        Cell::new("h:m"),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print a growth curve fit table to stdout.
pub fn print_fit_table(summary: &FitSummary) {
    println!("{}", format_fit_table(summary));
}

/// Format heuristic initial estimates as a table string.
pub fn format_estimate_table(estimate: &InitialEstimate) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Initial Parameter Estimate".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value", "Unit"]);
    table.add_row(vec![
        Cell::new("Lag Time"),
        Cell::new(format!("{:.1}", estimate.lag_time)),
        Cell::new("seconds"),
    ]);
    table.add_row(vec![
        Cell::new("Growth Rate"),
        Cell::new(format!("{:.4}", estimate.growth_rate * SECONDS_PER_HOUR)),
        Cell::new("log2[area]/hour"),
    ]);
    table.add_row(vec![
        Cell::new("Carrying Capacity"),
        Cell::new(format!("{:.3}", estimate.carrying_capacity)),
        Cell::new("log2[area]"),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print heuristic initial estimates to stdout.
pub fn print_estimate_table(estimate: &InitialEstimate) {
    println!("{}", format_estimate_table(estimate));
}
