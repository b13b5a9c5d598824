use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use colony_growth::{
    analysis::{estimate_parameters, gompertz},
    io,
    models::SECONDS_PER_HOUR,
    report::{print_estimate_table, print_fit_table},
    FitConfig, GrowthCurve, GrowthSeries,
};

#[derive(Parser)]
#[command(
    name = "growth-curve",
    about = "Colony growth curve analysis - lag time, growth rate and carrying capacity",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a Gompertz growth curve to a measurement series
    Fit {
        /// Path to a CSV file with elapsed_seconds and measurement columns
        #[arg(short, long)]
        input: PathBuf,

        /// Optional TOML file with fit settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sliding window size for the initial growth rate estimate
        #[arg(short, long)]
        window: Option<usize>,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Write the JSON result to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the heuristic initial parameters without fitting
    Estimate {
        /// Path to a CSV file with elapsed_seconds and measurement columns
        #[arg(short, long)]
        input: PathBuf,

        /// Sliding window size for the growth rate estimate
        #[arg(short, long, default_value = "10")]
        window: usize,
    },

    /// Generate a synthetic Gompertz growth series as CSV
    Simulate {
        /// Lag time in hours
        #[arg(long, default_value = "5.0")]
        lag_hours: f64,

        /// Maximum growth rate in log2[area] per hour
        #[arg(long, default_value = "0.3")]
        rate_per_hour: f64,

        /// Carrying capacity in log2[area]
        #[arg(long, default_value = "10.0")]
        capacity: f64,

        /// Initial size in log2[area]
        #[arg(long, default_value = "0.0")]
        initial: f64,

        /// Number of measurements
        #[arg(short, long, default_value = "97")]
        points: u64,

        /// Minutes between measurements
        #[arg(long, default_value = "15")]
        interval_minutes: u64,

        /// Output CSV path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>, window: Option<usize>) -> Result<FitConfig> {
    let mut config = match path {
        Some(path) => FitConfig::from_toml_file(path)?,
        None => FitConfig::default(),
    };
    if let Some(window) = window {
        config.window = window;
        config.validate()?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            input,
            config,
            window,
            json,
            pretty,
            output,
        } => {
            let config = load_config(config.as_ref(), window)?;
            let series = io::read_csv(&input)?;
            tracing::info!(points = series.len(), input = %input.display(), "loaded growth series");

            let mut curve = GrowthCurve::with_config(series, config);
            let summary = curve.summary();

            if let Some(output) = &output {
                io::write_summary_json(&summary, output, pretty)?;
            }

            if json {
                println!("{}", io::summary_to_json(&summary, pretty)?);
            } else {
                println!(
                    "\n{}",
                    format!("Growth Curve: {}", input.display()).bold().cyan()
                );
                print_fit_table(&summary);
                if let Some(output) = &output {
                    println!(
                        "{} Wrote {}",
                        "Success:".green().bold(),
                        output.display()
                    );
                }
            }
        }

        Commands::Estimate { input, window } => {
            let config = load_config(None, Some(window))?;
            let series = io::read_csv(&input)?;
            if series.is_empty() {
                anyhow::bail!("No measurements found in {}", input.display());
            }
            let estimate =
                estimate_parameters(&series.timestamps(), &series.measurements(), config.window)?;
            print_estimate_table(&estimate);
        }

        Commands::Simulate {
            lag_hours,
            rate_per_hour,
            capacity,
            initial,
            points,
            interval_minutes,
            output,
        } => {
            if interval_minutes == 0 {
                anyhow::bail!("interval-minutes must be at least 1");
            }
            // The last timestamp bounds every other one
            let step_secs = interval_minutes
                .checked_mul(60)
                .filter(|&step| points.saturating_sub(1).checked_mul(step).is_some())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "simulated time span overflows: {points} points every {interval_minutes} minutes"
                    )
                })?;
            let lag = lag_hours * SECONDS_PER_HOUR;
            let rate = rate_per_hour / SECONDS_PER_HOUR;

            let series: GrowthSeries = (0..points)
                .map(|i| {
                    let elapsed = Duration::from_secs(i * step_secs);
                    let value = gompertz(elapsed.as_secs_f64(), initial, lag, rate, capacity);
                    (elapsed, value)
                })
                .collect();

            match output {
                Some(path) => {
                    io::write_csv(&series, &path)?;
                    println!(
                        "{} Wrote {} points to {}",
                        "Success:".green().bold(),
                        series.len(),
                        path.display()
                    );
                }
                None => io::write_csv_to(&series, std::io::stdout().lock())?,
            }
        }
    }

    Ok(())
}
