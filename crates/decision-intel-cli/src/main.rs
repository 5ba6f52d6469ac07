mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::{AnalyzeArgs, TrendsArgs};
use commands::categorize::CategorizeArgs;
use commands::thresholds::ThresholdsArgs;

/// Decision intelligence over disbursement portfolios
#[derive(Parser)]
#[command(
    name = "dia",
    version,
    about = "Decision intelligence over disbursement portfolios",
    long_about = "A CLI for running the decision intelligence pipeline over a batch of \
                  disbursement records with decimal precision. Produces product, regional \
                  and institutional breakdowns, trend forecasts, BCG classification, \
                  opportunity scores, customer behaviour and concentration risk."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a record batch
    Analyze(AnalyzeArgs),
    /// Run the pipeline and print only the trend analysis
    Trends(TrendsArgs),
    /// Resolve product descriptions to categories
    Categorize(CategorizeArgs),
    /// Print the default (or a validated custom) threshold configuration
    Thresholds(ThresholdsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Trends(args) => commands::analyze::run_trends(args),
        Commands::Categorize(args) => commands::categorize::run_categorize(args),
        Commands::Thresholds(args) => commands::thresholds::run_thresholds(args),
        Commands::Version => {
            println!("dia {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
