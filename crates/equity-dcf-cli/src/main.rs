mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::valuation::{ValueArgs, WaccArgs};

/// Intrinsic equity valuation from the command line
#[derive(Parser)]
#[command(
    name = "edcf",
    version,
    about = "Intrinsic equity valuation via DCF",
    long_about = "Computes an intrinsic per-share valuation from cash-flow history and \
                  forward-looking assumptions: ESG-tilted WACC, TTM free-cash-flow \
                  baseline, multi-year projection, Gordon terminal value, stress \
                  overlays, and a WACC/growth sensitivity grid."
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
    /// Calculate the ESG-tilted Weighted Average Cost of Capital
    Wacc(WaccArgs),
    /// Run the full intrinsic valuation pipeline
    Value(ValueArgs),
    /// Print the default valuation assumptions as JSON
    Defaults,
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
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Defaults => commands::valuation::run_defaults(),
        Commands::Version => {
            println!("edcf {}", env!("CARGO_PKG_VERSION"));
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
