//! Regulus CLI - Main entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use regulus_asset::AssetConfig;
use regulus_cli::{commands, Scenario};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "regulus=info,regulus_cli=info,regulus_asset=info,\
regulus_compliance=info,regulus_modules=info,regulus_diamond=info,regulus_core=info";

#[derive(Parser)]
#[command(name = "regulus")]
#[command(about = "Regulus - compliance-gated asset engine", long_about = None)]
struct Cli {
    /// Asset configuration file (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file against a freshly deployed asset
    Run {
        /// Scenario file (JSON)
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List operation and hook selectors
    Selectors,

    /// List bundled topics
    Topics,

    /// Print the default configuration
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AssetConfig::from_file(path)?,
        None => AssetConfig::default(),
    };

    match cli.command {
        Commands::Run { scenario, json } => {
            let scenario = Scenario::from_file(&scenario)?;
            let report = commands::run(config, &scenario)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                commands::print_report(&report);
            }
        }

        Commands::Selectors => {
            for (signature, selector) in commands::selectors() {
                println!("{selector}  {signature}");
            }
        }

        Commands::Topics => {
            for (name, topic) in commands::topic_table() {
                println!("{topic}  {name}");
            }
        }

        Commands::DefaultConfig => {
            println!("{}", commands::default_config()?);
        }
    }

    Ok(())
}
