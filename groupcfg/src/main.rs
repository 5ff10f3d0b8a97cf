mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use config::{Config, ConfigError};

#[derive(Parser)]
#[command(name = "groupcfg", about = "Inspect grouping configurations")]
struct Cli {
    /// YAML config file. The builtin configurations are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List registered configurations
    List {
        /// Include hidden configurations
        #[arg(long)]
        all: bool,
    },
    /// Show the effective strategies and context of a configuration
    Show { id: String },
    /// Build the registry and report the result
    Validate,
    /// Report which strategy wins if only the given strategies produce a result
    Pick {
        id: String,
        #[arg(long, value_delimiter = ',')]
        produces: Vec<String>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] shared::logging::LoggingError),
    #[error(transparent)]
    Metrics(#[from] shared::metrics::MetricsError),
    #[error(transparent)]
    Grouping(#[from] grouping::config::ConfigError),
    #[error(transparent)]
    Registry(#[from] grouping::RegistryError),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let _logging = shared::logging::init(&config.logging)?;
    shared::metrics::init(
        config.metrics.as_ref(),
        "grouping",
        &[grouping::metrics_defs::ALL_METRICS],
    )?;

    execute(&cli.command, &config)
        .inspect_err(|e| tracing::error!(error = %e, "groupcfg failed"))
}

fn execute(command: &CliCommand, config: &Config) -> Result<(), CliError> {
    let registry = config.grouping.build_registry()?.install()?;

    match command {
        CliCommand::List { all } => println!("{}", commands::list(registry, *all)),
        CliCommand::Show { id } => println!("{}", commands::show(registry, id)?),
        CliCommand::Validate => println!(
            "ok: {} configurations, default {}",
            registry.len(),
            registry.default_id().unwrap_or("<none>")
        ),
        CliCommand::Pick { id, produces } => {
            println!("{}", commands::pick(registry, id, produces)?)
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
