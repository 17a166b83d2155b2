pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gestor_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use gestor_core::ApplicationError;
use tracing::warn;

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "gestor",
    about = "Gestor quote pricing CLI",
    long_about = "Price stored budgets (labor, material, taxes, installments) and inspect \
                  configuration.",
    after_help = "Examples:\n  gestor quote --file orcamentos.json --id 42\n  \
                  gestor quote --file orcamentos.json --id 42 --json\n  gestor config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (default: gestor.toml or config/gestor.toml)")]
    config: Option<PathBuf>,
    #[arg(long = "log-level", global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a stored quote and print its breakdown and payment plan")]
    Quote(commands::quote::QuoteArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Quote(_) => "quote",
            Self::Config => "config",
        }
    }

    fn correlation_id(&self) -> String {
        match self {
            Self::Quote(args) => commands::quote::correlation_id(&args.id),
            Self::Config => "config".to_string(),
        }
    }
}

pub fn run() -> ExitCode {
    let result = execute(Cli::parse());
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Loads configuration once for the whole invocation, then dispatches.
pub fn execute(cli: Cli) -> CommandResult {
    let Cli { config: config_path, log_level, command } = cli;
    let quotes_file = match &command {
        Command::Quote(args) => args.file.clone(),
        Command::Config => None,
    };
    let options = LoadOptions {
        config_path: config_path.clone(),
        require_file: config_path.is_some(),
        overrides: ConfigOverrides { quotes_file, log_level, ..ConfigOverrides::default() },
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            init_logging(&AppConfig::default().logging);
            warn!(
                event_name = "config.load.failed",
                command = command.name(),
                error = %error,
                "configuration rejected"
            );
            let interface = ApplicationError::Configuration(error.to_string())
                .into_interface(command.correlation_id());
            return CommandResult::interface_failure(
                command.name(),
                "config_validation",
                &interface,
                2,
            );
        }
    };
    init_logging(&config.logging);

    match command {
        Command::Quote(args) => commands::quote::run(args, &config),
        Command::Config => CommandResult {
            exit_code: 0,
            output: commands::config::run(&config, config_path.as_deref()),
        },
    }
}

/// Logs go to stderr so command payloads on stdout stay machine readable.
fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("logging already initialised: {error}");
    }
}
