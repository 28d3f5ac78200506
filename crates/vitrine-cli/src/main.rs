//! Vitrine CLI
//!
//! ## Usage
//!
//! ```bash
//! vitrine list tests                  # Every suite and test
//! vitrine run --tag smoke             # Run the smoke tests
//! vitrine run --filter coffee-cart/   # One suite
//! vitrine run --format junit -o report.xml
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vitrine::SuiteConfig;
use vitrine_cli::{handlers, Cli, CliConfig, CliResult, Commands, Verbosity};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    let suite_config = SuiteConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Run(args) => handlers::run(&args, config, suite_config),
        Commands::List(args) => {
            print!("{}", handlers::list(&args, &suite_config)?);
            Ok(true)
        }
        Commands::Config => {
            print!("{}", handlers::show_config(&suite_config)?);
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_debug())
        .init();
}
