//! Vitrine CLI library
//!
//! Command-line front end for the Vitrine suites: list what is registered,
//! show the effective configuration and run suites against live sites.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{Cli, ColorArg, Commands, FormatArg, ListArgs, ListTarget, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
