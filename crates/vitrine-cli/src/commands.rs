//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vitrine::ReportFormat;

/// Vitrine: run page-object suites against live sites
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Suite configuration file (defaults to ./vitrine.yaml when present)
    #[arg(long, global = true, env = "VITRINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run suites against the live sites
    Run(RunArgs),

    /// List fixtures, tests or known bugs
    List(ListArgs),

    /// Show the effective configuration
    Config,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run tests whose "suite/name" contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only run tests carrying this tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Number of tests in flight at once
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop scheduling tests after the first unexpected failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the selected tests without starting a browser
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// What to list
    #[arg(default_value = "tests")]
    pub what: ListTarget,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Listing targets
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListTarget {
    /// Registered fixture names and their types
    Fixtures,
    /// Every test as "suite/name" with its tags
    #[default]
    Tests,
    /// Tests marked as known bugs
    KnownBugs,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
    /// JUnit XML
    Junit,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Junit => Self::Junit,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["vitrine", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert!(args.filter.is_none());
            assert!(args.tags.is_empty());
            assert_eq!(args.format, FormatArg::Text);
            assert!(!args.headed);
            assert!(!args.dry_run);
        }

        #[test]
        fn test_run_with_options() {
            let cli = Cli::try_parse_from([
                "vitrine", "run", "--filter", "coffee", "--tag", "smoke", "--tag", "e2e", "-j",
                "4", "--headed", "--format", "junit", "-o", "report.xml", "--fail-fast",
            ])
            .unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.filter.as_deref(), Some("coffee"));
            assert_eq!(args.tags, vec!["smoke", "e2e"]);
            assert_eq!(args.workers, Some(4));
            assert!(args.headed && args.fail_fast);
            assert_eq!(ReportFormat::from(args.format), ReportFormat::Junit);
            assert_eq!(args.output, Some(PathBuf::from("report.xml")));
        }

        #[test]
        fn test_list_target() {
            let cli = Cli::try_parse_from(["vitrine", "list", "known-bugs", "--json"]).unwrap();
            let Commands::List(args) = cli.command else {
                panic!("expected list");
            };
            assert_eq!(args.what, ListTarget::KnownBugs);
            assert!(args.json);
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::try_parse_from(["vitrine", "config", "-vv", "--color", "never"]).unwrap();
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["vitrine"]).is_err());
        }
    }
}
