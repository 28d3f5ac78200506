//! Command handlers

use crate::commands::{ListArgs, ListTarget, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use vitrine::reporter::{self, ReportFormat};
use vitrine::sites::standard_registry;
use vitrine::{
    suites, ContextProvider, MockContextProvider, RunReport, SuiteConfig, TestRunner, TestSuite,
};

/// Render the `list` output
pub fn list(args: &ListArgs, config: &SuiteConfig) -> CliResult<String> {
    match args.what {
        ListTarget::Fixtures => {
            let fixtures = standard_registry(config)?.describe();
            if args.json {
                let entries: Vec<_> = fixtures
                    .iter()
                    .map(|f| json!({ "name": f.name, "type": f.type_name }))
                    .collect();
                return Ok(serde_json::to_string_pretty(&entries)?);
            }
            let width = fixtures.iter().map(|f| f.name.len()).max().unwrap_or(0);
            let mut out = String::new();
            for fixture in &fixtures {
                let _ = writeln!(out, "{:width$}  {}", fixture.name, fixture.type_name);
            }
            Ok(out)
        }
        ListTarget::Tests => {
            let suites = suites::all();
            if args.json {
                let entries: Vec<_> = suites
                    .iter()
                    .flat_map(|suite| {
                        suite.tests.iter().map(move |test| {
                            json!({
                                "suite": suite.name,
                                "name": test.name(),
                                "tags": test.tags(),
                                "fixtures": test.fixtures(),
                                "known_bug": test.known_bug_marker(),
                            })
                        })
                    })
                    .collect();
                return Ok(serde_json::to_string_pretty(&entries)?);
            }
            let mut out = String::new();
            for suite in &suites {
                let _ = writeln!(out, "{} ({} tests)", suite.name, suite.test_count());
                for test in &suite.tests {
                    let marker = if test.known_bug_marker().is_some() {
                        " [known bug]"
                    } else {
                        ""
                    };
                    let tags = test.tags().join(", ");
                    let _ = writeln!(out, "  {} [{tags}]{marker}", test.name());
                }
            }
            Ok(out)
        }
        ListTarget::KnownBugs => {
            let suites = suites::all();
            let bugs: Vec<(&str, &str, String)> = suites
                .iter()
                .flat_map(|suite| {
                    suite
                        .known_bugs()
                        .into_iter()
                        .map(move |(test, bug)| (suite.name.as_str(), test, bug.to_string()))
                })
                .collect();
            if args.json {
                let entries: Vec<_> = bugs
                    .iter()
                    .map(|(suite, test, bug)| json!({ "suite": suite, "test": test, "bug": bug }))
                    .collect();
                return Ok(serde_json::to_string_pretty(&entries)?);
            }
            let mut out = String::new();
            for (suite, test, bug) in &bugs {
                let _ = writeln!(out, "{suite}/{test}: {bug}");
            }
            Ok(out)
        }
    }
}

/// Render the effective configuration
pub fn show_config(config: &SuiteConfig) -> CliResult<String> {
    Ok(config.to_yaml()?)
}

/// Apply `run` flags over the loaded configuration
pub fn effective_config(args: &RunArgs, config: SuiteConfig) -> CliResult<SuiteConfig> {
    let mut config = config;
    if args.headed {
        config = config.with_headless(false);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    config
        .validate()
        .map_err(|err| CliError::config(err.to_string()))?;
    Ok(config)
}

fn runner(
    args: &RunArgs,
    config: &SuiteConfig,
    provider: Arc<dyn ContextProvider>,
) -> CliResult<TestRunner> {
    let mut runner = TestRunner::new(standard_registry(config)?, provider)
        .with_workers(config.workers)
        .with_test_timeout(config.test_timeout())
        .with_tags(args.tags.clone())
        .with_fail_fast(args.fail_fast);
    if let Some(ref filter) = args.filter {
        runner = runner.with_filter(filter.clone());
    }
    Ok(runner)
}

/// Names of the tests a run would execute, as `suite/name`
pub fn selection(
    args: &RunArgs,
    config: &SuiteConfig,
    suites: &[TestSuite],
) -> CliResult<Vec<String>> {
    let runner = runner(args, config, Arc::new(MockContextProvider::new()))?;
    Ok(runner
        .select(suites)
        .into_iter()
        .map(|(suite, test)| format!("{suite}/{}", test.name()))
        .collect())
}

/// Execute the `run` command; `Ok(false)` means the run had unexpected failures
pub fn run(args: &RunArgs, cli: CliConfig, config: SuiteConfig) -> CliResult<bool> {
    let config = effective_config(args, config)?;
    let suites = suites::all();
    let selected = selection(args, &config, &suites)?;

    if args.dry_run {
        for name in &selected {
            println!("{name}");
        }
        return Ok(true);
    }
    if selected.is_empty() {
        return Err(CliError::test_execution("no tests match the filter and tags"));
    }

    let mut progress = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet())
        .with_verbose(cli.verbosity.is_verbose());
    progress.header(&format!("Running {} test(s)", selected.len()));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::test_execution(format!("failed to start the async runtime: {e}")))?;
    progress.start_progress(selected.len() as u64, "running");
    let report = rt.block_on(execute(args, &config, &suites, &progress));
    progress.finish();
    let report = report?;

    emit(args, &report)?;
    progress.summary(&report);
    Ok(report.all_passed())
}

#[cfg(feature = "browser")]
async fn execute(
    args: &RunArgs,
    config: &SuiteConfig,
    suites: &[TestSuite],
    progress: &ProgressReporter,
) -> CliResult<RunReport> {
    let browser = Arc::new(vitrine::Browser::launch(config).await?);
    let provider = Arc::new(vitrine::CdpContextProvider::new(Arc::clone(&browser), config));
    let report = runner(args, config, provider)?
        .run_with(suites, |test| progress.test_finished(test))
        .await;
    if let Err(err) = browser.close().await {
        tracing::warn!(error = %err, "browser did not close cleanly");
    }
    Ok(report)
}

#[cfg(not(feature = "browser"))]
async fn execute(
    _args: &RunArgs,
    _config: &SuiteConfig,
    _suites: &[TestSuite],
    _progress: &ProgressReporter,
) -> CliResult<RunReport> {
    Err(CliError::FeatureDisabled { feature: "browser" })
}

/// Print or write the report in the requested format
fn emit(args: &RunArgs, report: &RunReport) -> CliResult<()> {
    let format = ReportFormat::from(args.format);
    match args.output {
        Some(ref path) => {
            reporter::write_report(report, format, path)?;
            tracing::info!(path = %path.display(), ?format, "report written");
        }
        None => print!("{}", reporter::render(report, format)?),
    }
    Ok(())
}
