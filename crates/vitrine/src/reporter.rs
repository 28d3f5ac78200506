//! Run reports: plain text, JSON and JUnit XML.
//!
//! Setup failures are listed apart from assertion failures, and known-bug
//! tests get their own section so a reader can tell an anticipated defect
//! from a regression.

use crate::harness::{RunReport, TestOutcome, TestReport};
use crate::result::VitrineResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document of the whole run
    Json,
    /// JUnit XML for CI
    Junit,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "junit" => Ok(Self::Junit),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &RunReport, format: ReportFormat) -> VitrineResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
        ReportFormat::Junit => Ok(render_junit(report)),
    }
}

/// Render and write a report to a file
pub fn write_report(report: &RunReport, format: ReportFormat, path: &Path) -> VitrineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render(report, format)?)?;
    Ok(())
}

/// JSON document of the whole run
pub fn render_json(report: &RunReport) -> VitrineResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One-line summary
#[must_use]
pub fn summary_line(report: &RunReport) -> String {
    let mut line = format!(
        "{} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );
    let setup = report.setup_failed_count();
    if setup > 0 {
        let _ = write!(line, " ({setup} in setup)");
    }
    let expected = report.expected_failures().len();
    if expected > 0 {
        let _ = write!(line, ", {expected} known bug(s)");
    }
    let skipped = report.skipped_count();
    if skipped > 0 {
        let _ = write!(line, ", {skipped} skipped");
    }
    let _ = write!(line, " in {:.2}s", report.duration_ms as f64 / 1000.0);
    line
}

/// Detail lines for one failed test
#[must_use]
pub fn failure_details(test: &TestReport) -> Vec<String> {
    let mut lines = Vec::new();
    match &test.outcome {
        TestOutcome::Failed { kind, message } => {
            lines.push(format!("{kind:?} failure: {message}"));
        }
        TestOutcome::SetupFailed { message } => lines.push(format!("setup: {message}")),
        TestOutcome::TimedOut { ms } => lines.push(format!("timed out after {ms}ms")),
        TestOutcome::Passed | TestOutcome::SoftFailed { .. } | TestOutcome::Skipped => {}
    }
    for (i, mismatch) in test.soft_failures.iter().enumerate() {
        lines.push(format!("soft {}. {mismatch}", i + 1));
    }
    lines
}

/// Human-readable report
#[must_use]
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {}", report.run_id);
    for test in &report.tests {
        let _ = writeln!(
            out,
            "  [{}] {}/{} ({}ms)",
            test.outcome.label(),
            test.suite,
            test.name,
            test.duration_ms
        );
    }

    let unexpected: Vec<_> = report
        .tests
        .iter()
        .filter(|t| t.is_unexpected_failure())
        .collect();
    let (setup, other): (Vec<&TestReport>, Vec<&TestReport>) = unexpected
        .into_iter()
        .partition(|t| matches!(t.outcome, TestOutcome::SetupFailed { .. }));

    if !other.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for test in other {
            let _ = writeln!(out, "  {}/{}", test.suite, test.name);
            for line in failure_details(test) {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    if !setup.is_empty() {
        let _ = writeln!(out, "\nSetup failures:");
        for test in setup {
            let _ = writeln!(out, "  {}/{}", test.suite, test.name);
            for line in failure_details(test) {
                let _ = writeln!(out, "    {line}");
            }
        }
    }

    let expected = report.expected_failures();
    let fixed = report.fixed_known_bugs();
    if !expected.is_empty() || !fixed.is_empty() {
        let _ = writeln!(out, "\nKnown bugs:");
        for test in expected {
            if let Some(bug) = &test.known_bug {
                let _ = writeln!(out, "  {}/{}: {bug} (still reproduces)", test.suite, test.name);
            }
        }
        for test in fixed {
            if let Some(bug) = &test.known_bug {
                let _ = writeln!(out, "  {}/{}: {bug} (no longer reproduces)", test.suite, test.name);
            }
        }
    }

    let _ = writeln!(out, "\n{}", summary_line(report));
    out
}

/// JUnit XML, one `<testsuite>` per suite name
#[must_use]
pub fn render_junit(report: &RunReport) -> String {
    let mut suites: Vec<&str> = report.tests.iter().map(|t| t.suite.as_str()).collect();
    suites.dedup();

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str("<testsuites>\n");
    for suite in suites {
        let tests: Vec<_> = report.tests.iter().filter(|t| t.suite == suite).collect();
        let failures = tests.iter().filter(|t| t.outcome.is_failed()).count();
        let skipped = tests
            .iter()
            .filter(|t| t.outcome == TestOutcome::Skipped)
            .count();
        let time: u64 = tests.iter().map(|t| t.duration_ms).sum();
        let _ = writeln!(
            xml,
            r#"  <testsuite name="{}" tests="{}" failures="{failures}" skipped="{skipped}" time="{:.3}">"#,
            escape_xml(suite),
            tests.len(),
            time as f64 / 1000.0
        );
        for test in tests {
            let _ = writeln!(
                xml,
                r#"    <testcase name="{}" classname="{}" time="{:.3}">"#,
                escape_xml(&test.name),
                escape_xml(suite),
                test.duration_ms as f64 / 1000.0
            );
            if test.outcome == TestOutcome::Skipped {
                xml.push_str("      <skipped/>\n");
            } else if test.outcome.is_failed() {
                let details = failure_details(test).join("\n");
                let message = match &test.outcome {
                    TestOutcome::SoftFailed { failures } => {
                        format!("{} soft assertion(s) failed", failures.len())
                    }
                    other => other.label().to_string(),
                };
                let _ = writeln!(
                    xml,
                    r#"      <failure message="{}">{}</failure>"#,
                    escape_xml(&message),
                    escape_xml(&details)
                );
            }
            xml.push_str("    </testcase>\n");
        }
        xml.push_str("  </testsuite>\n");
    }
    xml.push_str("</testsuites>\n");
    xml
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
