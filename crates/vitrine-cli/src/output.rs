//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use vitrine::reporter::failure_details;
use vitrine::{RunReport, TestOutcome, TestReport};

/// Progress reporter for a run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print a line for every finished test, not only failures
    pub verbose: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Report every finished test
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Start a progress bar for multiple tests
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Record one finished test
    pub fn test_finished(&self, report: &TestReport) {
        self.increment(1);
        let title = format!("{}/{}", report.suite, report.name);
        if report.is_unexpected_failure() {
            self.failure(&title);
            for line in failure_details(report) {
                self.detail(&line);
            }
            return;
        }
        if !self.verbose {
            return;
        }
        if report.is_expected_failure() {
            let bug = report
                .known_bug
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            self.warning(&format!("{title} (known bug: {bug})"));
        } else if report.known_bug.is_some() && report.outcome.is_passed() {
            self.info(&format!("{title} passed; its known bug looks fixed"));
        } else if matches!(report.outcome, TestOutcome::Skipped) {
            self.info(&format!("{title} skipped"));
        } else {
            self.success(&title);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line("");
        self.line(&styled);
    }

    /// Print the closing summary of a run
    pub fn summary(&self, report: &RunReport) {
        if self.quiet && report.all_passed() {
            return;
        }
        let line = vitrine::reporter::summary_line(report);
        let styled = if !self.use_color {
            let status = if report.all_passed() { "PASSED" } else { "FAILED" };
            format!("{status} {line}")
        } else if report.all_passed() {
            format!("{} {line}", Style::new().green().bold().apply_to("PASSED"))
        } else {
            format!("{} {line}", Style::new().red().bold().apply_to("FAILED"))
        };
        self.line("");
        self.line(&styled);

        let fixed = report.fixed_known_bugs();
        if !fixed.is_empty() {
            self.warning(&format!(
                "{} known bug(s) no longer reproduce; drop their markers",
                fixed.len()
            ));
        }
    }

    fn detail(&self, message: &str) {
        let text = if self.use_color {
            style(message).dim().to_string()
        } else {
            message.to_string()
        };
        self.line(&format!("    {text}"));
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }
}
