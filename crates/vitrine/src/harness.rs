//! Test harness: test cases, suites and the concurrent runner.
//!
//! Each selected test runs in its own browser context acquired from a
//! [`ContextProvider`]. Fixtures are resolved right after acquisition, the
//! body runs under the test timeout, and soft mismatches are collected once
//! the body returns. The context is released on every path.

use crate::assertion::{AssertionSummary, Expect, Mismatch};
use crate::context::{with_context, ContextProvider};
use crate::fixture::{FixtureContext, FixtureRegistry, Fixtures};
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default per-test timeout (60 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of concurrently running tests
pub const DEFAULT_WORKERS: usize = 4;

/// What a test body receives
#[derive(Debug)]
pub struct TestContext {
    name: String,
    page: PageHandle,
    expect: Expect,
    fixtures: Fixtures,
}

impl TestContext {
    /// Test name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page handle of this test's browser context
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Hard expectations
    #[must_use]
    pub fn expect(&self) -> Expect {
        self.expect.hard()
    }

    /// Soft expectations, reported when the test ends
    #[must_use]
    pub fn soft(&self) -> Expect {
        self.expect.soft()
    }

    /// A fixture declared with [`TestCase::uses`]
    pub fn fixture<T: 'static>(&self, name: &str) -> VitrineResult<&T> {
        self.fixtures.get(name)
    }
}

type TestBody = Arc<dyn Fn(TestContext) -> BoxFuture<'static, VitrineResult<()>> + Send + Sync>;

/// Marks a test that exercises a defect of the application under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownBug {
    /// Tracker reference, e.g. `BUG #1`
    pub reference: Option<String>,
    /// What the application does wrong
    pub description: String,
}

impl KnownBug {
    /// Create a marker with a description
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            reference: None,
            description: description.into(),
        }
    }

    /// Attach a tracker reference
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

impl fmt::Display for KnownBug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{reference}: {}", self.description),
            None => write!(f, "{}", self.description),
        }
    }
}

/// A single test case
#[derive(Clone)]
pub struct TestCase {
    name: String,
    fixtures: Vec<String>,
    tags: Vec<String>,
    known_bug: Option<KnownBug>,
    timeout: Option<Duration>,
    body: TestBody,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("fixtures", &self.fixtures)
            .field("tags", &self.tags)
            .field("known_bug", &self.known_bug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TestCase {
    /// Create a test case from an async body
    #[must_use]
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = VitrineResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            fixtures: Vec::new(),
            tags: Vec::new(),
            known_bug: None,
            timeout: None,
            body: Arc::new(move |ctx| body(ctx).boxed()),
        }
    }

    /// Declare the fixtures this test needs
    #[must_use]
    pub fn uses(mut self, names: &[&str]) -> Self {
        self.fixtures
            .extend(names.iter().map(|name| (*name).to_string()));
        self
    }

    /// Add a tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Mark as exercising a known defect
    #[must_use]
    pub fn known_bug(mut self, bug: KnownBug) -> Self {
        self.known_bug = Some(bug);
        self
    }

    /// Override the runner's test timeout for this test
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Test name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fixtures
    #[must_use]
    pub fn fixtures(&self) -> &[String] {
        &self.fixtures
    }

    /// Tags
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Known-bug marker
    #[must_use]
    pub const fn known_bug_marker(&self) -> Option<&KnownBug> {
        self.known_bug.as_ref()
    }

    /// Timeout override, if any
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A named group of test cases
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Tests in this suite
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Add a test case
    #[must_use]
    pub fn with_test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }

    /// Add a test case in place
    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Tests marked with a known bug
    #[must_use]
    pub fn known_bugs(&self) -> Vec<(&str, &KnownBug)> {
        self.tests
            .iter()
            .filter_map(|t| t.known_bug.as_ref().map(|bug| (t.name.as_str(), bug)))
            .collect()
    }
}

/// Why a failed test failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A hard expectation did not hold
    Assertion,
    /// An element was missing or could not be acted on
    Interaction,
    /// The browser session or another dependency failed
    Environment,
    /// The test body panicked
    Panic,
}

/// Outcome of one test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    /// All checks passed
    Passed,
    /// Stopped by an error
    Failed {
        /// Classification
        kind: FailureKind,
        /// Rendered error
        message: String,
    },
    /// Body completed but soft checks failed
    SoftFailed {
        /// Recorded mismatches
        failures: Vec<Mismatch>,
    },
    /// Fixtures or context could not be prepared; the body never ran
    SetupFailed {
        /// Rendered error
        message: String,
    },
    /// Exceeded the test timeout
    TimedOut {
        /// Timeout in milliseconds
        ms: u64,
    },
    /// Not run because the run stopped early
    Skipped,
}

impl TestOutcome {
    /// Whether the test passed
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Whether the test ran and did not pass
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        !matches!(self, Self::Passed | Self::Skipped)
    }

    /// Failure caused by the application's behaviour: a hard or soft
    /// expectation that did not hold
    #[must_use]
    pub const fn is_behavioural_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                kind: FailureKind::Assertion,
                ..
            } | Self::SoftFailed { .. }
        )
    }

    /// Short label for reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::SoftFailed { .. } => "soft-failed",
            Self::SetupFailed { .. } => "setup-failed",
            Self::TimedOut { .. } => "timed-out",
            Self::Skipped => "skipped",
        }
    }

    fn from_error(err: VitrineError) -> Self {
        if err.is_setup() {
            return Self::SetupFailed {
                message: err.to_string(),
            };
        }
        if let VitrineError::SoftAssertions { failures } = err {
            return Self::SoftFailed { failures };
        }
        let kind = if err.is_assertion() {
            FailureKind::Assertion
        } else if err.is_interaction() {
            FailureKind::Interaction
        } else {
            FailureKind::Environment
        };
        Self::Failed {
            kind,
            message: err.to_string(),
        }
    }
}

/// Result of one test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// Suite name
    pub suite: String,
    /// Test name
    pub name: String,
    /// Tags
    pub tags: Vec<String>,
    /// Known-bug marker
    pub known_bug: Option<KnownBug>,
    /// Outcome
    pub outcome: TestOutcome,
    /// Soft mismatches recorded, including those behind a hard failure
    pub soft_failures: Vec<Mismatch>,
    /// Check totals
    pub assertions: AssertionSummary,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl TestReport {
    /// Failure that the known-bug marker anticipates. Setup, timeout,
    /// environment and panic failures never qualify.
    #[must_use]
    pub const fn is_expected_failure(&self) -> bool {
        self.known_bug.is_some() && self.outcome.is_behavioural_failure()
    }

    /// Failure that should fail the run
    #[must_use]
    pub const fn is_unexpected_failure(&self) -> bool {
        self.outcome.is_failed() && !self.is_expected_failure()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Per-test results in declaration order
    pub tests: Vec<TestReport>,
}

impl RunReport {
    /// Tests that passed
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome.is_passed()).count()
    }

    /// Failures not covered by a known-bug marker
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.is_unexpected_failure()).count()
    }

    /// Setup failures, counted apart from assertion failures
    #[must_use]
    pub fn setup_failed_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| matches!(t.outcome, TestOutcome::SetupFailed { .. }))
            .count()
    }

    /// Known-bug tests that failed as anticipated
    #[must_use]
    pub fn expected_failures(&self) -> Vec<&TestReport> {
        self.tests.iter().filter(|t| t.is_expected_failure()).collect()
    }

    /// Known-bug tests that unexpectedly passed
    #[must_use]
    pub fn fixed_known_bugs(&self) -> Vec<&TestReport> {
        self.tests
            .iter()
            .filter(|t| t.known_bug.is_some() && t.outcome.is_passed())
            .collect()
    }

    /// Tests skipped after an early stop
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| t.outcome == TestOutcome::Skipped)
            .count()
    }

    /// No unexpected failure
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Runs suites concurrently, one browser context per test
pub struct TestRunner {
    registry: Arc<FixtureRegistry>,
    provider: Arc<dyn ContextProvider>,
    workers: usize,
    filter: Option<String>,
    tags: Vec<String>,
    fail_fast: bool,
    test_timeout: Duration,
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("registry", &self.registry)
            .field("provider", &self.provider)
            .field("workers", &self.workers)
            .field("filter", &self.filter)
            .field("tags", &self.tags)
            .field("fail_fast", &self.fail_fast)
            .field("test_timeout", &self.test_timeout)
            .finish()
    }
}

impl TestRunner {
    /// Create a runner over a registry and a context provider
    #[must_use]
    pub fn new(registry: Arc<FixtureRegistry>, provider: Arc<dyn ContextProvider>) -> Self {
        Self {
            registry,
            provider,
            workers: DEFAULT_WORKERS,
            filter: None,
            tags: Vec::new(),
            fail_fast: false,
            test_timeout: DEFAULT_TEST_TIMEOUT,
        }
    }

    /// Maximum concurrently running tests
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Only run tests whose `suite/name` contains the filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Only run tests carrying at least one of these tags
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Stop starting tests after the first unexpected failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Deadline for tests that set none of their own
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Tests selected by the filter and tags, in declaration order
    #[must_use]
    pub fn select<'a>(&self, suites: &'a [TestSuite]) -> Vec<(&'a str, &'a TestCase)> {
        suites
            .iter()
            .flat_map(|suite| suite.tests.iter().map(move |t| (suite.name.as_str(), t)))
            .filter(|(suite, test)| {
                self.filter
                    .as_deref()
                    .map_or(true, |f| format!("{suite}/{}", test.name).contains(f))
            })
            .filter(|(_, test)| {
                self.tags.is_empty() || test.tags.iter().any(|t| self.tags.contains(t))
            })
            .collect()
    }

    /// Run the selected tests
    pub async fn run(&self, suites: &[TestSuite]) -> RunReport {
        self.run_with(suites, |_| {}).await
    }

    /// Run the selected tests, calling `on_result` as each one finishes
    pub async fn run_with<F>(&self, suites: &[TestSuite], on_result: F) -> RunReport
    where
        F: Fn(&TestReport) + Send + Sync,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let selected = self.select(suites);
        let stop = AtomicBool::new(false);
        tracing::info!(tests = selected.len(), workers = self.workers, "run started");

        let mut indexed: Vec<(usize, TestReport)> =
            futures::stream::iter(selected.into_iter().enumerate())
            .map(|(index, (suite, case))| {
                let stop = &stop;
                let on_result = &on_result;
                async move {
                    let report = if stop.load(Ordering::SeqCst) {
                        skipped(suite, case)
                    } else {
                        self.run_case(suite, case).await
                    };
                    if self.fail_fast && report.is_unexpected_failure() {
                        stop.store(true, Ordering::SeqCst);
                    }
                    on_result(&report);
                    (index, report)
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            tests: indexed.into_iter().map(|(_, report)| report).collect(),
        };
        tracing::info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "run finished"
        );
        report
    }

    async fn run_case(&self, suite: &str, case: &TestCase) -> TestReport {
        let start = Instant::now();
        tracing::info!(suite, test = %case.name, "test started");
        let expect = Expect::new();
        let scoped = with_context(self.provider.as_ref(), |page| {
            self.execute(case, page, expect.clone())
        })
        .await;
        let outcome = match scoped {
            Ok(outcome) => outcome,
            Err(err) => TestOutcome::SetupFailed {
                message: format!("browser context unavailable: {err}"),
            },
        };
        tracing::info!(suite, test = %case.name, outcome = outcome.label(), "test finished");
        TestReport {
            suite: suite.to_string(),
            name: case.name.clone(),
            tags: case.tags.clone(),
            known_bug: case.known_bug.clone(),
            outcome,
            soft_failures: expect.failures(),
            assertions: expect.summary(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn execute(&self, case: &TestCase, page: PageHandle, expect: Expect) -> TestOutcome {
        let ctx = FixtureContext::new(page.clone(), expect.clone());
        let fixtures = match self.registry.resolve(&case.fixtures, &ctx) {
            Ok(fixtures) => fixtures,
            Err(err) => {
                tracing::warn!(test = %case.name, error = %err, "fixture setup failed");
                return TestOutcome::SetupFailed {
                    message: err.to_string(),
                };
            }
        };
        let body = (case.body)(TestContext {
            name: case.name.clone(),
            page,
            expect: expect.clone(),
            fixtures,
        });
        let guarded = AssertUnwindSafe(body).catch_unwind();
        let timeout = case.timeout.unwrap_or(self.test_timeout);
        match tokio::time::timeout(timeout, guarded).await {
            Err(_) => TestOutcome::TimedOut {
                ms: timeout.as_millis() as u64,
            },
            Ok(Err(panic)) => TestOutcome::Failed {
                kind: FailureKind::Panic,
                message: panic_message(panic.as_ref()),
            },
            Ok(Ok(Err(err))) => TestOutcome::from_error(err),
            Ok(Ok(Ok(()))) => match expect.finish() {
                Ok(()) => TestOutcome::Passed,
                Err(err) => TestOutcome::from_error(err),
            },
        }
    }
}

fn skipped(suite: &str, case: &TestCase) -> TestReport {
    TestReport {
        suite: suite.to_string(),
        name: case.name.clone(),
        tags: case.tags.clone(),
        known_bug: case.known_bug.clone(),
        outcome: TestOutcome::Skipped,
        soft_failures: Vec::new(),
        assertions: AssertionSummary::default(),
        duration_ms: 0,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "test panicked".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::MockContextProvider;
    use crate::driver::{MockDriver, MockElement};
    use crate::fixture::FixtureRegistryBuilder;
    use crate::locator::Selector;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn empty_registry() -> Arc<FixtureRegistry> {
        FixtureRegistryBuilder::new().build().unwrap()
    }

    fn runner(registry: Arc<FixtureRegistry>, provider: &MockContextProvider) -> TestRunner {
        TestRunner::new(registry, Arc::new(provider.clone()))
    }

    mod test_case_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let case = TestCase::new("adds", |_ctx| async { Ok(()) })
                .uses(&["calculator_page"])
                .tag("smoke")
                .known_bug(KnownBug::new("NaN on divide by zero").with_reference("BUG #2"))
                .with_timeout(Duration::from_secs(5));
            assert_eq!(case.fixtures(), &["calculator_page".to_string()]);
            assert_eq!(case.tags(), &["smoke".to_string()]);
            assert_eq!(
                case.known_bug_marker().unwrap().to_string(),
                "BUG #2: NaN on divide by zero"
            );
            assert_eq!(case.timeout(), Some(Duration::from_secs(5)));
        }

        #[test]
        fn test_suite_known_bugs() {
            let suite = TestSuite::new("todo")
                .with_test(TestCase::new("adds item", |_ctx| async { Ok(()) }))
                .with_test(
                    TestCase::new("counter resets", |_ctx| async { Ok(()) })
                        .known_bug(KnownBug::new("counter keeps old value")),
                );
            let bugs = suite.known_bugs();
            assert_eq!(bugs.len(), 1);
            assert_eq!(bugs[0].0, "counter resets");
        }
    }

    mod runner_tests {
        use super::*;

        #[tokio::test]
        async fn test_pass_and_context_released() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("s").with_test(TestCase::new("ok", |ctx| async move {
                ctx.page()
                    .goto("https://example.org/", crate::wait::LoadState::Load)
                    .await?;
                ctx.expect().to_have_url(ctx.page(), "https://example.org/").await
            }));
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert_eq!(report.tests[0].outcome, TestOutcome::Passed);
            assert!(report.all_passed());
            assert_eq!(provider.stats().in_use(), 0);
        }

        #[tokio::test]
        async fn test_soft_failures_reported_after_all_checks_ran() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("api").with_test(TestCase::new("cat fact", |ctx| async move {
                let soft = ctx.soft();
                soft.equals(&200_u16, &200, "status")?;
                soft.contains("", "cat", "fact")?;
                soft.is_true(true, "length")?;
                Ok(())
            }));
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            let test = &report.tests[0];
            match &test.outcome {
                TestOutcome::SoftFailed { failures } => assert_eq!(failures.len(), 1),
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(test.assertions.total, 3);
            assert!(!report.all_passed());
        }

        #[tokio::test]
        async fn test_hard_failure_stops_remaining_steps() {
            let provider = MockContextProvider::new();
            let steps = Arc::new(Mutex::new(Vec::new()));
            let seen = Arc::clone(&steps);
            let suite = TestSuite::new("s").with_test(TestCase::new("five steps", move |ctx| {
                let seen = Arc::clone(&seen);
                async move {
                    for step in 1..=5 {
                        seen.lock().unwrap().push(step);
                        ctx.expect().is_true(step != 2, "step")?;
                    }
                    Ok(())
                }
            }));
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert!(matches!(
                report.tests[0].outcome,
                TestOutcome::Failed {
                    kind: FailureKind::Assertion,
                    ..
                }
            ));
            assert_eq!(*steps.lock().unwrap(), vec![1, 2]);
        }

        #[tokio::test]
        async fn test_unknown_fixture_is_setup_failure_and_body_skipped() {
            let provider = MockContextProvider::new();
            let ran = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&ran);
            let suite = TestSuite::new("s").with_test(
                TestCase::new("needs page", move |_ctx| {
                    let flag = Arc::clone(&flag);
                    async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .uses(&["nonexistent_page"]),
            );
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert!(matches!(
                report.tests[0].outcome,
                TestOutcome::SetupFailed { .. }
            ));
            assert_eq!(report.setup_failed_count(), 1);
            assert!(!ran.load(Ordering::SeqCst));
            assert_eq!(provider.stats().in_use(), 0);
        }

        #[tokio::test]
        async fn test_timeout_releases_context() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("s").with_test(
                TestCase::new("slow", |ctx| async move {
                    ctx.page().wait(5.0).await;
                    Ok(())
                })
                .with_timeout(Duration::from_millis(20)),
            );
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert_eq!(report.tests[0].outcome, TestOutcome::TimedOut { ms: 20 });
            assert_eq!(provider.stats().in_use(), 0);
        }

        #[tokio::test]
        async fn test_runner_timeout_applies_without_override() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("s").with_test(TestCase::new("slow", |ctx| async move {
                ctx.page().wait(5.0).await;
                Ok(())
            }));
            let report = runner(empty_registry(), &provider)
                .with_test_timeout(Duration::from_millis(30))
                .run(&[suite])
                .await;
            assert_eq!(report.tests[0].outcome, TestOutcome::TimedOut { ms: 30 });
        }

        #[tokio::test]
        async fn test_panic_is_contained() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("s").with_test(TestCase::new("boom", |_ctx| async {
                panic!("exploded");
            }));
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            match &report.tests[0].outcome {
                TestOutcome::Failed { kind, message } => {
                    assert_eq!(*kind, FailureKind::Panic);
                    assert_eq!(message, "exploded");
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(provider.stats().in_use(), 0);
        }

        #[tokio::test]
        async fn test_context_acquire_failure_is_setup_failure() {
            let provider = MockContextProvider::new();
            provider.fail_acquire();
            let suite =
                TestSuite::new("s").with_test(TestCase::new("any", |_ctx| async { Ok(()) }));
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert!(matches!(
                report.tests[0].outcome,
                TestOutcome::SetupFailed { .. }
            ));
        }

        #[tokio::test]
        async fn test_fixtures_distinct_per_test_and_concurrent() {
            let provider = MockContextProvider::new().with_setup(|driver: &MockDriver| {
                driver.add(&Selector::css("#n"), MockElement::input("0"));
            });
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let registry = FixtureRegistryBuilder::new()
                .register("page_id", move |ctx: &FixtureContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(ctx.page().id())
                })
                .build()
                .unwrap();
            let ids = Arc::new(Mutex::new(Vec::new()));
            let mut suite = TestSuite::new("s");
            for i in 0..4 {
                let ids = Arc::clone(&ids);
                suite.add_test(
                    TestCase::new(format!("t{i}"), move |ctx| {
                        let ids = Arc::clone(&ids);
                        async move {
                            let id = *ctx.fixture::<Uuid>("page_id")?;
                            ids.lock().unwrap().push(id);
                            Ok(())
                        }
                    })
                    .uses(&["page_id"]),
                );
            }
            let report = runner(registry, &provider).with_workers(2).run(&[suite]).await;
            assert!(report.all_passed());
            assert_eq!(calls.load(Ordering::SeqCst), 4);
            let mut ids = ids.lock().unwrap().clone();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 4);
            let names: Vec<_> = report.tests.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["t0", "t1", "t2", "t3"]);
        }

        #[tokio::test]
        async fn test_known_bug_failure_does_not_fail_run() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("calc").with_test(
                TestCase::new("divide by zero", |ctx| async move {
                    ctx.expect().equals(&"NaN", &"Infinity", "answer")
                })
                .known_bug(KnownBug::new("divide by zero shows NaN")),
            );
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert!(report.all_passed());
            assert_eq!(report.expected_failures().len(), 1);
        }

        #[tokio::test]
        async fn test_known_bug_setup_failure_still_fails_run() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("calc").with_test(
                TestCase::new("divide by zero", |_ctx| async { Ok(()) })
                    .uses(&["calculator_page"])
                    .known_bug(KnownBug::new("divide by zero shows NaN")),
            );
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert!(matches!(
                report.tests[0].outcome,
                TestOutcome::SetupFailed { .. }
            ));
            assert_eq!(report.setup_failed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert!(report.expected_failures().is_empty());
            assert!(!report.all_passed());
        }

        #[tokio::test]
        async fn test_known_bug_timeout_and_panic_still_fail_run() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("calc")
                .with_test(
                    TestCase::new("slow", |ctx| async move {
                        ctx.page().wait(5.0).await;
                        Ok(())
                    })
                    .with_timeout(Duration::from_millis(20))
                    .known_bug(KnownBug::new("hangs")),
                )
                .with_test(
                    TestCase::new("panics", |_ctx| async { panic!("boom") })
                        .known_bug(KnownBug::new("crashes")),
                );
            let report = runner(empty_registry(), &provider).run(&[suite]).await;
            assert_eq!(report.failed_count(), 2);
            assert!(report.expected_failures().is_empty());
            assert!(!report.all_passed());
        }

        #[test]
        fn test_behavioural_failures() {
            assert!(TestOutcome::SoftFailed { failures: Vec::new() }.is_behavioural_failure());
            assert!(TestOutcome::Failed {
                kind: FailureKind::Assertion,
                message: String::new(),
            }
            .is_behavioural_failure());
            assert!(!TestOutcome::Failed {
                kind: FailureKind::Environment,
                message: String::new(),
            }
            .is_behavioural_failure());
            assert!(!TestOutcome::TimedOut { ms: 1 }.is_behavioural_failure());
            assert!(!TestOutcome::SetupFailed {
                message: String::new(),
            }
            .is_behavioural_failure());
        }

        #[tokio::test]
        async fn test_filter_tags_and_fail_fast() {
            let provider = MockContextProvider::new();
            let suite = TestSuite::new("s")
                .with_test(
                    TestCase::new("first", |_ctx| async { Err(VitrineError::driver("down")) })
                        .tag("smoke"),
                )
                .with_test(TestCase::new("second", |_ctx| async { Ok(()) }).tag("smoke"))
                .with_test(TestCase::new("other", |_ctx| async { Ok(()) }));
            let suites = [suite];
            let tagged = runner(empty_registry(), &provider).with_tags(vec!["smoke".into()]);
            assert_eq!(tagged.select(&suites).len(), 2);
            let filtered = runner(empty_registry(), &provider).with_filter("s/oth");
            assert_eq!(filtered.select(&suites).len(), 1);

            let report = runner(empty_registry(), &provider)
                .with_workers(1)
                .with_fail_fast(true)
                .run(&suites)
                .await;
            assert!(matches!(
                report.tests[0].outcome,
                TestOutcome::Failed {
                    kind: FailureKind::Environment,
                    ..
                }
            ));
            assert_eq!(report.skipped_count(), 2);
        }
    }
}
