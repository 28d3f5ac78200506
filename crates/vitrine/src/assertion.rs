//! Expectations over locators and plain values.
//!
//! One [`Expect`] exists per test. Its hard view stops the test on the first
//! mismatch; its soft view records the mismatch in the shared
//! [`SoftAssertions`] accumulator and lets the test continue. Both views carry
//! the same [`Mismatch`] payload.
//!
//! Locator expectations retry until the expectation timeout of the locator's
//! page handle passes.

mod soft;

pub use soft::{AssertionSummary, SoftAssertions};

use crate::driver::ElementState;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// One failed comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Assertion name, e.g. `to_have_text`
    pub assertion: String,
    /// What was inspected (selector or label)
    pub subject: Option<String>,
    /// Expected value, rendered
    pub expected: String,
    /// Observed value, rendered
    pub actual: String,
}

impl Mismatch {
    /// Create a mismatch without a subject
    #[must_use]
    pub fn new(
        assertion: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            assertion: assertion.into(),
            subject: None,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Attach the inspected subject
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.assertion)?;
        if let Some(subject) = &self.subject {
            write!(f, " [{subject}]")?;
        }
        write!(f, ": expected {}, got {}", self.expected, self.actual)
    }
}

/// How a failed expectation is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssertionMode {
    /// Fail the test immediately
    #[default]
    Hard,
    /// Record and continue; the test fails at the end
    Soft,
}

/// Expected text of an element or value
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Whole string, whitespace-normalized
    Exact(String),
    /// Substring, whitespace-normalized
    Contains(String),
    /// Regular expression
    Pattern(Regex),
}

impl TextMatch {
    /// Whether `actual` satisfies this match
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Exact(expected) => normalize(actual) == normalize(expected),
            Self::Contains(expected) => normalize(actual).contains(&normalize(expected)),
            Self::Pattern(re) => re.is_match(actual),
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Contains(s) => write!(f, "text containing {s:?}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(s: &str) -> Self {
        Self::Exact(s.to_string())
    }
}

impl From<String> for TextMatch {
    fn from(s: String) -> Self {
        Self::Exact(s)
    }
}

impl From<Regex> for TextMatch {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assertion facility bound to one test.
///
/// Clones and [`Expect::soft`]/[`Expect::hard`] views share one accumulator.
#[derive(Debug, Clone, Default)]
pub struct Expect {
    mode: AssertionMode,
    soft: Arc<Mutex<SoftAssertions>>,
}

impl Expect {
    /// Hard view over a fresh accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft view sharing this accumulator
    #[must_use]
    pub fn soft(&self) -> Self {
        Self {
            mode: AssertionMode::Soft,
            soft: Arc::clone(&self.soft),
        }
    }

    /// Hard view sharing this accumulator
    #[must_use]
    pub fn hard(&self) -> Self {
        Self {
            mode: AssertionMode::Hard,
            soft: Arc::clone(&self.soft),
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> AssertionMode {
        self.mode
    }

    fn accumulator(&self) -> std::sync::MutexGuard<'_, SoftAssertions> {
        self.soft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mismatches recorded by soft views so far
    #[must_use]
    pub fn failures(&self) -> Vec<Mismatch> {
        self.accumulator().failures().to_vec()
    }

    /// Totals of every check made through any view
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        self.accumulator().summary()
    }

    /// Fail with every soft mismatch recorded, if any
    pub fn finish(&self) -> VitrineResult<()> {
        self.accumulator().verify()
    }

    fn report(&self, outcome: Result<(), Mismatch>) -> VitrineResult<()> {
        match outcome {
            Ok(()) => {
                self.accumulator().pass();
                Ok(())
            }
            Err(mismatch) => match self.mode {
                AssertionMode::Soft => {
                    self.accumulator().record(mismatch);
                    Ok(())
                }
                AssertionMode::Hard => {
                    self.accumulator().fail();
                    Err(VitrineError::AssertionFailed { mismatch })
                }
            },
        }
    }

    /// Re-query `locator` until `check` accepts its matches or the timeout passes.
    ///
    /// `check` returns the rendered actual value on rejection. Interaction
    /// errors while querying count as rejection; other errors propagate.
    async fn poll_locator<F>(
        &self,
        locator: &Locator,
        assertion: &str,
        expected: String,
        check: F,
    ) -> VitrineResult<()>
    where
        F: Fn(&[ElementState]) -> Result<(), String> + Send + Sync,
    {
        let timeouts = *locator.page().timeouts();
        let start = Instant::now();
        let actual = loop {
            let actual = match locator.resolve_all().await {
                Ok(states) => match check(&states) {
                    Ok(()) => return self.report(Ok(())),
                    Err(actual) => actual,
                },
                Err(err) if err.is_interaction() => err.to_string(),
                Err(err) => return Err(err),
            };
            if start.elapsed() >= timeouts.expect {
                break actual;
            }
            tokio::time::sleep(timeouts.poll_interval).await;
        };
        tracing::debug!(assertion, %locator, %actual, "expectation not met");
        self.report(Err(
            Mismatch::new(assertion, expected, actual).with_subject(locator.to_string())
        ))
    }

    /// The single matching element has this text
    pub async fn to_have_text(
        &self,
        locator: &Locator,
        expected: impl Into<TextMatch>,
    ) -> VitrineResult<()> {
        let expected = expected.into();
        let rendered = expected.to_string();
        self.poll_locator(locator, "to_have_text", rendered, |states| {
            let text = single(states)?.text.as_str();
            if expected.matches(text) {
                Ok(())
            } else {
                Err(format!("{text:?}"))
            }
        })
        .await
    }

    /// The single matching element's text contains `expected`
    pub async fn to_contain_text(&self, locator: &Locator, expected: &str) -> VitrineResult<()> {
        let expected = TextMatch::Contains(expected.to_string());
        let rendered = expected.to_string();
        self.poll_locator(locator, "to_contain_text", rendered, |states| {
            let text = single(states)?.text.as_str();
            if expected.matches(text) {
                Ok(())
            } else {
                Err(format!("{text:?}"))
            }
        })
        .await
    }

    /// Exactly one element matches and it is visible
    pub async fn to_be_visible(&self, locator: &Locator) -> VitrineResult<()> {
        self.poll_locator(locator, "to_be_visible", "visible".to_string(), |states| {
            if single(states)?.visible {
                Ok(())
            } else {
                Err("hidden".to_string())
            }
        })
        .await
    }

    /// Nothing matches, or every match is hidden
    pub async fn to_be_hidden(&self, locator: &Locator) -> VitrineResult<()> {
        self.poll_locator(locator, "to_be_hidden", "hidden".to_string(), |states| {
            if states.iter().all(|s| !s.visible) {
                Ok(())
            } else {
                Err("visible".to_string())
            }
        })
        .await
    }

    /// The locator matches exactly `count` elements
    pub async fn to_have_count(&self, locator: &Locator, count: usize) -> VitrineResult<()> {
        self.poll_locator(locator, "to_have_count", count.to_string(), |states| {
            if states.len() == count {
                Ok(())
            } else {
                Err(states.len().to_string())
            }
        })
        .await
    }

    /// The single matching form control has this value
    pub async fn to_have_value(
        &self,
        locator: &Locator,
        expected: impl Into<TextMatch>,
    ) -> VitrineResult<()> {
        let expected = expected.into();
        let rendered = expected.to_string();
        self.poll_locator(locator, "to_have_value", rendered, |states| {
            let state = single(states)?;
            match &state.value {
                Some(value) if expected.matches(value) => Ok(()),
                Some(value) => Err(format!("{value:?}")),
                None => Err(format!("<{}> without a value", state.tag)),
            }
        })
        .await
    }

    /// The single matching element has the attribute with this value
    pub async fn to_have_attribute(
        &self,
        locator: &Locator,
        name: &str,
        expected: impl Into<TextMatch>,
    ) -> VitrineResult<()> {
        let expected = expected.into();
        let rendered = format!("{name}={expected}");
        self.poll_locator(locator, "to_have_attribute", rendered, |states| {
            match single(states)?.attributes.get(name) {
                Some(value) if expected.matches(value) => Ok(()),
                Some(value) => Err(format!("{name}={value:?}")),
                None => Err(format!("no {name} attribute")),
            }
        })
        .await
    }

    /// The page's current URL matches
    pub async fn to_have_url(
        &self,
        page: &PageHandle,
        expected: impl Into<TextMatch>,
    ) -> VitrineResult<()> {
        let expected = expected.into();
        let timeouts = *page.timeouts();
        let start = Instant::now();
        let actual = loop {
            let url = page.url().await?;
            if expected.matches(&url) {
                return self.report(Ok(()));
            }
            if start.elapsed() >= timeouts.expect {
                break url;
            }
            tokio::time::sleep(timeouts.poll_interval).await;
        };
        self.report(Err(Mismatch::new(
            "to_have_url",
            expected.to_string(),
            format!("{actual:?}"),
        )))
    }

    /// Two plain values are equal
    pub fn equals<T: PartialEq + fmt::Debug>(
        &self,
        actual: &T,
        expected: &T,
        what: &str,
    ) -> VitrineResult<()> {
        let outcome = if actual == expected {
            Ok(())
        } else {
            Err(Mismatch::new("equals", format!("{expected:?}"), format!("{actual:?}")).with_subject(what))
        };
        self.report(outcome)
    }

    /// A string contains a substring
    pub fn contains(&self, haystack: &str, needle: &str, what: &str) -> VitrineResult<()> {
        let outcome = if haystack.contains(needle) {
            Ok(())
        } else {
            Err(Mismatch::new("contains", format!("{needle:?}"), format!("{haystack:?}")).with_subject(what))
        };
        self.report(outcome)
    }

    /// Report a check evaluated outside this facility
    pub fn check(&self, outcome: Result<(), Mismatch>) -> VitrineResult<()> {
        self.report(outcome)
    }

    /// A condition holds
    pub fn is_true(&self, condition: bool, what: &str) -> VitrineResult<()> {
        let outcome = if condition {
            Ok(())
        } else {
            Err(Mismatch::new("is_true", "true", "false").with_subject(what))
        };
        self.report(outcome)
    }
}

fn single(states: &[ElementState]) -> Result<&ElementState, String> {
    match states {
        [state] => Ok(state),
        [] => Err("<element not found>".to_string()),
        many => Err(format!("<{} elements matched>", many.len())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::wait::{LoadState, Timeouts};

    async fn opened(driver: &MockDriver) -> PageHandle {
        let page = PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate());
        page.goto("https://example.org/calc", LoadState::DomContentLoaded)
            .await
            .unwrap();
        page
    }

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_exact_normalizes_whitespace() {
            assert!(TextMatch::from("Added  to\ncart").matches(" Added to cart "));
            assert!(!TextMatch::from("Added").matches("Added to cart"));
        }

        #[test]
        fn test_contains_and_pattern() {
            assert!(TextMatch::Contains("Invoice".into()).matches("Plain Invoice #1"));
            let re = Regex::new(r"^\d+ items? left$").unwrap();
            assert!(TextMatch::from(re).matches("3 items left"));
        }

        #[test]
        fn test_mismatch_display() {
            let m = Mismatch::new("to_have_text", "\"4\"", "\"5\"").with_subject("css=#answer");
            assert_eq!(m.to_string(), "to_have_text [css=#answer]: expected \"4\", got \"5\"");
        }
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn test_hard_value_failure_is_error() {
            let expect = Expect::new();
            let err = expect.equals(&500, &200, "status").unwrap_err();
            assert!(err.is_assertion());
            assert!(expect.finish().is_ok());
        }

        #[test]
        fn test_hard_failure_shows_in_summary() {
            let expect = Expect::new();
            expect.equals(&200, &200, "status").unwrap();
            let _ = expect.equals(&500, &200, "status").unwrap_err();
            let summary = expect.summary();
            assert_eq!(summary.total, 2);
            assert_eq!(summary.failed, 1);
            assert_eq!(summary.passed, 1);
            assert!(expect.failures().is_empty());
        }

        #[test]
        fn test_soft_three_checks_one_failing() {
            let expect = Expect::new();
            let soft = expect.soft();
            soft.equals(&200, &200, "status").unwrap();
            soft.contains("cats purr", "dog", "fact").unwrap();
            soft.is_true(9 > 0, "length").unwrap();
            assert_eq!(expect.summary().total, 3);
            match expect.finish().unwrap_err() {
                VitrineError::SoftAssertions { failures } => {
                    assert_eq!(failures.len(), 1);
                    assert_eq!(failures[0].assertion, "contains");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_views_share_accumulator() {
            let expect = Expect::new();
            let soft = expect.soft();
            soft.is_true(false, "first").unwrap();
            assert_eq!(expect.hard().failures().len(), 1);
            assert_eq!(expect.soft().mode(), AssertionMode::Soft);
            assert_eq!(expect.hard().mode(), AssertionMode::Hard);
        }
    }

    mod locator_expectation_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_have_text_pass_and_fail() {
            let driver = MockDriver::new();
            driver.add(&Selector::css("#answer"), MockElement::new("span", "4"));
            let page = opened(&driver).await;
            let expect = Expect::new();
            expect.to_have_text(&page.locator("#answer"), "4").await.unwrap();
            let err = expect
                .to_have_text(&page.locator("#answer"), "5")
                .await
                .unwrap_err();
            match err {
                VitrineError::AssertionFailed { mismatch } => {
                    assert_eq!(mismatch.actual, "\"4\"");
                    assert_eq!(mismatch.subject.as_deref(), Some("css=#answer"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_to_have_text_retries_until_dom_changes() {
            let driver = MockDriver::new();
            driver.add(&Selector::css("#status"), MockElement::new("span", "loading"));
            let page = opened(&driver).await.with_timeouts(
                Timeouts::immediate().with_expect(std::time::Duration::from_secs(2)),
            );
            let flip = driver.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                flip.with_dom(|d| d.set_text(&Selector::css("#status"), "ready"));
            });
            Expect::new()
                .to_have_text(&page.locator("#status"), "ready")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_missing_element_is_assertion_not_crash() {
            let driver = MockDriver::new();
            let page = opened(&driver).await;
            let expect = Expect::new().soft();
            expect.to_be_visible(&page.locator("#nope")).await.unwrap();
            assert_eq!(expect.failures()[0].actual, "<element not found>");
        }

        #[tokio::test]
        async fn test_driver_error_propagates() {
            let driver = MockDriver::new();
            let page = opened(&driver).await;
            driver.disconnect();
            let err = Expect::new()
                .soft()
                .to_be_visible(&page.locator("#a"))
                .await
                .unwrap_err();
            assert!(matches!(err, VitrineError::Driver { .. }));
        }

        #[tokio::test]
        async fn test_count_hidden_value_url() {
            let driver = MockDriver::new();
            let items = Selector::css("li");
            driver.add(&items, MockElement::new("li", "a"));
            driver.add(&items, MockElement::new("li", "b"));
            driver.add(&Selector::css(".modal"), MockElement::new("div", "").hidden());
            driver.add(&Selector::css("#n"), MockElement::input("7"));
            let page = opened(&driver).await;
            let expect = Expect::new();
            expect.to_have_count(&page.locator("li"), 2).await.unwrap();
            expect.to_be_hidden(&page.locator(".modal")).await.unwrap();
            expect.to_be_hidden(&page.locator(".absent")).await.unwrap();
            expect.to_have_value(&page.locator("#n"), "7").await.unwrap();
            expect
                .to_have_url(&page, "https://example.org/calc")
                .await
                .unwrap();
            assert_eq!(expect.summary().passed, 5);
        }
    }
}
