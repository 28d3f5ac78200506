//! Suites bundled with the crate, written against the live applications.
//!
//! They are plain [`TestSuite`] values: the CLI runs them through a
//! [`TestRunner`](crate::harness::TestRunner) backed by a real browser, and
//! every fixture they declare is registered by
//! [`standard_registry`](crate::sites::standard_registry).
//!
//! Tests marked with a [`KnownBug`](crate::harness::KnownBug) assert what the
//! application *should* do, so they fail while the defect is present and show
//! up as fixed once it is gone.

#[cfg(feature = "api")]
pub mod api;
mod calculator;
mod documents;
mod playground;
mod shop;
mod todo;
mod visual;

use crate::harness::TestSuite;

/// Tags attached to bundled tests
pub mod tags {
    /// Short happy-path checks
    pub const SMOKE: &str = "smoke";
    /// Broader behaviour, including known defects
    pub const REGRESSION: &str = "regression";
    /// Multi-page user journeys
    pub const E2E: &str = "e2e";
    /// HTTP-only checks
    pub const API: &str = "api";
    /// Input validation and error paths
    pub const NEGATIVE: &str = "negative";
    /// Screenshot comparisons against stored references
    pub const VISUAL: &str = "visual";
}

/// Every bundled suite, browser suites first
#[must_use]
pub fn all() -> Vec<TestSuite> {
    #[allow(unused_mut)]
    let mut suites = vec![
        calculator::basic(),
        calculator::sbecagol(),
        shop::coffee_cart(),
        shop::polymer_shop(),
        todo::todo_list(),
        todo::sbecagol_todo(),
        documents::qr_code(),
        documents::pdf_samples(),
        playground::rate_stars(),
        playground::shadow_dom(),
        playground::dynamic_table(),
        playground::tags_input(),
        playground::verify_account(),
        playground::onboarding_modal(),
        visual::visual(),
    ];
    #[cfg(feature = "api")]
    suites.extend([api::cat_fact(), api::wizard_world()]);
    suites
}
