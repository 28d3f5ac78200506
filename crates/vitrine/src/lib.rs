//! Vitrine: page objects, fixtures and soft assertions for browser
//! end-to-end suites.
//!
//! A test declares the fixtures it needs by name; the runner gives every
//! test a fresh browser context, builds only the requested page objects
//! against it, runs the body under a timeout and reports hard failures,
//! soft mismatches and known defects separately.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │  TestSuite   │──►│   TestRunner     │──►│ ContextProvider  │
//! │  TestCase    │   │ (bounded workers)│   │ (CDP or mock)    │
//! └──────────────┘   └────────┬─────────┘   └────────┬─────────┘
//!                             │ resolve names        │ PageHandle
//!                    ┌────────▼─────────┐   ┌────────▼─────────┐
//!                    │ FixtureRegistry  │──►│ Page objects     │
//!                    │                  │   │ Locator + Expect │
//!                    └──────────────────┘   └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vitrine::prelude::*;
//! use vitrine::sites::{calculator::{BasicCalculatorPage, Operation}, names};
//!
//! let suite = TestSuite::new("calculator").with_test(
//!     TestCase::new("adds", |ctx| async move {
//!         let calc = ctx.fixture::<BasicCalculatorPage>(names::BASIC_CALCULATOR)?;
//!         calc.navigate().await?;
//!         calc.compute("2", Operation::Add, "3").await?;
//!         calc.verify_result("5").await
//!     })
//!     .uses(&[names::BASIC_CALCULATOR]),
//! );
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[cfg(feature = "api")]
pub mod api;
pub mod assertion;
#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod context;
pub mod decode;
pub mod driver;
pub mod fixture;
pub mod harness;
pub mod interaction;
pub mod locator;
pub mod page;
pub mod page_object;
pub mod reporter;
mod result;
pub mod sites;
pub mod suites;
pub mod visual;
pub mod wait;

#[cfg(feature = "api")]
pub use api::{ApiClient, ApiResponse};
pub use assertion::{AssertionMode, AssertionSummary, Expect, Mismatch, TextMatch};
#[cfg(feature = "browser")]
pub use browser::{Browser, CdpContextProvider, CdpDriver};
pub use config::SuiteConfig;
pub use context::{with_context, ContextPoolStats, ContextProvider, MockContextProvider};
pub use decode::{PdfText, QrDecoder};
pub use driver::{Download, Driver, MockDriver, MockElement, PseudoElement};
pub use fixture::{FixtureContext, FixtureRegistry, FixtureRegistryBuilder, Fixtures};
pub use harness::{
    KnownBug, RunReport, TestCase, TestContext, TestOutcome, TestReport, TestRunner, TestSuite,
};
pub use locator::{Locator, Selector};
pub use page::PageHandle;
pub use page_object::{BasePage, PageObject};
pub use reporter::ReportFormat;
pub use result::{VitrineError, VitrineResult};
pub use visual::ScreenshotComparator;
pub use wait::{LoadState, Timeouts};

/// Everything a suite author usually needs
pub mod prelude {
    pub use super::assertion::{Expect, TextMatch};
    pub use super::fixture::{FixtureContext, FixtureRegistryBuilder};
    pub use super::harness::{KnownBug, TestCase, TestContext, TestRunner, TestSuite};
    pub use super::interaction::keys;
    pub use super::locator::{Locator, Selector};
    pub use super::page::PageHandle;
    pub use super::page_object::{BasePage, PageObject};
    pub use super::result::{VitrineError, VitrineResult};
    pub use super::wait::LoadState;
}
