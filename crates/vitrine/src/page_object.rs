//! Page Object Model support.
//!
//! Every page object embeds a [`BasePage`] (page handle, expectation facility
//! and an immutable URL) and implements [`PageObject`] to get navigation and
//! load waiting for free.
//!
//! # Example
//!
//! ```ignore
//! struct LoginPage {
//!     base: BasePage,
//!     username: Locator,
//!     submit: Locator,
//! }
//!
//! impl PageObject for LoginPage {
//!     fn base(&self) -> &BasePage {
//!         &self.base
//!     }
//! }
//!
//! impl LoginPage {
//!     pub fn new(page: PageHandle, expect: Expect) -> Self {
//!         let base = BasePage::new(page, expect, "https://example.org/login");
//!         let username = base.page().get_by_label("Username");
//!         let submit = base.page().get_by_role("button", Some("Sign in"));
//!         Self { base, username, submit }
//!     }
//! }
//! ```

use crate::assertion::Expect;
use crate::page::PageHandle;
use crate::result::VitrineResult;
use crate::wait::LoadState;
use async_trait::async_trait;

/// Handle, expectations and URL shared by every page object
#[derive(Debug, Clone)]
pub struct BasePage {
    page: PageHandle,
    expect: Expect,
    url: String,
}

impl BasePage {
    /// Create the base of a page object located at `url`
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect, url: impl Into<String>) -> Self {
        Self {
            page,
            expect,
            url: url.into(),
        }
    }

    /// Page handle
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Expectation facility
    #[must_use]
    pub const fn expect(&self) -> &Expect {
        &self.expect
    }

    /// Fixed URL of this page
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Load the URL, waiting for `DOMContentLoaded` only
    pub async fn navigate(&self) -> VitrineResult<()> {
        tracing::info!(url = %self.url, "navigate");
        self.page.goto(&self.url, LoadState::DomContentLoaded).await
    }

    /// Wait until the network has been quiet for the idle window
    pub async fn wait_until_network_idle(&self) -> VitrineResult<()> {
        self.page.wait_for_load_state(LoadState::NetworkIdle).await
    }
}

/// A screen of an application under test
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Shared base
    fn base(&self) -> &BasePage;

    /// URL this page object navigates to
    fn url(&self) -> &str {
        self.base().url()
    }

    /// Name used in logs and reports
    fn page_name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("PageObject")
    }

    /// Load the page, waiting for `DOMContentLoaded`
    async fn navigate(&self) -> VitrineResult<()> {
        self.base().navigate().await
    }

    /// Wait for a quiet network after navigation
    async fn wait_until_network_idle(&self) -> VitrineResult<()> {
        self.base().wait_until_network_idle().await
    }
}
