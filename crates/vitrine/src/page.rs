//! Page handle: the capability a page object holds for one test.

use crate::driver::{Download, Driver};
use crate::locator::{Locator, Selector};
use crate::result::VitrineResult;
use crate::wait::{LoadState, Timeouts};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default directory for captured downloads
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Cloneable handle to one browser page in one isolated context.
///
/// Clones share the same session; every locator built from a handle acts on
/// that session only.
#[derive(Debug, Clone)]
pub struct PageHandle {
    id: Uuid,
    driver: Arc<dyn Driver>,
    timeouts: Timeouts,
    download_dir: PathBuf,
}

impl PageHandle {
    /// Wrap a driver session
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver,
            timeouts: Timeouts::default(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
        }
    }

    /// Set the timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the download directory
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Save downloads to a directory of this page's own under `root`
    #[must_use]
    pub fn with_download_root(self, root: impl AsRef<Path>) -> Self {
        let dir = root.as_ref().join(self.id.to_string());
        self.with_download_dir(dir)
    }

    /// Copy of this handle with a different action timeout
    #[must_use]
    pub fn with_action_timeout(&self, action: Duration) -> Self {
        let mut handle = self.clone();
        handle.timeouts = handle.timeouts.with_action(action);
        handle
    }

    /// Session identifier, unique per handle created by [`PageHandle::new`]
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Driver behind this handle
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Timeouts applied by locators and expectations
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Directory downloads are saved to
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Locator for an arbitrary selector
    #[must_use]
    pub fn select(&self, selector: Selector) -> Locator {
        Locator::new(self.clone(), selector)
    }

    /// Locator for a CSS selector
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Locator {
        self.select(Selector::css(css))
    }

    /// Locator by `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Locator {
        self.select(Selector::test_id(id))
    }

    /// Locator by ARIA role with an optional substring name
    #[must_use]
    pub fn get_by_role(&self, role: &str, name: Option<&str>) -> Locator {
        self.select(Selector::role(role, name))
    }

    /// Locator by ARIA role with an exact name
    #[must_use]
    pub fn get_by_role_exact(&self, role: &str, name: &str) -> Locator {
        self.select(Selector::role_exact(role, name))
    }

    /// Locator by visible text (substring)
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<String>) -> Locator {
        self.select(Selector::text(text))
    }

    /// Locator by associated label
    #[must_use]
    pub fn get_by_label(&self, text: impl Into<String>) -> Locator {
        self.select(Selector::Label(text.into()))
    }

    /// Locator by `title` attribute
    #[must_use]
    pub fn get_by_title(&self, text: impl Into<String>) -> Locator {
        self.select(Selector::Title(text.into()))
    }

    /// Locator by `alt` text
    #[must_use]
    pub fn get_by_alt_text(&self, text: impl Into<String>) -> Locator {
        self.select(Selector::AltText(text.into()))
    }

    /// Locator by placeholder
    #[must_use]
    pub fn get_by_placeholder(&self, text: impl Into<String>) -> Locator {
        self.select(Selector::Placeholder(text.into()))
    }

    /// Load a URL and wait for the given load state
    pub async fn goto(&self, url: &str, wait_until: LoadState) -> VitrineResult<()> {
        tracing::debug!(page = %self.id, url, %wait_until, "goto");
        self.driver.navigate(url, wait_until, &self.timeouts).await
    }

    /// Wait for a load state of the current document
    pub async fn wait_for_load_state(&self, state: LoadState) -> VitrineResult<()> {
        self.driver.wait_for_load_state(state, &self.timeouts).await
    }

    /// URL of the current document
    pub async fn url(&self) -> VitrineResult<String> {
        self.driver.current_url().await
    }

    /// Title of the current document
    pub async fn title(&self) -> VitrineResult<String> {
        self.driver.title().await
    }

    /// Type text into the focused element
    pub async fn keyboard_type(&self, text: &str) -> VitrineResult<()> {
        self.driver.type_text(text).await
    }

    /// PNG screenshot of the viewport
    pub async fn screenshot(&self) -> VitrineResult<Vec<u8>> {
        self.driver.screenshot(None).await
    }

    /// Evaluate JavaScript in the page
    pub async fn evaluate(&self, script: &str) -> VitrineResult<serde_json::Value> {
        self.driver.evaluate(script).await
    }

    /// Click `trigger` and wait for the download it starts.
    ///
    /// The file lands in [`download_dir`](Self::download_dir) under its
    /// suggested name; the wait is bounded by the navigation timeout.
    pub async fn download_by_clicking(&self, trigger: &Locator) -> VitrineResult<Download> {
        self.driver.prepare_downloads(&self.download_dir).await?;
        trigger.click().await?;
        let download = self
            .driver
            .wait_for_download(&self.download_dir, self.timeouts.navigation)
            .await?;
        tracing::info!(page = %self.id, file = %download.path.display(), "download saved");
        Ok(download)
    }

    /// Close the underlying session
    pub async fn close(&self) -> VitrineResult<()> {
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::result::VitrineError;

    fn handle(driver: &MockDriver) -> PageHandle {
        PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate())
    }

    #[tokio::test]
    async fn test_goto_updates_url() {
        let driver = MockDriver::new();
        let page = handle(&driver);
        page.goto("https://example.org/calc", LoadState::DomContentLoaded)
            .await
            .unwrap();
        assert_eq!(page.url().await.unwrap(), "https://example.org/calc");
    }

    #[tokio::test]
    async fn test_handles_get_distinct_ids() {
        let driver = MockDriver::new();
        assert_ne!(handle(&driver).id(), handle(&driver).id());
    }

    #[tokio::test]
    async fn test_clone_shares_session() {
        let driver = MockDriver::new();
        let page = handle(&driver);
        let clone = page.clone();
        page.goto("https://example.org/", LoadState::Load).await.unwrap();
        assert_eq!(clone.url().await.unwrap(), "https://example.org/");
        assert_eq!(clone.id(), page.id());
    }

    #[tokio::test]
    async fn test_locator_waits_then_reports_not_found() {
        let driver = MockDriver::new();
        let page = handle(&driver);
        page.goto("https://example.org/", LoadState::Load).await.unwrap();
        let err = page.locator("#missing").click().await.unwrap_err();
        assert!(matches!(err, VitrineError::ElementNotFound { .. }));
    }

    #[tokio::test]
    async fn test_hidden_element_is_not_interactable() {
        let driver = MockDriver::new();
        driver.add(&Selector::css("#ghost"), MockElement::new("button", "x").hidden());
        let page = handle(&driver);
        page.goto("https://example.org/", LoadState::Load).await.unwrap();
        let err = page.locator("#ghost").click().await.unwrap_err();
        assert!(matches!(err, VitrineError::NotInteractable { .. }));
    }

    #[tokio::test]
    async fn test_locator_reads() {
        let driver = MockDriver::new();
        driver.add(
            &Selector::test_id("answer"),
            MockElement::input("42").attr("type", "text"),
        );
        let page = handle(&driver);
        page.goto("https://example.org/", LoadState::Load).await.unwrap();
        let answer = page.get_by_test_id("answer");
        assert_eq!(answer.input_value().await.unwrap(), "42");
        assert_eq!(
            answer.get_attribute("type").await.unwrap().as_deref(),
            Some("text")
        );
        assert!(answer.is_visible().await.unwrap());
        assert_eq!(answer.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_download_by_clicking_saves_into_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MockDriver::new();
        driver.add(&Selector::css("a.pdf"), MockElement::new("a", "PDF"));
        driver.seed_download("invoice.pdf", b"%PDF-1.5".to_vec());
        let page = handle(&driver).with_download_dir(dir.path());
        page.goto("https://example.org/", LoadState::Load).await.unwrap();

        let download = page.download_by_clicking(&page.locator("a.pdf")).await.unwrap();
        assert_eq!(download.suggested_filename, "invoice.pdf");
        assert_eq!(download.path, dir.path().join("invoice.pdf"));
        assert_eq!(std::fs::read(&download.path).unwrap(), b"%PDF-1.5");

        let history = driver.call_history();
        let prepare = history.iter().position(|c| c.starts_with("prepare_downloads:")).unwrap();
        let click = history.iter().position(|c| c == "click:css=a.pdf").unwrap();
        assert!(prepare < click);
    }

    #[tokio::test]
    async fn test_same_file_from_two_pages_does_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let mut saved = Vec::new();
        for body in [b"first".to_vec(), b"second".to_vec()] {
            let driver = MockDriver::new();
            driver.add(&Selector::css("a.pdf"), MockElement::new("a", "PDF"));
            driver.seed_download("invoice.pdf", body);
            let page = handle(&driver).with_download_root(root.path());
            assert_eq!(page.download_dir(), root.path().join(page.id().to_string()));
            page.goto("https://example.org/", LoadState::Load).await.unwrap();
            saved.push(page.download_by_clicking(&page.locator("a.pdf")).await.unwrap());
        }
        assert_ne!(saved[0].path, saved[1].path);
        assert_eq!(std::fs::read(&saved[0].path).unwrap(), b"first");
        assert_eq!(std::fs::read(&saved[1].path).unwrap(), b"second");
    }
}
