//! Isolated browser contexts, one per test.
//!
//! A [`ContextProvider`] hands out a fresh [`PageHandle`] backed by its own
//! browser context and takes it back afterwards. [`with_context`] pairs the
//! two so release happens on every exit path of the scoped future.

use crate::driver::{Driver, MockDriver};
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use crate::wait::Timeouts;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of isolated page handles
#[async_trait]
pub trait ContextProvider: Send + Sync + std::fmt::Debug {
    /// Open a new isolated context with one blank page
    async fn acquire(&self) -> VitrineResult<PageHandle>;

    /// Close the context behind a handle
    async fn release(&self, page: PageHandle) -> VitrineResult<()>;

    /// Counters for reporting
    fn stats(&self) -> ContextPoolStats;
}

/// Acquire/release counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPoolStats {
    /// Contexts opened
    pub acquired: usize,
    /// Contexts closed
    pub released: usize,
}

impl ContextPoolStats {
    /// Contexts currently open
    #[must_use]
    pub const fn in_use(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl StatCounters {
    pub(crate) fn acquired(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn released(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> ContextPoolStats {
        ContextPoolStats {
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
        }
    }
}

/// Run `body` with a fresh context and release it afterwards.
///
/// Release errors are logged, never allowed to mask the body's result.
pub async fn with_context<T, F, Fut>(provider: &dyn ContextProvider, body: F) -> VitrineResult<T>
where
    F: FnOnce(PageHandle) -> Fut + Send,
    Fut: Future<Output = T> + Send,
{
    let page = provider.acquire().await?;
    let id = page.id();
    tracing::debug!(context = %id, "context acquired");
    let output = body(page.clone()).await;
    if let Err(err) = provider.release(page).await {
        tracing::warn!(context = %id, error = %err, "context release failed");
    }
    Ok(output)
}

type DriverSetup = Arc<dyn Fn(&MockDriver) + Send + Sync>;

/// Provider of in-memory contexts for unit tests.
///
/// Every acquired handle gets its own [`MockDriver`], optionally prepared by
/// a setup hook; the drivers stay inspectable after release.
#[derive(Clone, Default)]
pub struct MockContextProvider {
    timeouts: Timeouts,
    download_dir: Option<PathBuf>,
    setup: Option<DriverSetup>,
    drivers: Arc<Mutex<Vec<MockDriver>>>,
    counters: Arc<StatCounters>,
    fail_acquire: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContextProvider")
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl MockContextProvider {
    /// Provider with near-zero timeouts
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeouts: Timeouts::immediate(),
            ..Self::default()
        }
    }

    /// Prepare every new driver (register elements, reactions)
    #[must_use]
    pub fn with_setup(mut self, setup: impl Fn(&MockDriver) + Send + Sync + 'static) -> Self {
        self.setup = Some(Arc::new(setup));
        self
    }

    /// Set the timeouts of handed-out pages
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Root under which every handed-out page gets its own download directory
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Make every later `acquire` fail
    pub fn fail_acquire(&self) {
        self.fail_acquire.store(true, Ordering::SeqCst);
    }

    /// Drivers created so far, in acquisition order
    #[must_use]
    pub fn drivers(&self) -> Vec<MockDriver> {
        self.drivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ContextProvider for MockContextProvider {
    async fn acquire(&self) -> VitrineResult<PageHandle> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(VitrineError::driver("could not create browser context"));
        }
        let driver = MockDriver::new();
        if let Some(setup) = &self.setup {
            setup(&driver);
        }
        self.drivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(driver.clone());
        self.counters.acquired();
        let driver: Arc<dyn Driver> = Arc::new(driver);
        let mut page = PageHandle::new(driver).with_timeouts(self.timeouts);
        if let Some(dir) = &self.download_dir {
            page = page.with_download_root(dir);
        }
        Ok(page)
    }

    async fn release(&self, page: PageHandle) -> VitrineResult<()> {
        self.counters.released();
        page.close().await
    }

    fn stats(&self) -> ContextPoolStats {
        self.counters.snapshot()
    }
}
