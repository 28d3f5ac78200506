//! Real browser control over the Chrome DevTools Protocol.
//!
//! [`Browser`] launches one Chromium process per run. [`CdpContextProvider`]
//! opens a fresh browser context (its own cookies, storage and cache) per
//! test and wraps its single page in a [`CdpDriver`].
//!
//! Element queries run as generated JavaScript (see
//! [`Selector::to_js`](crate::locator::Selector::to_js)); pointer and keyboard
//! input go through the CDP `Input` domain so pages see trusted events.

use crate::config::{SuiteConfig, Viewport};
use crate::context::{ContextPoolStats, ContextProvider, StatCounters};
use crate::driver::{ClickOptions, Download, Driver, ElementState, PseudoElement};
use crate::interaction::keys;
use crate::locator::{js_str, Selector, JS_HELPERS};
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use crate::wait::{poll_or_timeout, LoadState, NetworkIdleTracker, Timeouts};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    BrowserContextId, SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, NavigateParams, Viewport as ClipViewport,
};
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Poll interval while waiting for a download to land on disk
const DOWNLOAD_POLL: Duration = Duration::from_millis(100);

/// Suffix Chromium uses for downloads in progress
const PARTIAL_DOWNLOAD_SUFFIX: &str = ".crdownload";

/// True when keyboard focus sits on an element; an unfocused page reports `<body>`
const HAS_FOCUS_SCRIPT: &str =
    "document.activeElement !== null && document.activeElement !== document.body";

fn cdp_error(err: impl std::fmt::Display) -> VitrineError {
    VitrineError::driver(err.to_string())
}

/// A running Chromium process
#[derive(Debug)]
pub struct Browser {
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
    viewport: Viewport,
}

impl Browser {
    /// Launch Chromium as configured
    pub async fn launch(config: &SuiteConfig) -> VitrineResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport.width, config.viewport.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|message| {
            if config.chromium_path.is_none() {
                tracing::error!(%message, "no chromium executable found");
                VitrineError::BrowserNotFound
            } else {
                VitrineError::driver(message)
            }
        })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(cdp_error)?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        tracing::info!(headless = config.headless, "browser launched");

        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
            viewport: config.viewport,
        })
    }

    /// Close the browser process
    pub async fn close(&self) -> VitrineResult<()> {
        let mut browser = self.inner.lock().await;
        browser.close().await.map_err(cdp_error)?;
        browser.wait().await.map_err(cdp_error)?;
        self.handle.abort();
        tracing::info!("browser closed");
        Ok(())
    }
}

/// One page inside one browser context
#[derive(Debug)]
pub struct CdpDriver {
    page: CdpPage,
    context_id: BrowserContextId,
    known_files: StdMutex<HashSet<PathBuf>>,
}

/// Viewport and page coordinates of an element scrolled into view
#[derive(Debug, Clone, Copy, Deserialize)]
struct ElementBox {
    x: f64,
    y: f64,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl CdpDriver {
    /// Wrap a page that belongs to `context_id`
    #[must_use]
    pub fn new(page: CdpPage, context_id: BrowserContextId) -> Self {
        Self {
            page,
            context_id,
            known_files: StdMutex::new(HashSet::new()),
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> VitrineResult<T> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        let value = result.value().cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Run `body` against the single match of `selector`, bound to `el`.
    ///
    /// `body` must `return { ok: ... }`.
    async fn on_element(&self, selector: &Selector, body: &str) -> VitrineResult<Value> {
        let script = format!(
            "(() => {{ {JS_HELPERS} const __els = {}; if (__els.length !== 1) {{ return {{ matched: __els.length }}; }} const el = __els[0]; {body} }})()",
            selector.to_js("document")
        );
        let reply: Value = self.eval(&script).await?;
        if let Some(matched) = reply.get("matched").and_then(Value::as_u64) {
            return Err(if matched == 0 {
                VitrineError::ElementNotFound {
                    selector: selector.to_string(),
                }
            } else {
                VitrineError::NotInteractable {
                    selector: selector.to_string(),
                    reason: format!("strict mode violation: {matched} elements matched"),
                }
            });
        }
        Ok(reply.get("ok").cloned().unwrap_or(Value::Null))
    }

    async fn element_box(&self, selector: &Selector) -> VitrineResult<ElementBox> {
        let value = self
            .on_element(
                selector,
                "el.scrollIntoView({ block: 'center', inline: 'center' }); \
                 const r = el.getBoundingClientRect(); \
                 return { ok: { x: r.x + r.width / 2, y: r.y + r.height / 2, \
                 left: r.x + window.scrollX, top: r.y + window.scrollY, \
                 width: r.width, height: r.height } };",
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: i64,
    ) -> VitrineResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(button)
            .click_count(click_count)
            .build()
            .map_err(VitrineError::driver)?;
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn key(&self, name: &str) -> VitrineResult<()> {
        let def = keys::definition(name)
            .ok_or_else(|| VitrineError::driver(format!("unknown key: {name}")))?;
        let mut down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(def.key.clone())
            .code(def.code.clone())
            .windows_virtual_key_code(def.key_code)
            .native_virtual_key_code(def.key_code);
        if let Some(text) = &def.text {
            down = down.text(text.clone());
        }
        self.page
            .execute(down.build().map_err(VitrineError::driver)?)
            .await
            .map_err(cdp_error)?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(def.key)
            .code(def.code)
            .windows_virtual_key_code(def.key_code)
            .native_virtual_key_code(def.key_code)
            .build()
            .map_err(VitrineError::driver)?;
        self.page.execute(up).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn focus(&self, selector: &Selector) -> VitrineResult<()> {
        self.on_element(selector, "el.focus(); return { ok: true };")
            .await
            .map(drop)
    }

    async fn click_box(&self, target: ElementBox, click_count: u32) -> VitrineResult<()> {
        self.mouse(
            DispatchMouseEventType::MouseMoved,
            target.x,
            target.y,
            MouseButton::None,
            0,
        )
        .await?;
        for count in 1..=i64::from(click_count.max(1)) {
            self.mouse(
                DispatchMouseEventType::MousePressed,
                target.x,
                target.y,
                MouseButton::Left,
                count,
            )
            .await?;
            self.mouse(
                DispatchMouseEventType::MouseReleased,
                target.x,
                target.y,
                MouseButton::Left,
                count,
            )
            .await?;
        }
        Ok(())
    }

    fn files_in(dir: &Path) -> VitrineResult<HashSet<PathBuf>> {
        if !dir.exists() {
            return Ok(HashSet::new());
        }
        let mut files = HashSet::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.insert(entry.path());
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn navigate(
        &self,
        url: &str,
        wait_until: LoadState,
        timeouts: &Timeouts,
    ) -> VitrineResult<()> {
        tracing::debug!(url, %wait_until, "cdp navigate");
        let navigation = tokio::time::timeout(
            timeouts.navigation,
            self.page.execute(NavigateParams::new(url)),
        )
        .await
        .map_err(|_| VitrineError::Timeout {
            ms: timeouts.navigation.as_millis() as u64,
        })?
        .map_err(|err| VitrineError::Navigation {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        if let Some(message) = navigation.result.error_text.clone() {
            return Err(VitrineError::Navigation {
                url: url.to_string(),
                message,
            });
        }
        self.wait_for_load_state(wait_until, timeouts).await
    }

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeouts: &Timeouts,
    ) -> VitrineResult<()> {
        let start = Instant::now();
        let accepted = state.ready_states();
        poll_or_timeout(timeouts.navigation, timeouts.poll_interval, || async {
            let ready: String = self.eval("document.readyState").await?;
            Ok(accepted.contains(&ready.as_str()).then_some(()))
        })
        .await?;

        if state == LoadState::NetworkIdle {
            let remaining = timeouts.navigation.saturating_sub(start.elapsed());
            let tracker = StdMutex::new(NetworkIdleTracker::new(timeouts.network_idle));
            poll_or_timeout(remaining, timeouts.poll_interval, || async {
                let count: usize = self
                    .eval("performance.getEntriesByType('resource').length")
                    .await?;
                let idle = tracker
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .observe(count, Instant::now());
                Ok(idle.then_some(()))
            })
            .await?;
        }
        Ok(())
    }

    async fn current_url(&self) -> VitrineResult<String> {
        self.eval("location.href").await
    }

    async fn title(&self) -> VitrineResult<String> {
        self.eval("document.title").await
    }

    async fn query(&self, selector: &Selector) -> VitrineResult<Vec<ElementState>> {
        let script = format!(
            "(() => {{ {JS_HELPERS} return ({}).map(el => {{ \
             const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             const hasValue = ['INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName); \
             return {{ tag: el.tagName.toLowerCase(), text: el.textContent || '', \
             value: hasValue ? String(el.value) : null, \
             visible: r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none', \
             enabled: !el.disabled, checked: !!el.checked, \
             attributes: Object.fromEntries(Array.from(el.attributes).map(a => [a.name, a.value])) }}; }}); }})()",
            selector.to_js("document")
        );
        self.eval(&script).await
    }

    async fn click(&self, selector: &Selector, options: ClickOptions) -> VitrineResult<()> {
        tracing::debug!(%selector, count = options.click_count, "cdp click");
        let target = self.element_box(selector).await?;
        self.click_box(target, options.click_count).await
    }

    async fn fill(&self, selector: &Selector, value: &str) -> VitrineResult<()> {
        tracing::debug!(%selector, "cdp fill");
        self.on_element(
            selector,
            "el.focus(); \
             const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value'); \
             if (setter && setter.set) { setter.set.call(el, ''); } else { el.value = ''; } \
             el.dispatchEvent(new Event('input', { bubbles: true })); \
             return { ok: true };",
        )
        .await?;
        if !value.is_empty() {
            self.page
                .execute(InsertTextParams::new(value))
                .await
                .map_err(cdp_error)?;
        }
        self.on_element(
            selector,
            "el.dispatchEvent(new Event('change', { bubbles: true })); return { ok: true };",
        )
        .await
        .map(drop)
    }

    async fn type_text(&self, text: &str) -> VitrineResult<()> {
        for c in text.chars() {
            let name = c.to_string();
            if keys::definition(&name).is_some() {
                self.key(&name).await?;
            } else {
                self.page
                    .execute(InsertTextParams::new(name))
                    .await
                    .map_err(cdp_error)?;
            }
        }
        Ok(())
    }

    async fn press(&self, target: Option<&Selector>, key: &str) -> VitrineResult<()> {
        match target {
            Some(selector) => self.focus(selector).await?,
            None => {
                let focused: bool = self.eval(HAS_FOCUS_SCRIPT).await?;
                if !focused {
                    return Err(VitrineError::driver("no element has focus"));
                }
            }
        }
        self.key(key).await
    }

    async fn hover(&self, selector: &Selector) -> VitrineResult<()> {
        let target = self.element_box(selector).await?;
        self.mouse(
            DispatchMouseEventType::MouseMoved,
            target.x,
            target.y,
            MouseButton::None,
            0,
        )
        .await
    }

    async fn set_checked(&self, selector: &Selector, checked: bool) -> VitrineResult<()> {
        let current = self
            .on_element(selector, "return { ok: !!el.checked };")
            .await?;
        if current.as_bool() != Some(checked) {
            self.click(selector, ClickOptions::default()).await?;
        }
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> VitrineResult<()> {
        let body = format!(
            "if (el.tagName !== 'SELECT') {{ return {{ ok: 'not-select' }}; }} \
             const wanted = {}; const options = Array.from(el.options); \
             const option = options.find(o => o.value === wanted) || options.find(o => __norm(o.label) === wanted); \
             if (!option) {{ return {{ ok: 'missing' }}; }} \
             el.value = option.value; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return {{ ok: 'selected' }};",
            js_str(value)
        );
        match self.on_element(selector, &body).await?.as_str() {
            Some("selected") => Ok(()),
            Some("not-select") => Err(VitrineError::NotInteractable {
                selector: selector.to_string(),
                reason: "element is not a <select>".to_string(),
            }),
            _ => Err(VitrineError::NotInteractable {
                selector: selector.to_string(),
                reason: format!("no option {value:?}"),
            }),
        }
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> VitrineResult<()> {
        let (width, height): (f64, f64) = self.eval("[innerWidth, innerHeight]").await?;
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(width / 2.0)
            .y(height / 2.0)
            .delta_x(dx)
            .delta_y(dy)
            .build()
            .map_err(VitrineError::driver)?;
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn pseudo_content(
        &self,
        selector: &Selector,
        pseudo: PseudoElement,
    ) -> VitrineResult<String> {
        let body = format!(
            "return {{ ok: getComputedStyle(el, {}).content }};",
            js_str(pseudo.as_css())
        );
        let content = self.on_element(selector, &body).await?;
        Ok(content.as_str().unwrap_or("none").to_string())
    }

    async fn screenshot(&self, selector: Option<&Selector>) -> VitrineResult<Vec<u8>> {
        let mut params = CaptureScreenshotParams::builder().format(CaptureScreenshotFormat::Png);
        if let Some(selector) = selector {
            let target = self.element_box(selector).await?;
            params = params
                .clip(ClipViewport {
                    x: target.left,
                    y: target.top,
                    width: target.width,
                    height: target.height,
                    scale: 1.0,
                })
                .capture_beyond_viewport(true);
        }
        let shot = self.page.execute(params.build()).await.map_err(cdp_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.result.data)
            .map_err(|err| VitrineError::driver(format!("screenshot payload: {err}")))
    }

    async fn evaluate(&self, script: &str) -> VitrineResult<Value> {
        self.eval(script).await
    }

    async fn prepare_downloads(&self, dir: &Path) -> VitrineResult<()> {
        tokio::fs::create_dir_all(dir).await?;
        let absolute = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };
        *self
            .known_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Self::files_in(dir)?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .browser_context_id(self.context_id.clone())
            .download_path(absolute.to_string_lossy().into_owned())
            .build()
            .map_err(VitrineError::driver)?;
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn wait_for_download(&self, dir: &Path, timeout: Duration) -> VitrineResult<Download> {
        let known = self
            .known_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let path = poll_or_timeout(timeout, DOWNLOAD_POLL, || async {
            let files = Self::files_in(dir)?;
            let in_progress = files.iter().any(|p| {
                p.to_string_lossy().ends_with(PARTIAL_DOWNLOAD_SUFFIX)
            });
            if in_progress {
                return Ok(None);
            }
            Ok(files.into_iter().find(|p| !known.contains(p)))
        })
        .await?;
        let suggested_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Download {
            suggested_filename,
            path,
        })
    }

    async fn close(&self) -> VitrineResult<()> {
        self.page.clone().close().await.map_err(cdp_error)
    }
}

/// Hands out one fresh browser context per test
#[derive(Debug)]
pub struct CdpContextProvider {
    browser: Arc<Browser>,
    timeouts: Timeouts,
    download_dir: PathBuf,
    contexts: StdMutex<HashMap<Uuid, BrowserContextId>>,
    counters: StatCounters,
}

impl CdpContextProvider {
    /// Provider over a launched browser, configured from `config`
    #[must_use]
    pub fn new(browser: Arc<Browser>, config: &SuiteConfig) -> Self {
        Self {
            browser,
            timeouts: config.timeouts,
            download_dir: config.download_dir.clone(),
            contexts: StdMutex::new(HashMap::new()),
            counters: StatCounters::default(),
        }
    }
}

#[async_trait]
impl ContextProvider for CdpContextProvider {
    async fn acquire(&self) -> VitrineResult<PageHandle> {
        let (context_id, page) = {
            let mut browser = self.browser.inner.lock().await;
            let context_id = browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(cdp_error)?;
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(VitrineError::driver)?;
            let page = browser.new_page(target).await.map_err(cdp_error)?;
            (context_id, page)
        };
        let viewport = self.browser.viewport;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            false,
        ))
        .await
        .map_err(cdp_error)?;

        let driver: Arc<dyn Driver> = Arc::new(CdpDriver::new(page, context_id.clone()));
        let handle = PageHandle::new(driver)
            .with_timeouts(self.timeouts)
            .with_download_root(&self.download_dir);
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id(), context_id);
        self.counters.acquired();
        Ok(handle)
    }

    async fn release(&self, page: PageHandle) -> VitrineResult<()> {
        self.counters.released();
        let context_id = self
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&page.id());
        let closed = page.close().await;
        if let Some(context_id) = context_id {
            let browser = self.browser.inner.lock().await;
            browser
                .dispose_browser_context(context_id)
                .await
                .map_err(cdp_error)?;
        }
        closed
    }

    fn stats(&self) -> ContextPoolStats {
        self.counters.snapshot()
    }
}
