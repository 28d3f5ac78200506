//! Driver boundary: the abstract browser session a page handle talks to.
//!
//! ```text
//! PageHandle ──> Arc<dyn Driver>
//!                   ├── CdpDriver   (feature "browser", chromiumoxide)
//!                   └── MockDriver  (in-memory DOM, call history)
//! ```
//!
//! Drivers act immediately and never retry; waiting for elements is done by
//! [`Locator`](crate::locator::Locator) and [`Expect`](crate::assertion::Expect).

use crate::locator::Selector;
use crate::result::{VitrineError, VitrineResult};
use crate::wait::{LoadState, Timeouts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Snapshot of one matched element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Lowercase tag name
    pub tag: String,
    /// Text content
    pub text: String,
    /// Form value for inputs, textareas and selects
    pub value: Option<String>,
    /// Rendered with a non-empty box
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Checkbox or radio state
    pub checked: bool,
    /// Attributes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Click parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// 1 for click, 2 for double-click
    pub click_count: u32,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self { click_count: 1 }
    }
}

impl ClickOptions {
    /// Double-click
    #[must_use]
    pub const fn double() -> Self {
        Self { click_count: 2 }
    }
}

/// CSS pseudo-element whose computed style can be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    /// `::before`
    Before,
    /// `::after`
    After,
}

impl PseudoElement {
    /// Selector passed to `getComputedStyle`
    #[must_use]
    pub const fn as_css(&self) -> &'static str {
        match self {
            Self::Before => "::before",
            Self::After => "::after",
        }
    }
}

/// A completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name suggested by the server
    pub suggested_filename: String,
    /// Where the file was saved
    pub path: PathBuf,
}

/// Abstract browser session.
///
/// One driver instance is one isolated browser context with one page.
#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Load a URL and wait for the given load state
    async fn navigate(&self, url: &str, wait_until: LoadState, timeouts: &Timeouts)
        -> VitrineResult<()>;

    /// Wait for a load state of the current document
    async fn wait_for_load_state(&self, state: LoadState, timeouts: &Timeouts)
        -> VitrineResult<()>;

    /// URL of the current document
    async fn current_url(&self) -> VitrineResult<String>;

    /// Title of the current document
    async fn title(&self) -> VitrineResult<String>;

    /// State of every element matching the selector, in document order
    async fn query(&self, selector: &Selector) -> VitrineResult<Vec<ElementState>>;

    /// Click the single matching element
    async fn click(&self, selector: &Selector, options: ClickOptions) -> VitrineResult<()>;

    /// Replace the value of the single matching element
    async fn fill(&self, selector: &Selector, value: &str) -> VitrineResult<()>;

    /// Type text into the focused element
    async fn type_text(&self, text: &str) -> VitrineResult<()>;

    /// Press a named key on the element, or on the focused element when `None`
    async fn press(&self, target: Option<&Selector>, key: &str) -> VitrineResult<()>;

    /// Move the pointer over the element
    async fn hover(&self, selector: &Selector) -> VitrineResult<()>;

    /// Set a checkbox state
    async fn set_checked(&self, selector: &Selector, checked: bool) -> VitrineResult<()>;

    /// Select an option by value or label
    async fn select_option(&self, selector: &Selector, value: &str) -> VitrineResult<()>;

    /// Mouse-wheel scroll
    async fn scroll_by(&self, dx: f64, dy: f64) -> VitrineResult<()>;

    /// Computed `content` of a pseudo-element
    async fn pseudo_content(&self, selector: &Selector, pseudo: PseudoElement)
        -> VitrineResult<String>;

    /// PNG screenshot of the viewport or of one element
    async fn screenshot(&self, selector: Option<&Selector>) -> VitrineResult<Vec<u8>>;

    /// Evaluate a JavaScript expression
    async fn evaluate(&self, script: &str) -> VitrineResult<serde_json::Value>;

    /// Route downloads to `dir` from now on
    async fn prepare_downloads(&self, dir: &Path) -> VitrineResult<()>;

    /// Wait for a download started after `prepare_downloads` to finish
    async fn wait_for_download(&self, dir: &Path, timeout: Duration) -> VitrineResult<Download>;

    /// Close the session
    async fn close(&self) -> VitrineResult<()>;
}

// ============================================================================
// MockDriver
// ============================================================================

/// Element stored in the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Current state
    pub state: ElementState,
    /// Computed `::before` content
    pub before: Option<String>,
    /// Computed `::after` content
    pub after: Option<String>,
    /// PNG bytes returned by an element screenshot
    pub screenshot: Option<Vec<u8>>,
}

impl MockElement {
    /// Visible, enabled element with text
    #[must_use]
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            state: ElementState {
                tag: tag.into(),
                text: text.into(),
                value: None,
                visible: true,
                enabled: true,
                checked: false,
                attributes: BTreeMap::new(),
            },
            before: None,
            after: None,
            screenshot: None,
        }
    }

    /// Text input with a value
    #[must_use]
    pub fn input(value: impl Into<String>) -> Self {
        let mut el = Self::new("input", "");
        el.state.value = Some(value.into());
        el
    }

    /// `<select>` with a current value
    #[must_use]
    pub fn select(value: impl Into<String>) -> Self {
        let mut el = Self::new("select", "");
        el.state.value = Some(value.into());
        el
    }

    /// Unchecked checkbox
    #[must_use]
    pub fn checkbox() -> Self {
        let mut el = Self::new("input", "");
        el.state.attributes.insert("type".into(), "checkbox".into());
        el
    }

    /// Hide the element
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.state.visible = false;
        self
    }

    /// Disable the element
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.state.enabled = false;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.attributes.insert(name.into(), value.into());
        self
    }

    /// Set computed `::before` content
    #[must_use]
    pub fn with_before(mut self, content: impl Into<String>) -> Self {
        self.before = Some(content.into());
        self
    }

    /// Set the element screenshot
    #[must_use]
    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = Some(png);
        self
    }
}

/// Mutable state of the mock page
#[derive(Debug, Default)]
pub struct MockDom {
    url: String,
    title: String,
    elements: HashMap<String, Vec<MockElement>>,
    focused: Option<(String, usize)>,
    scroll: (f64, f64),
    keys: Vec<String>,
}

impl MockDom {
    /// Replace the elements registered under a selector
    pub fn set(&mut self, selector: &Selector, elements: Vec<MockElement>) {
        self.elements.insert(selector.to_string(), elements);
    }

    /// Remove every element registered under a selector
    pub fn remove(&mut self, selector: &Selector) {
        self.elements.remove(&selector.to_string());
    }

    /// Set the text of the first element under a selector
    pub fn set_text(&mut self, selector: &Selector, text: impl Into<String>) {
        if let Some(el) = self
            .elements
            .get_mut(&selector.to_string())
            .and_then(|els| els.first_mut())
        {
            el.state.text = text.into();
        }
    }

    /// Value of the first element under a selector
    #[must_use]
    pub fn value(&self, selector: &Selector) -> Option<String> {
        self.elements
            .get(&selector.to_string())
            .and_then(|els| els.first())
            .and_then(|el| el.state.value.clone())
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Scroll offset accumulated by wheel events
    #[must_use]
    pub const fn scroll(&self) -> (f64, f64) {
        self.scroll
    }

    /// Keys pressed so far
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Resolve a selector to its storage key and element indices
    fn resolve(&self, selector: &Selector) -> Option<(String, Vec<usize>)> {
        if self.url == "about:blank" {
            return None;
        }
        let key = selector.to_string();
        if let Some(els) = self.elements.get(&key) {
            return Some((key, (0..els.len()).collect()));
        }
        match selector {
            Selector::Nth { base, nth } => {
                let (key, indices) = self.resolve(base)?;
                let picked = match nth {
                    crate::locator::Nth::Index(i) => indices.get(*i).copied(),
                    crate::locator::Nth::Last => indices.last().copied(),
                };
                Some((key, picked.into_iter().collect()))
            }
            Selector::HasText { base, text } => {
                let (key, indices) = self.resolve(base)?;
                let needle = text.to_lowercase();
                let els = self.elements.get(&key)?;
                let kept = indices
                    .into_iter()
                    .filter(|i| els[*i].state.text.to_lowercase().contains(&needle))
                    .collect();
                Some((key, kept))
            }
            _ => None,
        }
    }

    fn matches(&self, selector: &Selector) -> Vec<&MockElement> {
        self.resolve(selector)
            .and_then(|(key, idx)| {
                self.elements
                    .get(&key)
                    .map(|els| idx.into_iter().map(|i| &els[i]).collect())
            })
            .unwrap_or_default()
    }

    fn single_mut(&mut self, selector: &Selector) -> VitrineResult<(&mut MockElement, (String, usize))> {
        let (key, idx) = self.resolve(selector).ok_or_else(|| not_found(selector))?;
        match idx.as_slice() {
            [i] => {
                let i = *i;
                let el = self
                    .elements
                    .get_mut(&key)
                    .and_then(|els| els.get_mut(i))
                    .ok_or_else(|| not_found(selector))?;
                Ok((el, (key, i)))
            }
            [] => Err(not_found(selector)),
            many => Err(VitrineError::NotInteractable {
                selector: selector.to_string(),
                reason: format!("strict mode violation: {} elements matched", many.len()),
            }),
        }
    }

    fn focused_mut(&mut self) -> Option<&mut MockElement> {
        let (key, i) = self.focused.clone()?;
        self.elements.get_mut(&key).and_then(|els| els.get_mut(i))
    }
}

fn not_found(selector: &Selector) -> VitrineError {
    VitrineError::ElementNotFound {
        selector: selector.to_string(),
    }
}

type Reaction = Arc<dyn Fn(&mut MockDom) + Send + Sync>;

#[derive(Default)]
struct MockState {
    dom: MockDom,
    history: Vec<String>,
    on_click: HashMap<String, Vec<Reaction>>,
    on_key: HashMap<String, Vec<Reaction>>,
    js_results: HashMap<String, serde_json::Value>,
    page_screenshot: Option<Vec<u8>>,
    download: Option<(String, Vec<u8>)>,
    download_dir: Option<PathBuf>,
    never_idle: bool,
    disconnected: bool,
}

/// In-memory driver for unit tests.
///
/// Elements are registered under a selector and looked up by that same
/// selector, with `nth`/`has-text` refinements applied on top. Clicks and
/// key presses can trigger scripted DOM changes.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockDriver")
            .field("url", &state.dom.url)
            .field("elements", &state.dom.elements.len())
            .field("calls", &state.history.len())
            .finish()
    }
}

impl MockDriver {
    /// Create a mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().dom.url = "about:blank".to_string();
        driver
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) -> VitrineResult<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        if state.disconnected {
            return Err(VitrineError::driver("browser session closed"));
        }
        tracing::debug!(call = %call, "mock driver call");
        state.history.push(call);
        Ok(state)
    }

    /// Register elements under a selector
    pub fn add(&self, selector: &Selector, element: MockElement) -> &Self {
        self.lock()
            .dom
            .elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    /// Mutate the DOM directly
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut self.lock().dom)
    }

    /// Run `reaction` after every click on `selector`
    pub fn on_click(&self, selector: &Selector, reaction: impl Fn(&mut MockDom) + Send + Sync + 'static) {
        self.lock()
            .on_click
            .entry(selector.to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Run `reaction` after every press of `key`
    pub fn on_key(&self, key: &str, reaction: impl Fn(&mut MockDom) + Send + Sync + 'static) {
        self.lock()
            .on_key
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Result returned by `evaluate` for an exact script
    pub fn set_js_result(&self, script: &str, value: serde_json::Value) {
        self.lock().js_results.insert(script.to_string(), value);
    }

    /// PNG returned by a viewport screenshot
    pub fn set_page_screenshot(&self, png: Vec<u8>) {
        self.lock().page_screenshot = Some(png);
    }

    /// File delivered by the next `wait_for_download`
    pub fn seed_download(&self, filename: impl Into<String>, bytes: Vec<u8>) {
        self.lock().download = Some((filename.into(), bytes));
    }

    /// Keep the network busy forever
    pub fn never_idle(&self) {
        self.lock().never_idle = true;
    }

    /// Simulate the browser going away; every later call fails
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Every call so far, e.g. `navigate:https://…` or `click:css=#go`
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Whether any call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// URLs navigated to, in order
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| c.strip_prefix("navigate:").map(str::to_string))
            .collect()
    }

    fn react(state: &mut MockState, reactions: Option<Vec<Reaction>>) {
        for reaction in reactions.unwrap_or_default() {
            reaction(&mut state.dom);
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(
        &self,
        url: &str,
        wait_until: LoadState,
        timeouts: &Timeouts,
    ) -> VitrineResult<()> {
        let mut state = self.record(format!("navigate:{url}"))?;
        if url.is_empty() {
            return Err(VitrineError::Navigation {
                url: url.to_string(),
                message: "empty URL".to_string(),
            });
        }
        state.dom.url = url.to_string();
        state.dom.focused = None;
        if wait_until == LoadState::NetworkIdle && state.never_idle {
            return Err(VitrineError::Timeout {
                ms: timeouts.navigation.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeouts: &Timeouts) -> VitrineResult<()> {
        let guard = self.record(format!("wait_for_load_state:{state}"))?;
        if state == LoadState::NetworkIdle && guard.never_idle {
            return Err(VitrineError::Timeout {
                ms: timeouts.navigation.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn current_url(&self) -> VitrineResult<String> {
        let state = self.record("current_url".to_string())?;
        Ok(state.dom.url.clone())
    }

    async fn title(&self) -> VitrineResult<String> {
        let state = self.record("title".to_string())?;
        Ok(state.dom.title.clone())
    }

    async fn query(&self, selector: &Selector) -> VitrineResult<Vec<ElementState>> {
        let state = self.record(format!("query:{selector}"))?;
        Ok(state
            .dom
            .matches(selector)
            .into_iter()
            .map(|el| el.state.clone())
            .collect())
    }

    async fn click(&self, selector: &Selector, options: ClickOptions) -> VitrineResult<()> {
        let verb = if options.click_count == 2 { "dblclick" } else { "click" };
        let mut state = self.record(format!("{verb}:{selector}"))?;
        let (el, focus) = state.dom.single_mut(selector)?;
        if el.state.attributes.get("type").map(String::as_str) == Some("checkbox") {
            el.state.checked = !el.state.checked;
        }
        state.dom.focused = Some(focus);
        let reactions = state.on_click.get(&selector.to_string()).cloned();
        Self::react(&mut state, reactions);
        Ok(())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> VitrineResult<()> {
        let mut state = self.record(format!("fill:{selector}={value}"))?;
        let (el, focus) = state.dom.single_mut(selector)?;
        el.state.value = Some(value.to_string());
        state.dom.focused = Some(focus);
        Ok(())
    }

    async fn type_text(&self, text: &str) -> VitrineResult<()> {
        let mut state = self.record(format!("type:{text}"))?;
        let el = state
            .dom
            .focused_mut()
            .ok_or_else(|| VitrineError::driver("no element has focus"))?;
        el.state.value.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    async fn press(&self, target: Option<&Selector>, key: &str) -> VitrineResult<()> {
        let mut state = match target {
            Some(selector) => {
                let mut state = self.record(format!("press:{selector}:{key}"))?;
                let (_, focus) = state.dom.single_mut(selector)?;
                state.dom.focused = Some(focus);
                state
            }
            None => {
                let state = self.record(format!("press:{key}"))?;
                if state.dom.focused.is_none() {
                    return Err(VitrineError::driver("no element has focus"));
                }
                state
            }
        };
        state.dom.keys.push(key.to_string());
        let reactions = state.on_key.get(key).cloned();
        Self::react(&mut state, reactions);
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> VitrineResult<()> {
        let mut state = self.record(format!("hover:{selector}"))?;
        state.dom.single_mut(selector)?;
        Ok(())
    }

    async fn set_checked(&self, selector: &Selector, checked: bool) -> VitrineResult<()> {
        let verb = if checked { "check" } else { "uncheck" };
        let mut state = self.record(format!("{verb}:{selector}"))?;
        let (el, _) = state.dom.single_mut(selector)?;
        el.state.checked = checked;
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> VitrineResult<()> {
        let mut state = self.record(format!("select:{selector}={value}"))?;
        let (el, _) = state.dom.single_mut(selector)?;
        if el.state.tag != "select" {
            return Err(VitrineError::NotInteractable {
                selector: selector.to_string(),
                reason: "element is not a <select>".to_string(),
            });
        }
        el.state.value = Some(value.to_string());
        Ok(())
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> VitrineResult<()> {
        let mut state = self.record(format!("scroll:{dx},{dy}"))?;
        state.dom.scroll.0 += dx;
        state.dom.scroll.1 += dy;
        Ok(())
    }

    async fn pseudo_content(
        &self,
        selector: &Selector,
        pseudo: PseudoElement,
    ) -> VitrineResult<String> {
        let mut state = self.record(format!("pseudo:{selector}{}", pseudo.as_css()))?;
        let (el, _) = state.dom.single_mut(selector)?;
        let content = match pseudo {
            PseudoElement::Before => el.before.clone(),
            PseudoElement::After => el.after.clone(),
        };
        Ok(content.unwrap_or_else(|| "none".to_string()))
    }

    async fn screenshot(&self, selector: Option<&Selector>) -> VitrineResult<Vec<u8>> {
        match selector {
            Some(selector) => {
                let mut state = self.record(format!("screenshot:{selector}"))?;
                let (el, _) = state.dom.single_mut(selector)?;
                Ok(el.screenshot.clone().unwrap_or_default())
            }
            None => {
                let state = self.record("screenshot".to_string())?;
                Ok(state.page_screenshot.clone().unwrap_or_default())
            }
        }
    }

    async fn evaluate(&self, script: &str) -> VitrineResult<serde_json::Value> {
        let state = self.record(format!("evaluate:{script}"))?;
        Ok(state
            .js_results
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn prepare_downloads(&self, dir: &Path) -> VitrineResult<()> {
        let mut state = self.record(format!("prepare_downloads:{}", dir.display()))?;
        state.download_dir = Some(dir.to_path_buf());
        Ok(())
    }

    async fn wait_for_download(&self, dir: &Path, timeout: Duration) -> VitrineResult<Download> {
        let (filename, bytes) = {
            let mut state = self.record("wait_for_download".to_string())?;
            if state.download_dir.as_deref() != Some(dir) {
                return Err(VitrineError::driver("downloads were not routed to this directory"));
            }
            state.download.take().ok_or(VitrineError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
        };
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(Download {
            suggested_filename: filename,
            path,
        })
    }

    async fn close(&self) -> VitrineResult<()> {
        self.record("close".to_string())?;
        self.lock().disconnected = true;
        Ok(())
    }
}
