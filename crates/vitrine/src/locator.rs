//! Locator abstraction for element selection and interaction.
//!
//! A [`Locator`] is a query descriptor bound to a [`PageHandle`]. Nothing is
//! resolved when it is built: every action or read re-runs the query, so a
//! locator survives the DOM changing between steps.
//!
//! # Design
//!
//! - **Auto-waiting**: reads and actions wait until the query matches, bounded
//!   by the action timeout of the page handle
//! - **Strict selection**: actions fail when more than one element matches
//! - **Fluent API**: `page.get_by_role("listitem", None).filter_has_text("milk").nth(0)`

use crate::driver::{ClickOptions, ElementState, PseudoElement};
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use crate::wait::poll_until;
use std::fmt;
use std::time::Duration;

/// Default test-id attribute
pub const DEFAULT_TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Which match of a multi-element query to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nth {
    /// Zero-based index
    Index(usize),
    /// Last match
    Last,
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary"); a leading `>` is relative to the parent
    Css(String),
    /// Test-id attribute selector
    TestId {
        /// Attribute holding the id (usually `data-testid`)
        attribute: String,
        /// Expected attribute value
        value: String,
    },
    /// ARIA role with an optional accessible name
    Role {
        /// ARIA role (explicit or implicit)
        role: String,
        /// Accessible name to match
        name: Option<String>,
        /// Whole-string, case-sensitive name match
        exact: bool,
    },
    /// Smallest elements whose text matches
    Text {
        /// Text to match
        text: String,
        /// Whole-string, case-sensitive match
        exact: bool,
    },
    /// Form control labelled by the text
    Label(String),
    /// Element whose `title` attribute contains the text
    Title(String),
    /// Element whose `alt` attribute contains the text
    AltText(String),
    /// Input whose placeholder contains the text
    Placeholder(String),
    /// One match of the base selector
    Nth {
        /// Base selector
        base: Box<Selector>,
        /// Which match
        nth: Nth,
    },
    /// Matches of the base selector containing the text
    HasText {
        /// Base selector
        base: Box<Selector>,
        /// Text that must appear inside
        text: String,
    },
    /// Child query scoped to each parent match
    Within {
        /// Parent selector
        parent: Box<Selector>,
        /// Child selector
        child: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a `data-testid` selector
    #[must_use]
    pub fn test_id(value: impl Into<String>) -> Self {
        Self::TestId {
            attribute: DEFAULT_TEST_ID_ATTRIBUTE.to_string(),
            value: value.into(),
        }
    }

    /// Create a test-id selector on a custom attribute
    #[must_use]
    pub fn test_id_attr(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TestId {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a role selector with an optional substring name match
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
            exact: false,
        }
    }

    /// Create a role selector with an exact name match
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: true,
        }
    }

    /// Create a substring text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Wrap in an nth-match selector
    #[must_use]
    pub fn nth(self, nth: Nth) -> Self {
        Self::Nth {
            base: Box::new(self),
            nth,
        }
    }

    /// Wrap in a has-text filter
    #[must_use]
    pub fn has_text(self, text: impl Into<String>) -> Self {
        Self::HasText {
            base: Box::new(self),
            text: text.into(),
        }
    }

    /// Scope a child selector under this one
    #[must_use]
    pub fn within(self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    /// JavaScript expression evaluating to an `Array<Element>` of matches under `root`.
    ///
    /// Requires the helpers from [`JS_HELPERS`] to be in scope.
    #[must_use]
    pub fn to_js(&self, root: &str) -> String {
        match self {
            Self::Css(css) => {
                let css = css.trim();
                if css.starts_with('>') {
                    let scoped = format!(":scope {css}");
                    format!("Array.from({root}.querySelectorAll({}))", js_str(&scoped))
                } else {
                    format!("__deepAll({root}, {})", js_str(css))
                }
            }
            Self::TestId { attribute, value } => format!(
                "Array.from({root}.querySelectorAll('[' + {} + ']')).filter(el => el.getAttribute({}) === {})",
                js_str(attribute),
                js_str(attribute),
                js_str(value)
            ),
            Self::Role { role, name, exact } => {
                let candidates = format!(
                    "Array.from({root}.querySelectorAll({})).filter(el => __visibleForRole(el))",
                    js_str(&implicit_role_css(role))
                );
                match name {
                    None => candidates,
                    Some(name) => format!(
                        "{candidates}.filter(el => __match(__name(el), {}, {exact}))",
                        js_str(&match_needle(name, *exact))
                    ),
                }
            }
            Self::Text { text, exact } => format!(
                "__smallest(Array.from({root}.querySelectorAll('*')).filter(el => !['SCRIPT','STYLE','HEAD','TITLE'].includes(el.tagName) && __match(el.textContent, {}, {exact})))",
                js_str(&match_needle(text, *exact))
            ),
            Self::Label(text) => format!(
                "__labelled({root}, {})",
                js_str(&match_needle(text, false))
            ),
            Self::Title(text) => attribute_contains(root, "title", text),
            Self::AltText(text) => attribute_contains(root, "alt", text),
            Self::Placeholder(text) => attribute_contains(root, "placeholder", text),
            Self::Nth { base, nth } => {
                let inner = base.to_js(root);
                match nth {
                    Nth::Index(i) => format!("[({inner})[{i}]].filter(Boolean)"),
                    Nth::Last => format!("({inner}).slice(-1)"),
                }
            }
            Self::HasText { base, text } => format!(
                "({}).filter(el => __match(el.textContent, {}, false))",
                base.to_js(root),
                js_str(&match_needle(text, false))
            ),
            Self::Within { parent, child } => format!(
                "[...new Set(({}).flatMap(__p => {}))]",
                parent.to_js(root),
                child.to_js("__p")
            ),
        }
    }

    /// Self-contained script that returns the matches of this selector in the document
    #[must_use]
    pub fn to_query(&self) -> String {
        format!(
            "(() => {{ {JS_HELPERS} return {}; }})()",
            self.to_js("document")
        )
    }

    /// Self-contained script counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!(
            "(() => {{ {JS_HELPERS} return ({}).length; }})()",
            self.to_js("document")
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css={css}"),
            Self::TestId { attribute, value } => write!(f, "[{attribute}={value:?}]"),
            Self::Role { role, name, exact } => match name {
                Some(name) if *exact => write!(f, "role={role}[name={name:?}s]"),
                Some(name) => write!(f, "role={role}[name={name:?}i]"),
                None => write!(f, "role={role}"),
            },
            Self::Text { text, exact } => {
                if *exact {
                    write!(f, "text={text:?}s")
                } else {
                    write!(f, "text={text:?}i")
                }
            }
            Self::Label(text) => write!(f, "label={text:?}"),
            Self::Title(text) => write!(f, "title={text:?}"),
            Self::AltText(text) => write!(f, "alt={text:?}"),
            Self::Placeholder(text) => write!(f, "placeholder={text:?}"),
            Self::Nth { base, nth } => match nth {
                Nth::Index(i) => write!(f, "{base} >> nth={i}"),
                Nth::Last => write!(f, "{base} >> nth=-1"),
            },
            Self::HasText { base, text } => write!(f, "{base} >> has-text={text:?}"),
            Self::Within { parent, child } => write!(f, "{parent} >> {child}"),
        }
    }
}

/// Shared JavaScript helpers used by generated queries.
///
/// Plain CSS goes through `__deepAll`, which also searches open shadow roots.
pub const JS_HELPERS: &str = r"
const __deepAll = (root, css) => {
  const out = [];
  const visit = (node) => {
    out.push(...node.querySelectorAll(css));
    const hosts = node.shadowRoot ? [node, ...node.querySelectorAll('*')] : Array.from(node.querySelectorAll('*'));
    hosts.filter(el => el.shadowRoot).forEach(el => visit(el.shadowRoot));
  };
  visit(root);
  return out;
};
const __norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const __match = (value, needle, exact) => exact ? __norm(value) === needle : __norm(value).toLowerCase().includes(needle);
const __smallest = (els) => els.filter(el => !els.some(other => other !== el && el.contains(other)));
const __visibleForRole = (el) => !el.closest('[aria-hidden=true]') && !el.hidden;
const __labelText = (el) => {
  if (el.labels && el.labels.length) { return Array.from(el.labels).map(l => l.textContent).join(' '); }
  if (el.id) { const l = document.querySelector('label[for=' + JSON.stringify(el.id) + ']'); if (l) { return l.textContent; } }
  return '';
};
const __name = (el) => {
  const aria = el.getAttribute('aria-label');
  if (aria) { return __norm(aria); }
  const by = el.getAttribute('aria-labelledby');
  if (by) { return __norm(by.split(/\s+/).map(id => (document.getElementById(id) || {}).textContent || '').join(' ')); }
  if (['INPUT','TEXTAREA','SELECT'].includes(el.tagName)) {
    if (['button','submit','reset'].includes(el.type)) { return __norm(el.value); }
    return __norm(__labelText(el) || el.getAttribute('placeholder') || el.getAttribute('title') || '');
  }
  if (el.tagName === 'IMG') { return __norm(el.getAttribute('alt') || el.getAttribute('title') || ''); }
  return __norm(el.textContent || el.getAttribute('title') || '');
};
const __labelled = (root, needle) => {
  const viaLabel = Array.from(root.querySelectorAll('label')).filter(l => __match(l.textContent, needle, false)).map(l => l.control).filter(Boolean);
  const viaAria = Array.from(root.querySelectorAll('[aria-label]')).filter(el => __match(el.getAttribute('aria-label'), needle, false));
  return [...new Set([...viaLabel, ...viaAria])];
};
";

/// CSS matching elements that carry `role` explicitly or implicitly
#[must_use]
pub fn implicit_role_css(role: &str) -> String {
    let implicit = match role {
        "button" => "button, input[type=button], input[type=submit], input[type=reset], summary",
        "link" => "a[href], area[href]",
        "textbox" => "input:not([type]), input[type=text], input[type=email], input[type=search], input[type=tel], input[type=url], input[type=password], textarea",
        "checkbox" => "input[type=checkbox]",
        "radio" => "input[type=radio]",
        "heading" => "h1, h2, h3, h4, h5, h6",
        "listitem" => "li",
        "list" => "ul, ol",
        "dialog" => "dialog",
        "img" => "img[alt]:not([alt='']), img:not([alt])",
        "combobox" => "select:not([multiple])",
        "option" => "option",
        "table" => "table",
        "row" => "tr",
        "cell" => "td",
        "navigation" => "nav",
        _ => "",
    };
    let explicit = format!("[role={role}]");
    if implicit.is_empty() {
        explicit
    } else {
        format!("{implicit}, {explicit}")
    }
}

fn attribute_contains(root: &str, attribute: &str, text: &str) -> String {
    format!(
        "Array.from({root}.querySelectorAll('[{attribute}]')).filter(el => __match(el.getAttribute('{attribute}'), {}, false))",
        js_str(&match_needle(text, false))
    )
}

/// Needle as the JS helpers compare it: normalized, lowercased unless exact
fn match_needle(text: &str, exact: bool) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if exact {
        normalized
    } else {
        normalized.to_lowercase()
    }
}

/// Quote a string as a JavaScript literal
#[must_use]
pub fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// A lazily-resolved reference to zero or more elements.
#[derive(Debug, Clone)]
pub struct Locator {
    page: PageHandle,
    selector: Selector,
}

impl Locator {
    /// Bind a selector to a page handle
    #[must_use]
    pub const fn new(page: PageHandle, selector: Selector) -> Self {
        Self { page, selector }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the page handle this locator resolves against
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    fn derive(&self, selector: Selector) -> Self {
        Self {
            page: self.page.clone(),
            selector,
        }
    }

    /// Keep the n-th match (zero-based)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        self.derive(self.selector.clone().nth(Nth::Index(index)))
    }

    /// Keep the first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Keep the last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.derive(self.selector.clone().nth(Nth::Last))
    }

    /// Keep matches containing the text
    #[must_use]
    pub fn filter_has_text(&self, text: impl Into<String>) -> Self {
        self.derive(self.selector.clone().has_text(text))
    }

    /// Scope a CSS query under this locator
    #[must_use]
    pub fn locator(&self, css: impl Into<String>) -> Self {
        self.derive(self.selector.clone().within(Selector::css(css)))
    }

    /// Scope a role query under this locator
    #[must_use]
    pub fn get_by_role(&self, role: &str, name: Option<&str>) -> Self {
        self.derive(self.selector.clone().within(Selector::role(role, name)))
    }

    /// Current state of every match, without waiting
    pub async fn resolve_all(&self) -> VitrineResult<Vec<ElementState>> {
        self.page.driver().query(&self.selector).await
    }

    /// Wait until exactly one element matches and return its state
    async fn resolve_one(&self) -> VitrineResult<ElementState> {
        let timeout = self.page.timeouts().action;
        let poll = self.page.timeouts().poll_interval;
        let found = poll_until(timeout, poll, || async {
            let states = self.resolve_all().await?;
            Ok((!states.is_empty()).then_some(states))
        })
        .await?;
        match found {
            Some(mut states) if states.len() == 1 => Ok(states.remove(0)),
            Some(states) => Err(VitrineError::NotInteractable {
                selector: self.selector.to_string(),
                reason: format!("strict mode violation: {} elements matched", states.len()),
            }),
            None => Err(VitrineError::ElementNotFound {
                selector: self.selector.to_string(),
            }),
        }
    }

    /// Wait until the element can receive input
    async fn actionable(&self) -> VitrineResult<ElementState> {
        let state = self.resolve_one().await?;
        if !state.visible {
            return Err(VitrineError::NotInteractable {
                selector: self.selector.to_string(),
                reason: "element is not visible".to_string(),
            });
        }
        if !state.enabled {
            return Err(VitrineError::NotInteractable {
                selector: self.selector.to_string(),
                reason: "element is disabled".to_string(),
            });
        }
        Ok(state)
    }

    /// Click the element
    pub async fn click(&self) -> VitrineResult<()> {
        self.actionable().await?;
        self.page
            .driver()
            .click(&self.selector, ClickOptions::default())
            .await
    }

    /// Double-click the element
    pub async fn dblclick(&self) -> VitrineResult<()> {
        self.actionable().await?;
        self.page
            .driver()
            .click(&self.selector, ClickOptions::double())
            .await
    }

    /// Replace the element's value
    pub async fn fill(&self, value: &str) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().fill(&self.selector, value).await
    }

    /// Clear the element's value
    pub async fn clear(&self) -> VitrineResult<()> {
        self.fill("").await
    }

    /// Focus the element and press a key
    pub async fn press(&self, key: &str) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().press(Some(&self.selector), key).await
    }

    /// Move the pointer over the element
    pub async fn hover(&self) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().hover(&self.selector).await
    }

    /// Check a checkbox
    pub async fn check(&self) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().set_checked(&self.selector, true).await
    }

    /// Uncheck a checkbox
    pub async fn uncheck(&self) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().set_checked(&self.selector, false).await
    }

    /// Select an `<option>` by value or label
    pub async fn select_option(&self, value: &str) -> VitrineResult<()> {
        self.actionable().await?;
        self.page.driver().select_option(&self.selector, value).await
    }

    /// Text content of the element
    pub async fn text_content(&self) -> VitrineResult<String> {
        Ok(self.resolve_one().await?.text)
    }

    /// Current value of an input, textarea or select
    pub async fn input_value(&self) -> VitrineResult<String> {
        let state = self.resolve_one().await?;
        state.value.ok_or_else(|| VitrineError::NotInteractable {
            selector: self.selector.to_string(),
            reason: format!("<{}> has no value", state.tag),
        })
    }

    /// Attribute of the element
    pub async fn get_attribute(&self, name: &str) -> VitrineResult<Option<String>> {
        Ok(self.resolve_one().await?.attributes.get(name).cloned())
    }

    /// Whether exactly one visible element matches right now
    pub async fn is_visible(&self) -> VitrineResult<bool> {
        let states = self.resolve_all().await?;
        Ok(states.len() == 1 && states[0].visible)
    }

    /// Number of matches right now
    pub async fn count(&self) -> VitrineResult<usize> {
        Ok(self.resolve_all().await?.len())
    }

    /// Computed `content` of a `::before`/`::after` pseudo-element
    pub async fn pseudo_content(&self, pseudo: PseudoElement) -> VitrineResult<String> {
        self.resolve_one().await?;
        self.page.driver().pseudo_content(&self.selector, pseudo).await
    }

    /// PNG screenshot of the element
    pub async fn screenshot(&self) -> VitrineResult<Vec<u8>> {
        self.actionable().await?;
        self.page.driver().screenshot(Some(&self.selector)).await
    }

    /// Override the action timeout for subsequent calls on a copy of this locator
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            page: self.page.with_action_timeout(timeout),
            selector: self.selector.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selector.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let query = Selector::css("button.primary").to_query();
            assert!(query.contains("__deepAll(document, \"button.primary\")"));
            assert!(query.contains("__norm"));
        }

        #[test]
        fn test_css_reaches_into_shadow_roots() {
            let js = Selector::css(".fill").to_js("document");
            assert!(js.starts_with("__deepAll(document"));
            assert!(JS_HELPERS.contains("el.shadowRoot"));
        }

        #[test]
        fn test_relative_css_is_scoped() {
            let js = Selector::css("> div:first-child").to_js("__p");
            assert!(js.contains(":scope > div:first-child"));
        }

        #[test]
        fn test_role_with_exact_name() {
            let js = Selector::role_exact("button", "AC").to_js("document");
            assert!(js.contains("input[type=submit]"));
            assert!(js.contains("[role=button]"));
            assert!(js.contains("\"AC\", true"));
        }

        #[test]
        fn test_role_name_is_lowercased_unless_exact() {
            let js = Selector::role("link", Some("Cart  Page")).to_js("document");
            assert!(js.contains("\"cart page\", false"));
        }

        #[test]
        fn test_unknown_role_uses_explicit_attribute_only() {
            assert_eq!(implicit_role_css("application"), "[role=application]");
        }

        #[test]
        fn test_test_id_custom_attribute() {
            let js = Selector::test_id_attr("id", "number1Field").to_js("document");
            assert!(js.contains("\"id\""));
            assert!(js.contains("\"number1Field\""));
        }

        #[test]
        fn test_nth_and_last() {
            let base = Selector::css("shop-tabs shop-tab");
            assert!(base.clone().nth(Nth::Index(2)).to_js("document").contains("[2]"));
            assert!(base.nth(Nth::Last).to_js("document").contains("slice(-1)"));
        }

        #[test]
        fn test_within_scopes_child_to_parent() {
            let sel = Selector::role("application", Some("Calculator"))
                .within(Selector::css("> div:first-child"));
            let js = sel.to_js("document");
            assert!(js.contains("flatMap(__p =>"));
            assert!(js.contains("__p.querySelectorAll"));
        }

        #[test]
        fn test_js_str_escapes_quotes_and_unicode() {
            assert_eq!(js_str("What need's to be done?"), "\"What need's to be done?\"");
            assert_eq!(js_str("say \"hi\""), "\"say \\\"hi\\\"\"");
            assert_eq!(js_str("−"), "\"−\"");
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("#a").to_string(), "css=#a");
            assert_eq!(
                Selector::role_exact("button", "=").to_string(),
                "role=button[name=\"=\"s]"
            );
            assert_eq!(
                Selector::css("li").has_text("milk").nth(Nth::Index(0)).to_string(),
                "css=li >> has-text=\"milk\" >> nth=0"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_js_str_round_trips_through_json(s in ".*") {
            let quoted = js_str(&s);
            let back: String = serde_json::from_str(&quoted).unwrap();
            prop_assert_eq!(back, s);
        }

        #[test]
        fn prop_needle_has_no_runs_of_whitespace(s in "[a-zA-Z \\t]{0,40}") {
            let needle = match_needle(&s, false);
            prop_assert!(!needle.contains("  "));
            prop_assert_eq!(needle.trim(), needle.as_str());
        }
    }
}
