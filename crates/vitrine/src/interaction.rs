//! Interaction primitives shared by every page object.
//!
//! Thin, non-retrying wrappers over the driver. A closed session surfaces as
//! [`VitrineError::Driver`](crate::result::VitrineError::Driver).

use crate::driver::PseudoElement;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use std::time::Duration;

/// Wheel distance used by page objects that scroll "one notch" of content
pub const DEFAULT_SCROLL_STEP: f64 = 500.0;

/// Named keys understood by the driver
pub mod keys {
    /// Enter / Return
    pub const ENTER: &str = "Enter";
    /// Arrow down
    pub const ARROW_DOWN: &str = "ArrowDown";
    /// Arrow up
    pub const ARROW_UP: &str = "ArrowUp";
    /// Arrow left
    pub const ARROW_LEFT: &str = "ArrowLeft";
    /// Arrow right
    pub const ARROW_RIGHT: &str = "ArrowRight";
    /// Escape
    pub const ESCAPE: &str = "Escape";
    /// Backspace
    pub const BACKSPACE: &str = "Backspace";
    /// Tab
    pub const TAB: &str = "Tab";

    /// What a key press dispatches: DOM `key`, `code`, virtual key code and typed text
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeyDefinition {
        /// `KeyboardEvent.key`
        pub key: String,
        /// `KeyboardEvent.code`
        pub code: String,
        /// Windows virtual key code
        pub key_code: i64,
        /// Text inserted by the press, if any
        pub text: Option<String>,
    }

    /// Describe a named key or a single character; `None` for unknown names
    #[must_use]
    pub fn definition(key: &str) -> Option<KeyDefinition> {
        let named = |code: &str, key_code: i64, text: Option<&str>| KeyDefinition {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
        };
        let def = match key {
            "Enter" => named("Enter", 13, Some("\r")),
            "Tab" => named("Tab", 9, None),
            "Backspace" => named("Backspace", 8, None),
            "Escape" => named("Escape", 27, None),
            "Delete" => named("Delete", 46, None),
            "ArrowLeft" => named("ArrowLeft", 37, None),
            "ArrowUp" => named("ArrowUp", 38, None),
            "ArrowRight" => named("ArrowRight", 39, None),
            "ArrowDown" => named("ArrowDown", 40, None),
            "Home" => named("Home", 36, None),
            "End" => named("End", 35, None),
            "PageUp" => named("PageUp", 33, None),
            "PageDown" => named("PageDown", 34, None),
            " " | "Space" => KeyDefinition {
                key: " ".to_string(),
                code: "Space".to_string(),
                key_code: 32,
                text: Some(" ".to_string()),
            },
            _ => {
                let mut chars = key.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                let (code, key_code) = if c.is_ascii_alphabetic() {
                    let upper = c.to_ascii_uppercase();
                    (format!("Key{upper}"), i64::from(upper as u8))
                } else if c.is_ascii_digit() {
                    (format!("Digit{c}"), i64::from(c as u8))
                } else {
                    (String::new(), 0)
                };
                KeyDefinition {
                    key: c.to_string(),
                    code,
                    key_code,
                    text: Some(c.to_string()),
                }
            }
        };
        Some(def)
    }
}

impl PageHandle {
    /// Press one named key on the focused element
    pub async fn press_key(&self, key: &str) -> VitrineResult<()> {
        if key.is_empty() {
            return Err(VitrineError::driver("key name must not be empty"));
        }
        tracing::debug!(page = %self.id(), key, "press_key");
        self.driver().press(None, key).await
    }

    /// Press Enter on the focused element
    pub async fn press_enter(&self) -> VitrineResult<()> {
        self.press_key(keys::ENTER).await
    }

    /// Press ArrowDown on the focused element
    pub async fn press_arrow_down(&self) -> VitrineResult<()> {
        self.press_key(keys::ARROW_DOWN).await
    }

    /// Press ArrowUp on the focused element
    pub async fn press_arrow_up(&self) -> VitrineResult<()> {
        self.press_key(keys::ARROW_UP).await
    }

    /// Computed `content` of the element's pseudo-element, quotes included
    /// (`"\"Hello\""`, or `none` when the pseudo-element has no content)
    pub async fn read_pseudo_element_content(
        &self,
        locator: &Locator,
        pseudo: PseudoElement,
    ) -> VitrineResult<String> {
        locator.pseudo_content(pseudo).await
    }

    /// Sleep without blocking other tests
    pub async fn wait(&self, seconds: f64) {
        if seconds > 0.0 && seconds.is_finite() {
            tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
        }
    }

    /// Mouse-wheel scroll by (dx, dy) pixels
    pub async fn scroll_by(&self, dx: f64, dy: f64) -> VitrineResult<()> {
        tracing::debug!(page = %self.id(), dx, dy, "scroll_by");
        self.driver().scroll_by(dx, dy).await
    }

    /// Scroll down one step
    pub async fn scroll_down(&self) -> VitrineResult<()> {
        self.scroll_by(0.0, DEFAULT_SCROLL_STEP).await
    }

    /// Scroll up one step
    pub async fn scroll_up(&self) -> VitrineResult<()> {
        self.scroll_by(0.0, -DEFAULT_SCROLL_STEP).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::wait::{LoadState, Timeouts};
    use std::sync::Arc;
    use std::time::Instant;

    async fn opened(driver: &MockDriver) -> PageHandle {
        let page = PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate());
        page.goto("https://example.org/", LoadState::DomContentLoaded)
            .await
            .unwrap();
        page
    }

    #[tokio::test]
    async fn test_press_key_reaches_focused_element() {
        let driver = MockDriver::new();
        driver.add(&Selector::css("#q"), MockElement::input(""));
        let page = opened(&driver).await;
        page.locator("#q").fill("rust").await.unwrap();
        page.press_enter().await.unwrap();
        assert_eq!(driver.with_dom(|d| d.keys().to_vec()), vec!["Enter"]);
    }

    #[tokio::test]
    async fn test_press_key_without_focus_fails() {
        let driver = MockDriver::new();
        let page = opened(&driver).await;
        let err = page.press_arrow_down().await.unwrap_err();
        assert!(matches!(err, VitrineError::Driver { .. }));
    }

    #[tokio::test]
    async fn test_press_key_after_session_closed() {
        let driver = MockDriver::new();
        let page = opened(&driver).await;
        driver.disconnect();
        assert!(matches!(
            page.press_key("Enter").await.unwrap_err(),
            VitrineError::Driver { .. }
        ));
    }

    #[tokio::test]
    async fn test_pseudo_content_keeps_quotes() {
        let driver = MockDriver::new();
        driver.add(
            &Selector::css(".badge"),
            MockElement::new("span", "").with_before("\"Hello\""),
        );
        let page = opened(&driver).await;
        let content = page
            .read_pseudo_element_content(&page.locator(".badge"), PseudoElement::Before)
            .await
            .unwrap();
        assert_eq!(content, "\"Hello\"");
    }

    #[tokio::test]
    async fn test_pseudo_content_none_when_absent() {
        let driver = MockDriver::new();
        driver.add(&Selector::css(".plain"), MockElement::new("span", ""));
        let page = opened(&driver).await;
        let content = page
            .read_pseudo_element_content(&page.locator(".plain"), PseudoElement::After)
            .await
            .unwrap();
        assert_eq!(content, "none");
    }

    #[tokio::test]
    async fn test_wait_sleeps_at_least_duration() {
        let driver = MockDriver::new();
        let page = opened(&driver).await;
        let start = Instant::now();
        page.wait(0.02).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
        page.wait(-1.0).await;
    }

    #[tokio::test]
    async fn test_scroll_accumulates() {
        let driver = MockDriver::new();
        let page = opened(&driver).await;
        page.scroll_down().await.unwrap();
        page.scroll_by(10.0, -100.0).await.unwrap();
        assert_eq!(driver.with_dom(|d| d.scroll()), (10.0, 400.0));
    }

    mod key_definition_tests {
        use super::keys::definition;

        #[test]
        fn test_named_keys() {
            let enter = definition("Enter").unwrap();
            assert_eq!(enter.key_code, 13);
            assert_eq!(enter.text.as_deref(), Some("\r"));
            assert_eq!(definition("ArrowDown").unwrap().key_code, 40);
            assert!(definition("Backspace").unwrap().text.is_none());
        }

        #[test]
        fn test_single_characters() {
            let seven = definition("7").unwrap();
            assert_eq!(seven.code, "Digit7");
            assert_eq!(seven.key_code, 55);
            let a = definition("a").unwrap();
            assert_eq!((a.code.as_str(), a.key_code), ("KeyA", 65));
            assert_eq!(definition("+").unwrap().text.as_deref(), Some("+"));
        }

        #[test]
        fn test_unknown_name() {
            assert!(definition("Hyper").is_none());
            assert!(definition("").is_none());
        }
    }
}
