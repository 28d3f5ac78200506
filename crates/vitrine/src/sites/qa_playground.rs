//! QA Playground mini-apps: star rating, shadow DOM, dynamic table, tags
//! input, verification code and onboarding modal.
//!
//! The QR generator lives in [`qr_code`](super::qr_code).

use crate::assertion::{Expect, TextMatch};
use crate::driver::PseudoElement;
use crate::interaction::keys;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// Star-rating widget URL
pub const RATING_URL: &str = "https://qaplayground.dev/apps/rating/";

/// Shadow-DOM progress bar URL
pub const SHADOW_DOM_URL: &str = "https://qaplayground.dev/apps/shadow-dom/";

/// Superhero table URL
pub const DYNAMIC_TABLE_URL: &str = "https://qaplayground.dev/apps/dynamic-table/";

/// Tags input URL
pub const TAGS_INPUT_URL: &str = "https://qaplayground.dev/apps/tags-input-box/";

/// Six-digit verification code URL
pub const VERIFY_ACCOUNT_URL: &str = "https://qaplayground.dev/apps/verify-account/";

/// Onboarding modal URL
pub const ONBOARDING_URL: &str = "https://qaplayground.dev/apps/onboarding-modal/";

/// Caption the rating widget shows for 1 to 5 stars
pub const RATING_CAPTIONS: [&str; 5] = [
    "I just hate it",
    "I don't like it",
    "This is awesome",
    "I just like it",
    "I just love it",
];

/// Five star labels; the caption and score are CSS `::before` content
#[derive(Debug, Clone)]
pub struct RateStarsPage {
    base: BasePage,
    stars: Locator,
    caption: Locator,
    score: Locator,
}

impl PageObject for RateStarsPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl RateStarsPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            stars: page.locator("label"),
            caption: page.locator("span").nth(1),
            score: page.locator(".footer .numb"),
            base: BasePage::new(page, expect, RATING_URL),
        }
    }

    /// Label of the `stars`-th star, counting from 1; star 0 matches nothing
    #[must_use]
    pub fn star(&self, stars: usize) -> Locator {
        self.stars.nth(stars.wrapping_sub(1))
    }

    /// Click the `stars`-th star
    pub async fn rate(&self, stars: usize) -> VitrineResult<()> {
        self.star(stars).click().await
    }

    /// Rendered caption, quotes included
    pub async fn caption(&self) -> VitrineResult<String> {
        self.base
            .page()
            .read_pseudo_element_content(&self.caption, PseudoElement::Before)
            .await
    }

    /// Rendered score ("N out of 5"), quotes included
    pub async fn score(&self) -> VitrineResult<String> {
        self.base
            .page()
            .read_pseudo_element_content(&self.score, PseudoElement::Before)
            .await
    }

    /// The caption contains `text`
    pub async fn verify_caption(&self, text: &str) -> VitrineResult<()> {
        let caption = self.caption().await?;
        self.base.expect().contains(&caption, text, "rating caption")
    }

    /// The score contains `text`
    pub async fn verify_score(&self, text: &str) -> VitrineResult<()> {
        let score = self.score().await?;
        self.base.expect().contains(&score, text, "rating score")
    }
}

/// "Boost" button and progress bar rendered inside shadow roots
#[derive(Debug, Clone)]
pub struct ShadowDomPage {
    base: BasePage,
    boost: Locator,
    progress: Locator,
}

impl PageObject for ShadowDomPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl ShadowDomPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            boost: page.locator(".btn-green-outline"),
            progress: page.locator(".fill"),
            base: BasePage::new(page, expect, SHADOW_DOM_URL),
        }
    }

    /// Start filling the bar
    pub async fn boost(&self) -> VitrineResult<()> {
        self.boost.click().await
    }

    /// The bar's inline style contains `style` (e.g. `width: 95%;`)
    pub async fn verify_progress(&self, style: &str) -> VitrineResult<()> {
        self.base
            .expect()
            .to_have_attribute(&self.progress, "style", TextMatch::Contains(style.to_string()))
            .await
    }
}

/// One row of the superhero table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hero {
    /// Superhero name
    pub name: &'static str,
    /// Contact shown under the name
    pub email: &'static str,
    /// Status column
    pub status: &'static str,
    /// Real-name column
    pub real_name: &'static str,
}

/// Table whose rows are shuffled on every load
#[derive(Debug, Clone)]
pub struct DynamicTablePage {
    base: BasePage,
    table: Locator,
    head: Locator,
    body: Locator,
}

impl PageObject for DynamicTablePage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl DynamicTablePage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        let table = page.locator("table");
        Self {
            head: table.locator("thead"),
            body: table.locator("tbody"),
            table,
            base: BasePage::new(page, expect, DYNAMIC_TABLE_URL),
        }
    }

    /// Header cells
    #[must_use]
    pub fn headers(&self) -> Locator {
        self.head.locator("th")
    }

    /// Body rows
    #[must_use]
    pub fn rows(&self) -> Locator {
        self.body.locator("tr")
    }

    /// Row mentioning `hero`, wherever the shuffle put it
    #[must_use]
    pub fn row(&self, hero: &str) -> Locator {
        self.base.page().locator("tr").filter_has_text(hero)
    }

    /// Cell whose accessible name mentions `hero`
    #[must_use]
    pub fn cell(&self, hero: &str) -> Locator {
        self.base.page().get_by_role("cell", Some(hero))
    }

    /// Table, head and body are all shown
    pub async fn verify_table_visible(&self) -> VitrineResult<()> {
        let expect = self.base.expect();
        expect.to_be_visible(&self.table).await?;
        expect.to_be_visible(&self.head).await?;
        expect.to_be_visible(&self.body).await
    }

    /// Headers appear in this order and no others
    pub async fn verify_headers(&self, expected: &[&str]) -> VitrineResult<()> {
        let headers = self.headers();
        let expect = self.base.expect();
        expect.to_have_count(&headers, expected.len()).await?;
        for (i, header) in expected.iter().enumerate() {
            expect.to_contain_text(&headers.nth(i), header).await?;
        }
        Ok(())
    }

    /// Exactly `count` body rows
    pub async fn verify_row_count(&self, count: usize) -> VitrineResult<()> {
        self.base.expect().to_have_count(&self.rows(), count).await
    }

    /// The hero's cell is shown and carries the email
    pub async fn verify_hero_cell(&self, hero: &Hero) -> VitrineResult<()> {
        let cell = self.cell(hero.name);
        let expect = self.base.expect();
        expect.to_be_visible(&cell).await?;
        expect.to_contain_text(&cell, hero.email).await
    }

    /// The hero's row carries every column
    pub async fn verify_hero_row(&self, hero: &Hero) -> VitrineResult<()> {
        let row = self.row(hero.name);
        let expect = self.base.expect();
        expect.to_be_visible(&row).await?;
        for value in [hero.name, hero.email, hero.status, hero.real_name] {
            expect.to_contain_text(&row, value).await?;
        }
        Ok(())
    }
}

/// Tag box seeded with placeholder tags
#[derive(Debug, Clone)]
pub struct TagsPage {
    base: BasePage,
    input: Locator,
    remove_all: Locator,
    list: Locator,
}

impl PageObject for TagsPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl TagsPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            input: page.locator(".content input"),
            remove_all: page.get_by_role("button", Some("Remove All")),
            list: page.locator("ul"),
            base: BasePage::new(page, expect, TAGS_INPUT_URL),
        }
    }

    /// Every tag shown
    #[must_use]
    pub fn tags(&self) -> Locator {
        self.list.locator("li")
    }

    /// Drop every tag
    pub async fn remove_all(&self) -> VitrineResult<()> {
        self.remove_all.click().await
    }

    /// Type a tag and commit it with Enter
    pub async fn add_tag(&self, text: &str) -> VitrineResult<()> {
        self.input.click().await?;
        let page = self.base.page();
        page.keyboard_type(text).await?;
        page.press_enter().await
    }

    /// No tag is shown
    pub async fn verify_no_tags(&self) -> VitrineResult<()> {
        self.base.expect().to_have_count(&self.tags(), 0).await
    }

    /// The tag list mentions `text`
    pub async fn verify_tag(&self, text: &str) -> VitrineResult<()> {
        self.base.expect().to_contain_text(&self.list, text).await
    }
}

/// Number of digit boxes in the verification code
pub const CODE_LENGTH: usize = 6;

/// Six digit boxes that accept typing or arrow keys
#[derive(Debug, Clone)]
pub struct VerifyAccountPage {
    base: BasePage,
    digits: Vec<Locator>,
    status: Locator,
}

impl PageObject for VerifyAccountPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl VerifyAccountPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            digits: (1..=CODE_LENGTH)
                .map(|i| page.locator(format!(".code-container input:nth-child({i})")))
                .collect(),
            status: page.locator("small"),
            base: BasePage::new(page, expect, VERIFY_ACCOUNT_URL),
        }
    }

    /// Digit boxes, left to right
    #[must_use]
    pub fn digits(&self) -> &[Locator] {
        &self.digits
    }

    /// Type `digit` into every box
    pub async fn enter_code_by_typing(&self, digit: char) -> VitrineResult<()> {
        let key = digit.to_string();
        for input in &self.digits {
            input.press(&key).await?;
        }
        Ok(())
    }

    /// Raise every box from 0 to 9 with ArrowUp, checking each one
    pub async fn enter_code_with_arrows(&self) -> VitrineResult<()> {
        let page = self.base.page();
        for input in &self.digits {
            input.click().await?;
            for _ in 0..9 {
                page.press_key(keys::ARROW_UP).await?;
            }
            self.base
                .expect()
                .to_have_value(input, TextMatch::Contains("9".to_string()))
                .await?;
        }
        Ok(())
    }

    /// The status line reads "Success"
    pub async fn verify_success(&self) -> VitrineResult<()> {
        self.base.expect().to_have_text(&self.status, "Success").await
    }
}

/// Welcome modal with a slide-out menu
#[derive(Debug, Clone)]
pub struct OnboardingModalPage {
    base: BasePage,
    welcome: Locator,
    menu_button: Locator,
    menu_link: Locator,
}

impl PageObject for OnboardingModalPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl OnboardingModalPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            welcome: page.locator(".content .title"),
            menu_button: page.locator(".menu-btn"),
            menu_link: page.locator(".wrapper ul li a"),
            base: BasePage::new(page, expect, ONBOARDING_URL),
        }
    }

    /// Open the slide-out menu
    pub async fn open_menu(&self) -> VitrineResult<()> {
        self.menu_button.click().await
    }

    /// Hover the "Welcome on board" link
    pub async fn hover_menu_link(&self) -> VitrineResult<()> {
        self.menu_link.hover().await
    }

    /// The welcome title is shown
    pub async fn verify_welcome_visible(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.welcome).await
    }

    /// The menu link is shown
    pub async fn verify_menu_link_visible(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.menu_link).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::{Nth, Selector};
    use crate::result::VitrineError;
    use crate::wait::Timeouts;
    use std::sync::{Arc, Mutex};

    fn handle(driver: &MockDriver) -> PageHandle {
        PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate())
    }

    mod rate_stars_tests {
        use super::*;

        /// Widget whose star labels rewrite the caption and score
        fn widget() -> MockDriver {
            let driver = MockDriver::new();
            let spans = Selector::css("span");
            let score = Selector::css(".footer .numb");
            driver
                .add(&spans, MockElement::new("span", ""))
                .add(&spans, MockElement::new("span", ""))
                .add(&score, MockElement::new("span", ""));
            for (i, caption) in RATING_CAPTIONS.into_iter().enumerate() {
                let label = Selector::css("label");
                driver.add(&label, MockElement::new("label", ""));
                let (spans, score) = (spans.clone(), score.clone());
                driver.on_click(&label.nth(Nth::Index(i)), move |dom| {
                    dom.set(
                        &spans,
                        vec![
                            MockElement::new("span", ""),
                            MockElement::new("span", "").with_before(format!("\"{caption}\"")),
                        ],
                    );
                    dom.set(
                        &score,
                        vec![MockElement::new("span", "").with_before(format!("\"{} out of 5\"", i + 1))],
                    );
                });
            }
            driver
        }

        #[tokio::test]
        async fn test_each_star_reads_its_caption_from_before_content() {
            let driver = widget();
            let page = RateStarsPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            for (i, caption) in RATING_CAPTIONS.into_iter().enumerate() {
                page.rate(i + 1).await.unwrap();
                page.verify_caption(caption).await.unwrap();
                page.verify_score(&format!("{} out of 5", i + 1)).await.unwrap();
            }
            assert!(driver.was_called("pseudo:css=span >> nth=1::before"));
        }

        #[tokio::test]
        async fn test_unrated_caption_is_none() {
            let driver = widget();
            let page = RateStarsPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            assert_eq!(page.caption().await.unwrap(), "none");
            let err = page.verify_caption("I just love it").await.unwrap_err();
            assert!(err.is_assertion());
        }

        #[tokio::test]
        async fn test_star_zero_matches_nothing() {
            let driver = widget();
            let page = RateStarsPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            let err = page.rate(0).await.unwrap_err();
            assert!(matches!(err, VitrineError::ElementNotFound { .. }));
        }
    }

    mod shadow_dom_tests {
        use super::*;

        #[tokio::test]
        async fn test_boost_fills_the_bar() {
            let driver = MockDriver::new();
            let bar = Selector::css(".fill");
            driver
                .add(&Selector::css(".btn-green-outline"), MockElement::new("button", "Boost"))
                .add(&bar, MockElement::new("div", "").attr("style", "width: 0%;"));
            driver.on_click(&Selector::css(".btn-green-outline"), move |dom| {
                dom.set(&bar, vec![MockElement::new("div", "").attr("style", "width: 95%;")]);
            });
            let page = ShadowDomPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            assert!(page.verify_progress("width: 95%;").await.unwrap_err().is_assertion());
            page.boost().await.unwrap();
            page.verify_progress("width: 95%;").await.unwrap();
        }
    }

    mod dynamic_table_tests {
        use super::*;

        const SPIDER_MAN: Hero = Hero {
            name: "Spider-Man",
            email: "spider-man@avengers.com",
            status: "Active",
            real_name: "Peter Parker",
        };

        fn table(rows: usize) -> MockDriver {
            let driver = MockDriver::new();
            let table = Selector::css("table");
            let head = table.clone().within(Selector::css("thead"));
            let body = table.clone().within(Selector::css("tbody"));
            driver
                .add(&table, MockElement::new("table", ""))
                .add(&head, MockElement::new("thead", ""))
                .add(&body, MockElement::new("tbody", ""));
            for header in ["Superhero", "Status", "Real Name"] {
                driver.add(&head.clone().within(Selector::css("th")), MockElement::new("th", header));
            }
            for _ in 0..rows {
                driver.add(&body.clone().within(Selector::css("tr")), MockElement::new("tr", ""));
            }
            driver
                .add(
                    &Selector::css("tr"),
                    MockElement::new("tr", "Hulk hulk@avengers.com Active Bruce Banner"),
                )
                .add(
                    &Selector::css("tr"),
                    MockElement::new("tr", "Spider-Man spider-man@avengers.com Active Peter Parker"),
                )
                .add(
                    &Selector::role("cell", Some("Spider-Man")),
                    MockElement::new("td", "Spider-Man spider-man@avengers.com"),
                );
            driver
        }

        #[tokio::test]
        async fn test_structure() {
            let driver = table(8);
            let page = DynamicTablePage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.verify_table_visible().await.unwrap();
            page.verify_headers(&["Superhero", "Status", "Real Name"]).await.unwrap();
            page.verify_row_count(8).await.unwrap();
        }

        #[tokio::test]
        async fn test_hero_found_whatever_its_position() {
            let driver = table(8);
            let page = DynamicTablePage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.verify_hero_cell(&SPIDER_MAN).await.unwrap();
            page.verify_hero_row(&SPIDER_MAN).await.unwrap();
        }

        #[tokio::test]
        async fn test_wrong_header_order_fails_softly() {
            let driver = table(7);
            let expect = Expect::new();
            let page = DynamicTablePage::new(handle(&driver), expect.soft());
            page.navigate().await.unwrap();
            page.verify_headers(&["Status", "Superhero", "Real Name"]).await.unwrap();
            page.verify_row_count(8).await.unwrap();
            assert_eq!(expect.failures().len(), 3);
        }
    }

    mod tags_tests {
        use super::*;

        /// Tag box that turns the typed text into a tag on Enter
        fn tag_box() -> MockDriver {
            let driver = MockDriver::new();
            let input = Selector::css(".content input");
            let tags = Selector::css("ul").within(Selector::css("li"));
            let list = Selector::css("ul");
            driver
                .add(&input, MockElement::input(""))
                .add(&list, MockElement::new("ul", "node javascript"))
                .add(&tags, MockElement::new("li", "node"))
                .add(&tags, MockElement::new("li", "javascript"))
                .add(
                    &Selector::role("button", Some("Remove All")),
                    MockElement::new("button", "Remove All"),
                );
            let shown = Arc::new(Mutex::new(Vec::<String>::new()));
            {
                let (tags, list, shown) = (tags.clone(), list.clone(), Arc::clone(&shown));
                driver.on_click(&Selector::role("button", Some("Remove All")), move |dom| {
                    shown.lock().unwrap().clear();
                    dom.set(&tags, Vec::new());
                    dom.set(&list, vec![MockElement::new("ul", "")]);
                });
            }
            driver.on_key(keys::ENTER, move |dom| {
                let text = dom.value(&input).unwrap_or_default();
                let mut shown = shown.lock().unwrap();
                shown.push(text);
                dom.set(&tags, shown.iter().map(|t| MockElement::new("li", t.as_str())).collect());
                dom.set(&list, vec![MockElement::new("ul", shown.join(" "))]);
                dom.set(&input, vec![MockElement::input("")]);
            });
            driver
        }

        #[tokio::test]
        async fn test_remove_placeholders_then_add() {
            let driver = tag_box();
            let page = TagsPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.remove_all().await.unwrap();
            page.verify_no_tags().await.unwrap();
            page.add_tag("Ada Lovelace").await.unwrap();
            page.verify_tag("Ada Lovelace").await.unwrap();
            page.add_tag("Alan Turing").await.unwrap();
            page.verify_tag("Alan Turing").await.unwrap();
            page.base().expect().to_have_count(&page.tags(), 2).await.unwrap();
        }

        #[tokio::test]
        async fn test_enter_without_focus_is_driver_error() {
            let driver = tag_box();
            let page = TagsPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            let err = page.base().page().press_enter().await.unwrap_err();
            assert!(matches!(err, VitrineError::Driver { .. }));
        }
    }

    mod verify_account_tests {
        use super::*;

        fn digit(i: usize) -> Selector {
            Selector::css(format!(".code-container input:nth-child({})", i + 1))
        }

        /// Code boxes: typed digits and ArrowUp presses fill them in order
        fn code_boxes() -> MockDriver {
            let driver = MockDriver::new();
            for i in 0..CODE_LENGTH {
                driver.add(&digit(i), MockElement::input("0"));
            }
            driver.add(&Selector::css("small"), MockElement::new("small", ""));
            driver.on_key("9", |dom| {
                let typed = dom.keys().iter().filter(|k| *k == "9").count();
                dom.set(&digit(typed - 1), vec![MockElement::input("9")]);
                if typed == CODE_LENGTH {
                    dom.set_text(&Selector::css("small"), "Success");
                }
            });
            driver.on_key(keys::ARROW_UP, |dom| {
                let presses = dom.keys().iter().filter(|k| *k == keys::ARROW_UP).count();
                let value = (presses - 1) % 9 + 1;
                dom.set(&digit((presses - 1) / 9), vec![MockElement::input(value.to_string())]);
                if presses == CODE_LENGTH * 9 {
                    dom.set_text(&Selector::css("small"), "Success");
                }
            });
            driver
        }

        #[tokio::test]
        async fn test_typing_digits() {
            let driver = code_boxes();
            let page = VerifyAccountPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.enter_code_by_typing('9').await.unwrap();
            page.verify_success().await.unwrap();
            let presses = driver
                .call_history()
                .into_iter()
                .filter(|c| c.starts_with("press:"))
                .count();
            assert_eq!(presses, CODE_LENGTH);
        }

        #[tokio::test]
        async fn test_arrow_keys() {
            let driver = code_boxes();
            let page = VerifyAccountPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.enter_code_with_arrows().await.unwrap();
            page.verify_success().await.unwrap();
        }

        #[tokio::test]
        async fn test_partial_code_is_not_success() {
            let driver = code_boxes();
            let page = VerifyAccountPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.digits()[0].press("9").await.unwrap();
            assert!(page.verify_success().await.unwrap_err().is_assertion());
        }
    }

    mod onboarding_tests {
        use super::*;

        #[tokio::test]
        async fn test_menu_reveals_link() {
            let driver = MockDriver::new();
            let link = Selector::css(".wrapper ul li a");
            driver
                .add(&Selector::css(".content .title"), MockElement::new("h1", "Welcome Peter"))
                .add(&Selector::css(".menu-btn"), MockElement::new("label", ""))
                .add(&link, MockElement::new("a", "Welcome on board").hidden());
            driver.on_click(&Selector::css(".menu-btn"), move |dom| {
                dom.set(&link, vec![MockElement::new("a", "Welcome on board")]);
            });
            let page = OnboardingModalPage::new(handle(&driver), Expect::new());
            page.navigate().await.unwrap();
            page.verify_welcome_visible().await.unwrap();
            assert!(page.verify_menu_link_visible().await.unwrap_err().is_assertion());
            page.open_menu().await.unwrap();
            page.verify_menu_link_visible().await.unwrap();
            page.hover_menu_link().await.unwrap();
        }
    }
}
