//! Polymer Shop demo (shop.polymer-project.org).
//!
//! The shop has four category listings, one detail page per item and a
//! cart. Listing and detail pages share the header links to every category;
//! those live in [`NavigationLinks`], which each page object embeds.

use crate::assertion::Expect;
use crate::interaction::DEFAULT_SCROLL_STEP;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;
use std::fmt;

/// Shop root
pub const SHOP_URL: &str = "https://shop.polymer-project.org/";

/// Product categories, in header-tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Men's Outerwear
    MensOuterwear,
    /// Ladies Outerwear
    LadiesOuterwear,
    /// Men's T-Shirts
    MensTshirts,
    /// Ladies T-Shirts
    LadiesTshirts,
}

impl Category {
    /// Every category in tab order
    pub const ALL: [Self; 4] = [
        Self::MensOuterwear,
        Self::LadiesOuterwear,
        Self::MensTshirts,
        Self::LadiesTshirts,
    ];

    /// Path segment used in URLs
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::MensOuterwear => "mens_outerwear",
            Self::LadiesOuterwear => "ladies_outerwear",
            Self::MensTshirts => "mens_tshirts",
            Self::LadiesTshirts => "ladies_tshirts",
        }
    }

    /// Display title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::MensOuterwear => "Men's Outerwear",
            Self::LadiesOuterwear => "Ladies Outerwear",
            Self::MensTshirts => "Men's T-Shirts",
            Self::LadiesTshirts => "Ladies T-Shirts",
        }
    }

    /// Position of the header tab and home section
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::MensOuterwear => 0,
            Self::LadiesOuterwear => 1,
            Self::MensTshirts => 2,
            Self::LadiesTshirts => 3,
        }
    }

    /// Listing URL
    #[must_use]
    pub fn list_url(&self) -> String {
        format!("{SHOP_URL}list/{}", self.slug())
    }

    /// Detail URL of an item; `/` and spaces in the name become `+`
    #[must_use]
    pub fn detail_url(&self, item: &str) -> String {
        let path: String = item
            .chars()
            .map(|c| if c == ' ' || c == '/' { '+' } else { c })
            .collect();
        format!("{SHOP_URL}detail/{}/{path}", self.slug())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Header links to every category and the "View Cart" popup button
#[derive(Debug, Clone)]
pub struct NavigationLinks {
    page: PageHandle,
    view_cart: Locator,
}

impl NavigationLinks {
    /// Links on `page`
    #[must_use]
    pub fn new(page: &PageHandle) -> Self {
        Self {
            view_cart: page.get_by_text("View Cart"),
            page: page.clone(),
        }
    }

    /// Link to a category listing
    #[must_use]
    pub fn link(&self, category: Category) -> Locator {
        self.page.get_by_role("link", Some(category.title()))
    }

    /// Scroll back to the header and follow a category link
    pub async fn go_to(&self, category: Category) -> VitrineResult<()> {
        self.page.scroll_by(0.0, -DEFAULT_SCROLL_STEP).await?;
        self.link(category).click().await
    }

    /// Open the cart from the "added to cart" popup
    pub async fn view_cart(&self) -> VitrineResult<()> {
        self.page.scroll_by(0.0, -DEFAULT_SCROLL_STEP).await?;
        self.view_cart.click().await
    }
}

/// Landing page with category tabs and sections
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
    tabs: Locator,
    sections: Locator,
}

impl PageObject for HomePage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl HomePage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            tabs: page.locator("shop-tabs shop-tab"),
            sections: page.locator("shop-home div h2"),
            base: BasePage::new(page, expect, SHOP_URL),
        }
    }

    /// Header tab of a category
    #[must_use]
    pub fn tab(&self, category: Category) -> Locator {
        self.tabs.nth(category.index())
    }

    /// Home-page section heading of a category
    #[must_use]
    pub fn section(&self, category: Category) -> Locator {
        self.sections.nth(category.index())
    }

    /// Follow a header tab
    pub async fn open_category(&self, category: Category) -> VitrineResult<()> {
        self.tab(category).click().await
    }

    /// Every category has a visible tab and section
    pub async fn verify_categories(&self) -> VitrineResult<()> {
        for category in Category::ALL {
            self.base.expect().to_be_visible(&self.tab(category)).await?;
            self.base.expect().to_be_visible(&self.section(category)).await?;
        }
        Ok(())
    }
}

/// Listing of one category
#[derive(Debug, Clone)]
pub struct CategoryPage {
    base: BasePage,
    category: Category,
    title: Locator,
    links: NavigationLinks,
}

impl PageObject for CategoryPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl CategoryPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect, category: Category) -> Self {
        Self {
            title: page.get_by_text(category.title()).first(),
            links: NavigationLinks::new(&page),
            base: BasePage::new(page, expect, category.list_url()),
            category,
        }
    }

    /// Category shown
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Shared header links
    #[must_use]
    pub const fn links(&self) -> &NavigationLinks {
        &self.links
    }

    /// Product tile by item name
    #[must_use]
    pub fn item(&self, name: &str) -> Locator {
        self.base.page().get_by_alt_text(name)
    }

    /// Open an item's detail page
    pub async fn open_item(&self, name: &str) -> VitrineResult<()> {
        self.item(name).click().await
    }

    /// The category title is shown
    pub async fn verify_title(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.title).await
    }
}

/// Detail page of one item
#[derive(Debug, Clone)]
pub struct ItemDetailPage {
    base: BasePage,
    name: String,
    heading: Locator,
    size: Locator,
    quantity: Locator,
    add_to_cart: Locator,
    dialog: Locator,
    close_dialog: Locator,
    links: NavigationLinks,
}

impl PageObject for ItemDetailPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl ItemDetailPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect, category: Category, name: &str) -> Self {
        Self {
            heading: page.get_by_role("heading", Some(name)),
            size: page.get_by_label("Size"),
            quantity: page.get_by_label("Quantity"),
            add_to_cart: page.get_by_role("button", Some("Add this item to cart")),
            dialog: page.get_by_role("dialog", None),
            close_dialog: page.get_by_role("button", Some("Close dialog")),
            links: NavigationLinks::new(&page),
            base: BasePage::new(page, expect, category.detail_url(name)),
            name: name.to_string(),
        }
    }

    /// Item name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared header links
    #[must_use]
    pub const fn links(&self) -> &NavigationLinks {
        &self.links
    }

    /// Pick a size (`XS` .. `XL`)
    pub async fn select_size(&self, size: &str) -> VitrineResult<()> {
        self.size.select_option(size).await
    }

    /// Pick a quantity
    pub async fn select_quantity(&self, quantity: u32) -> VitrineResult<()> {
        self.quantity.select_option(&quantity.to_string()).await
    }

    /// Press "Add to cart"
    pub async fn add_to_cart(&self) -> VitrineResult<()> {
        self.add_to_cart.click().await
    }

    /// Close the "added to cart" dialog
    pub async fn dismiss_added_dialog(&self) -> VitrineResult<()> {
        self.close_dialog.click().await
    }

    /// The item heading is shown
    pub async fn verify_title(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.heading).await
    }

    /// The dialog confirms the item was added
    pub async fn verify_added_dialog(&self) -> VitrineResult<()> {
        self.base
            .expect()
            .to_contain_text(&self.dialog, "Added to cart")
            .await
    }
}

/// Shopping cart
#[derive(Debug, Clone)]
pub struct CartPage {
    base: BasePage,
    heading: Locator,
}

impl PageObject for CartPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl CartPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            heading: page.get_by_role("heading", Some("Your Cart")),
            base: BasePage::new(page, expect, format!("{SHOP_URL}cart")),
        }
    }

    /// Cart line of an item
    #[must_use]
    pub fn line(&self, name: &str) -> Locator {
        self.base.page().get_by_title(name)
    }

    /// The "Your Cart" heading is shown
    pub async fn verify_title(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.heading).await
    }

    /// The cart lists `name`
    pub async fn verify_contains(&self, name: &str) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.line(name)).await
    }
}
