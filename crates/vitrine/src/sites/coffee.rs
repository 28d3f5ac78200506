//! coffee-cart.app: menu, hover pay container, checkout modal and cart page.

use crate::assertion::{Expect, TextMatch};
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// Menu URL
pub const MENU_URL: &str = "https://coffee-cart.app/";

/// Cart URL
pub const CART_URL: &str = "https://coffee-cart.app/cart";

/// Payment-details modal shared by the menu and the cart page
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    expect: Expect,
    details: Locator,
    name: Locator,
    email: Locator,
    submit: Locator,
    snackbar: Locator,
}

impl CheckoutForm {
    /// Locators for the modal on `page`
    #[must_use]
    pub fn new(page: &PageHandle, expect: Expect) -> Self {
        Self {
            expect,
            details: page.get_by_text("Payment details\u{d7}We will send"),
            name: page.get_by_role("textbox", Some("Name")),
            email: page.get_by_role("textbox", Some("Email")),
            submit: page.get_by_role("button", Some("Submit")),
            snackbar: page.locator(".snackbar"),
        }
    }

    /// Type the customer name
    pub async fn fill_name(&self, name: &str) -> VitrineResult<()> {
        self.name.fill(name).await
    }

    /// Type the e-mail address; the form validates it on submit
    pub async fn fill_email(&self, email: &str) -> VitrineResult<()> {
        self.email.fill(email).await
    }

    /// Submit the form
    pub async fn submit(&self) -> VitrineResult<()> {
        self.submit.click().await
    }

    /// The modal is open
    pub async fn verify_open(&self) -> VitrineResult<()> {
        self.expect.to_be_visible(&self.details).await
    }

    /// The "thanks for your purchase" snackbar is shown
    pub async fn verify_snackbar(&self) -> VitrineResult<()> {
        self.expect.to_be_visible(&self.snackbar).await
    }
}

/// Coffee menu
#[derive(Debug, Clone)]
pub struct MenuPage {
    base: BasePage,
    espresso_macchiato: Locator,
    pay_container: Locator,
    direct_checkout: Locator,
    cart_link: Locator,
    promo_banner: Locator,
    promo_accept: Locator,
    checkout: CheckoutForm,
}

impl PageObject for MenuPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl MenuPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            espresso_macchiato: page.locator("li:nth-child(2) .cup-body"),
            pay_container: page.locator(".pay-container"),
            direct_checkout: page.locator("[data-test=\"checkout\"]"),
            cart_link: page.get_by_role("link", Some("Cart page")),
            promo_banner: page.get_by_text(
                "It's your lucky day! Get an extra cup of Mocha for $4.espressochocolate",
            ),
            promo_accept: page.locator(".buttons .yes"),
            checkout: CheckoutForm::new(&page, expect.clone()),
            base: BasePage::new(page, expect, MENU_URL),
        }
    }

    /// Cup of a drink by its menu name (`Espresso`, `Mocha`, `Cappuccino`, ...)
    #[must_use]
    pub fn cup(&self, drink: &str) -> Locator {
        self.base
            .page()
            .locator(format!("[data-test=\"{}\"]", drink.replace(' ', "_")))
    }

    /// Header link showing the item count, e.g. `cart (2)`
    #[must_use]
    pub fn cart_counter(&self, count: usize) -> Locator {
        self.base.page().get_by_text(format!("cart ({count})"))
    }

    /// Checkout modal
    #[must_use]
    pub const fn checkout(&self) -> &CheckoutForm {
        &self.checkout
    }

    /// Pay button, which also shows the running total
    #[must_use]
    pub const fn pay_button(&self) -> &Locator {
        &self.direct_checkout
    }

    /// Add one cup of a drink
    pub async fn add(&self, drink: &str) -> VitrineResult<()> {
        self.cup(drink).click().await
    }

    /// Add one Espresso Macchiato
    pub async fn add_espresso_macchiato(&self) -> VitrineResult<()> {
        self.espresso_macchiato.click().await
    }

    /// Open the pay container's item list
    pub async fn hover_pay_container(&self) -> VitrineResult<()> {
        self.pay_container.hover().await
    }

    /// "+" in the pay container for one drink
    pub async fn add_one(&self, drink: &str) -> VitrineResult<()> {
        self.base
            .page()
            .get_by_role("button", Some(&format!("Add one {drink}")))
            .click()
            .await
    }

    /// "-" in the pay container for one drink
    pub async fn remove_one(&self, drink: &str) -> VitrineResult<()> {
        self.base
            .page()
            .get_by_role("button", Some(&format!("Remove one {drink}")))
            .click()
            .await
    }

    /// Open the checkout modal from the pay button
    pub async fn click_direct_checkout(&self) -> VitrineResult<()> {
        self.direct_checkout.click().await
    }

    /// Follow the header link to the cart page
    pub async fn go_to_cart(&self) -> VitrineResult<()> {
        self.cart_link.click().await
    }

    /// Accept the Mocha promotion
    pub async fn accept_promotion(&self) -> VitrineResult<()> {
        self.promo_accept.click().await
    }

    /// The pay container lists `text`
    pub async fn verify_pay_container_contains(&self, text: &str) -> VitrineResult<()> {
        self.base
            .expect()
            .to_contain_text(&self.pay_container, text)
            .await
    }

    /// The pay button shows `total`, e.g. `Total: $22.00`
    pub async fn verify_total(&self, total: &str) -> VitrineResult<()> {
        self.base
            .expect()
            .to_contain_text(&self.direct_checkout, total)
            .await
    }

    /// The header shows `cart (count)`
    pub async fn verify_cart_count(&self, count: usize) -> VitrineResult<()> {
        self.base
            .expect()
            .to_be_visible(&self.cart_counter(count))
            .await
    }

    /// The promotion banner appeared
    pub async fn verify_promotion_shown(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.promo_banner).await
    }
}

/// Cart listing
#[derive(Debug, Clone)]
pub struct CartPage {
    base: BasePage,
    order_list: Locator,
    checkout_button: Locator,
    empty_message: Locator,
    checkout: CheckoutForm,
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
            order_list: page.locator("#app > div.list > div > ul"),
            checkout_button: page.locator(".pay"),
            empty_message: page.get_by_text("No coffee, go add some."),
            checkout: CheckoutForm::new(&page, expect.clone()),
            base: BasePage::new(page, expect, CART_URL),
        }
    }

    /// Order list
    #[must_use]
    pub const fn order_list(&self) -> &Locator {
        &self.order_list
    }

    /// Checkout modal
    #[must_use]
    pub const fn checkout(&self) -> &CheckoutForm {
        &self.checkout
    }

    /// Open the checkout modal
    pub async fn click_checkout(&self) -> VitrineResult<()> {
        self.checkout_button.click().await
    }

    /// Remove every cup of one drink
    pub async fn remove_all(&self, drink: &str) -> VitrineResult<()> {
        self.base
            .page()
            .get_by_role_exact("button", &format!("Remove all {drink}"))
            .click()
            .await
    }

    /// The order list contains `expected` (substring or pattern)
    pub async fn verify_contains(&self, expected: impl Into<TextMatch>) -> VitrineResult<()> {
        let expected = match expected.into() {
            TextMatch::Exact(text) => TextMatch::Contains(text),
            other => other,
        };
        self.base.expect().to_have_text(&self.order_list, expected).await
    }

    /// The "No coffee" message is shown
    pub async fn verify_empty(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.empty_message).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::wait::Timeouts;
    use regex::Regex;
    use std::sync::Arc;

    fn handle(driver: &MockDriver) -> PageHandle {
        PageHandle::new(Arc::new(driver.clone())).with_timeouts(Timeouts::immediate())
    }

    mod menu_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_updates_cart_counter() {
            let driver = MockDriver::new();
            let espresso = Selector::css("[data-test=\"Espresso\"]");
            driver.add(&espresso, MockElement::new("div", "Espresso"));
            driver.add(&Selector::text("cart (0)"), MockElement::new("a", "cart (0)"));
            driver.on_click(&espresso, |dom| {
                dom.remove(&Selector::text("cart (0)"));
                dom.set(&Selector::text("cart (1)"), vec![MockElement::new("a", "cart (1)")]);
            });

            let menu = MenuPage::new(handle(&driver), Expect::new());
            menu.navigate().await.unwrap();
            menu.verify_cart_count(0).await.unwrap();
            menu.add("Espresso").await.unwrap();
            menu.verify_cart_count(1).await.unwrap();
            assert!(menu.verify_cart_count(0).await.unwrap_err().is_assertion());
        }

        #[tokio::test]
        async fn test_cup_names_use_underscores() {
            let driver = MockDriver::new();
            let menu = MenuPage::new(handle(&driver), Expect::new());
            assert_eq!(
                menu.cup("Espresso Con Panna").selector(),
                &Selector::css("[data-test=\"Espresso_Con_Panna\"]")
            );
        }

        #[tokio::test]
        async fn test_checkout_flow_through_modal() {
            let driver = MockDriver::new();
            let modal = Selector::text("Payment details\u{d7}We will send");
            let submit = Selector::role("button", Some("Submit"));
            driver
                .add(&Selector::css("[data-test=\"checkout\"]"), MockElement::new("button", "Total: $10.00"))
                .add(&Selector::role("textbox", Some("Name")), MockElement::input(""))
                .add(&Selector::role("textbox", Some("Email")), MockElement::input(""))
                .add(&submit, MockElement::new("button", "Submit"));
            let shown = modal.clone();
            driver.on_click(&Selector::css("[data-test=\"checkout\"]"), move |dom| {
                dom.set(&shown, vec![MockElement::new("div", "Payment details")]);
            });
            driver.on_click(&submit, |dom| {
                dom.set(&Selector::css(".snackbar"), vec![MockElement::new("div", "Thanks")]);
            });

            let menu = MenuPage::new(handle(&driver), Expect::new());
            menu.navigate().await.unwrap();
            menu.verify_total("Total: $10.00").await.unwrap();
            menu.click_direct_checkout().await.unwrap();
            menu.checkout().verify_open().await.unwrap();
            menu.checkout().fill_name("My Name").await.unwrap();
            menu.checkout().fill_email("mail@mail.mail").await.unwrap();
            menu.checkout().submit().await.unwrap();
            menu.checkout().verify_snackbar().await.unwrap();
        }
    }

    mod cart_tests {
        use super::*;

        #[tokio::test]
        async fn test_verify_contains_is_substring_or_pattern() {
            let driver = MockDriver::new();
            driver.add(
                &Selector::css("#app > div.list > div > ul"),
                MockElement::new("ul", "Espresso Macchiato $12.00 x 1 (Discounted) Mocha $4.00 x 1"),
            );
            let cart = CartPage::new(handle(&driver), Expect::new());
            cart.navigate().await.unwrap();
            cart.verify_contains("Espresso Macchiato").await.unwrap();
            cart.verify_contains(Regex::new(r"(?i)\(discounted\) mocha").unwrap())
                .await
                .unwrap();
            assert!(cart.verify_contains("Americano").await.unwrap_err().is_assertion());
        }

        #[tokio::test]
        async fn test_soft_view_collects_cart_mismatches() {
            let driver = MockDriver::new();
            driver.add(&Selector::css("#app > div.list > div > ul"), MockElement::new("ul", "Mocha"));
            let expect = Expect::new();
            let cart = CartPage::new(handle(&driver), expect.soft());
            cart.navigate().await.unwrap();
            cart.verify_contains("Mocha").await.unwrap();
            cart.verify_contains("Americano").await.unwrap();
            cart.verify_contains("Cappuccino").await.unwrap();
            assert_eq!(expect.failures().len(), 2);
            assert!(expect.finish().is_err());
        }

        #[tokio::test]
        async fn test_navigates_to_cart_url() {
            let driver = MockDriver::new();
            let cart = CartPage::new(handle(&driver), Expect::new());
            cart.navigate().await.unwrap();
            assert_eq!(driver.navigations(), vec![CART_URL]);
        }
    }
}
