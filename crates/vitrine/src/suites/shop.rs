use super::tags;
use crate::harness::{TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::sites::coffee::{CartPage, MenuPage, CART_URL, MENU_URL};
use crate::sites::polymer::{self, Category, CategoryPage, HomePage, ItemDetailPage};
use crate::sites::{category_fixture, names, POLYMER_ITEMS};

const MENU: &[&str] = &[names::COFFEE_MENU];
const MENU_AND_CART: &[&str] = &[names::COFFEE_MENU, names::COFFEE_CART];

pub(super) fn coffee_cart() -> TestSuite {
    TestSuite::new("coffee-cart")
        .with_test(
            TestCase::new("order an espresso macchiato from the menu", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add_espresso_macchiato().await?;
                menu.hover_pay_container().await?;
                menu.verify_pay_container_contains("Espresso Macchiato x 1").await?;
                menu.click_direct_checkout().await?;
                let form = menu.checkout();
                form.verify_open().await?;
                form.fill_name("My Name").await?;
                form.fill_email("mail@mail.mail").await?;
                form.submit().await?;
                form.verify_snackbar().await
            })
            .uses(MENU)
            .tag(tags::SMOKE)
            .tag(tags::E2E),
        )
        .with_test(
            TestCase::new("order an espresso macchiato from the cart page", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                let cart = ctx.fixture::<CartPage>(names::COFFEE_CART)?;
                menu.navigate().await?;
                menu.add_espresso_macchiato().await?;
                menu.go_to_cart().await?;
                cart.verify_contains("Espresso Macchiato").await?;
                cart.click_checkout().await?;
                let form = cart.checkout();
                form.fill_name("Snesko Belic").await?;
                form.fill_email("snesko.belic@zima.ladno").await?;
                form.submit().await?;
                form.verify_snackbar().await
            })
            .uses(MENU_AND_CART)
            .tag(tags::E2E),
        )
        .with_test(
            TestCase::new("invalid email keeps the form open", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.click_direct_checkout().await?;
                let form = menu.checkout();
                form.fill_name("Test User").await?;
                form.fill_email("invalid-email").await?;
                form.submit().await?;
                form.verify_open().await
            })
            .uses(MENU)
            .tag(tags::NEGATIVE),
        )
        .with_test(
            TestCase::new("empty form is not submitted", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.click_direct_checkout().await?;
                menu.checkout().submit().await?;
                menu.checkout().verify_open().await
            })
            .uses(MENU)
            .tag(tags::NEGATIVE),
        )
        .with_test(
            TestCase::new("empty cart message", |ctx| async move {
                let cart = ctx.fixture::<CartPage>(names::COFFEE_CART)?;
                cart.navigate().await?;
                cart.verify_empty().await
            })
            .uses(&[names::COFFEE_CART])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("cart counter follows added cups", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.verify_cart_count(0).await?;
                menu.add("Espresso").await?;
                menu.verify_cart_count(1).await?;
                menu.add("Cappuccino").await?;
                menu.add_espresso_macchiato().await?;
                menu.verify_cart_count(3).await
            })
            .uses(MENU)
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("cart lists different drinks", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                let cart = ctx.fixture::<CartPage>(names::COFFEE_CART)?;
                menu.navigate().await?;
                for drink in ["Mocha", "Americano", "Cappuccino"] {
                    menu.add(drink).await?;
                }
                menu.go_to_cart().await?;
                let soft = ctx.soft();
                for drink in ["Mocha", "Americano", "Cappuccino"] {
                    soft.to_contain_text(cart.order_list(), drink).await?;
                }
                Ok(())
            })
            .uses(MENU_AND_CART)
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("remove all of one drink", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                let cart = ctx.fixture::<CartPage>(names::COFFEE_CART)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.add("Cappuccino").await?;
                menu.add_espresso_macchiato().await?;
                menu.go_to_cart().await?;
                menu.verify_cart_count(3).await?;
                cart.remove_all("Espresso").await?;
                menu.verify_cart_count(2).await
            })
            .uses(MENU_AND_CART)
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("pay container adds and removes cups", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.hover_pay_container().await?;
                menu.verify_pay_container_contains("Espresso x 1").await?;
                menu.add_one("Espresso").await?;
                menu.verify_pay_container_contains("Espresso x 2").await?;
                menu.verify_cart_count(2).await?;
                menu.remove_one("Espresso").await?;
                menu.remove_one("Espresso").await?;
                menu.verify_cart_count(0).await
            })
            .uses(MENU)
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("total follows the cups", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.hover_pay_container().await?;
                menu.verify_total("Total: $10.00").await?;
                menu.add_espresso_macchiato().await?;
                menu.hover_pay_container().await?;
                menu.verify_total("Total: $22.00").await
            })
            .uses(MENU)
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("third cup unlocks the discounted mocha", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                let cart = ctx.fixture::<CartPage>(names::COFFEE_CART)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.add_espresso_macchiato().await?;
                menu.add("Cappuccino").await?;
                menu.verify_promotion_shown().await?;
                menu.accept_promotion().await?;
                menu.go_to_cart().await?;
                for line in ["Espresso", "Espresso Macchiato", "Cappuccino", "(Discounted) Mocha"] {
                    cart.verify_contains(line).await?;
                }
                Ok(())
            })
            .uses(MENU_AND_CART)
            .tag(tags::E2E),
        )
        .with_test(
            TestCase::new("navigate between menu and cart", |ctx| async move {
                let menu = ctx.fixture::<MenuPage>(names::COFFEE_MENU)?;
                menu.navigate().await?;
                menu.add("Espresso").await?;
                menu.go_to_cart().await?;
                ctx.expect().to_have_url(ctx.page(), CART_URL).await?;
                ctx.page()
                    .get_by_role("link", Some("Menu page"))
                    .click()
                    .await?;
                ctx.expect().to_have_url(ctx.page(), MENU_URL).await
            })
            .uses(MENU)
            .tag(tags::SMOKE),
        )
}

/// Every fixture the shop journey touches
fn polymer_fixtures() -> Vec<String> {
    let mut fixtures = vec![names::POLYMER_HOME.to_string()];
    fixtures.extend(Category::ALL.into_iter().map(category_fixture));
    fixtures.extend(POLYMER_ITEMS.iter().map(|(name, ..)| (*name).to_string()));
    fixtures.push(names::POLYMER_CART.to_string());
    fixtures
}

pub(super) fn polymer_shop() -> TestSuite {
    let fixtures = polymer_fixtures();
    let fixture_refs: Vec<&str> = fixtures.iter().map(String::as_str).collect();
    TestSuite::new("polymer-shop").with_test(
        TestCase::new("buy one item from every category", |ctx| async move {
            let home = ctx.fixture::<HomePage>(names::POLYMER_HOME)?;
            home.navigate().await?;
            home.verify_categories().await?;

            let mut previous: Option<&ItemDetailPage> = None;
            for (index, (fixture, category, _)) in POLYMER_ITEMS.into_iter().enumerate() {
                tracing::info!(%category, "shopping category");
                match previous {
                    None => home.open_category(category).await?,
                    Some(item) => item.links().go_to(category).await?,
                }
                let listing = ctx.fixture::<CategoryPage>(&category_fixture(category))?;
                listing.verify_title().await?;
                let item = ctx.fixture::<ItemDetailPage>(fixture)?;
                listing.open_item(item.name()).await?;
                item.verify_title().await?;
                item.select_size("XL").await?;
                item.select_quantity(2).await?;
                item.add_to_cart().await?;
                item.verify_added_dialog().await?;
                if index + 1 == POLYMER_ITEMS.len() {
                    item.links().view_cart().await?;
                } else {
                    item.dismiss_added_dialog().await?;
                }
                previous = Some(item);
            }

            let cart = ctx.fixture::<polymer::CartPage>(names::POLYMER_CART)?;
            cart.verify_title().await?;
            for (fixture, ..) in POLYMER_ITEMS {
                let item = ctx.fixture::<ItemDetailPage>(fixture)?;
                cart.verify_contains(item.name()).await?;
            }
            Ok(())
        })
        .uses(&fixture_refs)
        .tag(tags::E2E),
    )
}
