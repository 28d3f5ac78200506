//! Page objects for the applications the bundled suites drive, and the
//! registry that exposes them as fixtures.

pub mod calculator;
pub mod coffee;
pub mod pdf_samples;
pub mod polymer;
pub mod qa_playground;
pub mod qr_code;
pub mod todo;

use crate::config::SuiteConfig;
use crate::decode::QrDecoder;
use crate::fixture::{FixtureContext, FixtureRegistry, FixtureRegistryBuilder};
use crate::result::VitrineResult;
use crate::visual::ScreenshotComparator;
use polymer::Category;
use std::sync::Arc;

/// Registered fixture names
pub mod names {
    /// [`BasicCalculatorPage`](super::calculator::BasicCalculatorPage)
    pub const BASIC_CALCULATOR: &str = "calculator_page";
    /// [`SbecagolCalculatorPage`](super::calculator::SbecagolCalculatorPage)
    pub const SBECAGOL_CALCULATOR: &str = "sbecagol_calculator_page";
    /// [`MenuPage`](super::coffee::MenuPage)
    pub const COFFEE_MENU: &str = "coffee_menu_page";
    /// [`CartPage`](super::coffee::CartPage)
    pub const COFFEE_CART: &str = "coffee_cart_page";
    /// [`TodoListPage`](super::todo::TodoListPage)
    pub const TODO_LIST: &str = "todo_list_page";
    /// [`SbecagolTodoPage`](super::todo::SbecagolTodoPage)
    pub const SBECAGOL_TODO: &str = "sbecagol_todo_page";
    /// [`HomePage`](super::polymer::HomePage)
    pub const POLYMER_HOME: &str = "polymer_home_page";
    /// [`CartPage`](super::polymer::CartPage)
    pub const POLYMER_CART: &str = "polymer_cart_page";
    /// [`QrCodePage`](super::qr_code::QrCodePage)
    pub const QR_CODE: &str = "qr_code_page";
    /// [`PdfSamplesPage`](super::pdf_samples::PdfSamplesPage)
    pub const PDF_SAMPLES: &str = "pdf_samples_page";
    /// [`SmallpdfPage`](super::pdf_samples::SmallpdfPage)
    pub const SMALLPDF: &str = "smallpdf_page";
    /// [`RateStarsPage`](super::qa_playground::RateStarsPage)
    pub const RATE_STARS: &str = "rate_stars_page";
    /// [`ShadowDomPage`](super::qa_playground::ShadowDomPage)
    pub const SHADOW_DOM: &str = "shadow_dom_page";
    /// [`DynamicTablePage`](super::qa_playground::DynamicTablePage)
    pub const DYNAMIC_TABLE: &str = "dynamic_table_page";
    /// [`TagsPage`](super::qa_playground::TagsPage)
    pub const TAGS: &str = "tags_page";
    /// [`VerifyAccountPage`](super::qa_playground::VerifyAccountPage)
    pub const VERIFY_ACCOUNT: &str = "verify_account_page";
    /// [`OnboardingModalPage`](super::qa_playground::OnboardingModalPage)
    pub const ONBOARDING_MODAL: &str = "onboarding_modal_page";
    /// [`QrDecoder`](crate::decode::QrDecoder)
    pub const QR_DECODER: &str = "qr_decoder";
    /// [`ScreenshotComparator`](crate::visual::ScreenshotComparator)
    pub const SCREENSHOTS: &str = "screenshots";
    /// Cat Fact [`ApiClient`](crate::api::ApiClient)
    pub const CAT_FACT_API: &str = "cat_fact_api";
    /// Wizard World [`ApiClient`](crate::api::ApiClient)
    pub const WIZARD_WORLD_API: &str = "wizard_world_api";
}

/// Polymer items the shop flow buys: fixture name, category, item name
pub const POLYMER_ITEMS: [(&str, Category, &str); 4] = [
    ("vastrm_hoodie_page", Category::MensOuterwear, "Vastrm Hoodie"),
    ("ladies_pullover_page", Category::LadiesOuterwear, "Ladies Pullover L/S Hood"),
    ("omi_tech_tee_page", Category::MensTshirts, "Omi Tech Tee"),
    ("ladies_chrome_tshirt_page", Category::LadiesTshirts, "Ladies Chrome T-Shirt"),
];

/// Fixture name of a Polymer category listing
#[must_use]
pub fn category_fixture(category: Category) -> String {
    format!("{}_page", category.slug())
}

/// Registry with every page object, the QR decoder, the screenshot
/// comparator and (with the `api` feature) the REST clients configured from
/// `config`
pub fn standard_registry(config: &SuiteConfig) -> VitrineResult<Arc<FixtureRegistry>> {
    let screenshots = config.screenshots.clone();
    let mut builder = FixtureRegistryBuilder::new()
        .page(names::BASIC_CALCULATOR, calculator::BasicCalculatorPage::new)
        .page(names::SBECAGOL_CALCULATOR, calculator::SbecagolCalculatorPage::new)
        .page(names::COFFEE_MENU, coffee::MenuPage::new)
        .page(names::COFFEE_CART, coffee::CartPage::new)
        .page(names::TODO_LIST, todo::TodoListPage::new)
        .page(names::SBECAGOL_TODO, todo::SbecagolTodoPage::new)
        .page(names::POLYMER_HOME, polymer::HomePage::new)
        .page(names::POLYMER_CART, polymer::CartPage::new)
        .page(names::QR_CODE, qr_code::QrCodePage::new)
        .page(names::PDF_SAMPLES, pdf_samples::PdfSamplesPage::new)
        .page(names::SMALLPDF, pdf_samples::SmallpdfPage::new)
        .page(names::RATE_STARS, qa_playground::RateStarsPage::new)
        .page(names::SHADOW_DOM, qa_playground::ShadowDomPage::new)
        .page(names::DYNAMIC_TABLE, qa_playground::DynamicTablePage::new)
        .page(names::TAGS, qa_playground::TagsPage::new)
        .page(names::VERIFY_ACCOUNT, qa_playground::VerifyAccountPage::new)
        .page(names::ONBOARDING_MODAL, qa_playground::OnboardingModalPage::new)
        .register(names::QR_DECODER, |_: &FixtureContext| Ok(QrDecoder::new()))
        .register(names::SCREENSHOTS, move |_: &FixtureContext| {
            Ok(ScreenshotComparator::new(screenshots.clone()))
        });

    for category in Category::ALL {
        builder = builder.page(category_fixture(category), move |page, expect| {
            polymer::CategoryPage::new(page, expect, category)
        });
    }
    for (name, category, item) in POLYMER_ITEMS {
        builder = builder.page(name, move |page, expect| {
            polymer::ItemDetailPage::new(page, expect, category, item)
        });
    }

    #[cfg(feature = "api")]
    {
        let cat_fact = config.api.cat_fact.clone();
        let wizard_world = config.api.wizard_world.clone();
        builder = builder
            .register(names::CAT_FACT_API, move |_: &FixtureContext| {
                crate::api::ApiClient::new(cat_fact.as_str())
            })
            .register(names::WIZARD_WORLD_API, move |_: &FixtureContext| {
                crate::api::ApiClient::new(wizard_world.as_str())
            });
    }
    #[cfg(not(feature = "api"))]
    let _ = config;

    builder.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assertion::Expect;
    use crate::driver::MockDriver;
    use crate::page::PageHandle;
    use crate::page_object::PageObject;

    fn context(driver: &MockDriver) -> FixtureContext {
        FixtureContext::new(PageHandle::new(Arc::new(driver.clone())), Expect::new())
    }

    #[test]
    fn test_registry_lists_every_page() {
        let registry = standard_registry(&SuiteConfig::default()).unwrap();
        for name in [
            names::BASIC_CALCULATOR,
            names::COFFEE_MENU,
            names::SBECAGOL_TODO,
            names::POLYMER_HOME,
            names::QR_DECODER,
            names::RATE_STARS,
            names::SCREENSHOTS,
            "mens_outerwear_page",
            "omi_tech_tee_page",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
        let api_clients = if cfg!(feature = "api") { 2 } else { 0 };
        assert_eq!(registry.len(), 27 + api_clients);
    }

    #[test]
    fn test_resolution_builds_requested_pages_only() {
        let registry = standard_registry(&SuiteConfig::default()).unwrap();
        let driver = MockDriver::new();
        let fixtures = registry
            .resolve(&["ladies_pullover_page", names::COFFEE_CART], &context(&driver))
            .unwrap();
        assert_eq!(fixtures.len(), 2);
        let item = fixtures
            .get::<polymer::ItemDetailPage>("ladies_pullover_page")
            .unwrap();
        assert_eq!(
            item.url(),
            "https://shop.polymer-project.org/detail/ladies_outerwear/Ladies+Pullover+L+S+Hood"
        );
        assert!(fixtures.get::<coffee::CartPage>(names::COFFEE_CART).is_ok());
        assert!(driver.call_history().is_empty());
    }

    #[test]
    fn test_two_resolutions_are_distinct() {
        let registry = standard_registry(&SuiteConfig::default()).unwrap();
        let a = MockDriver::new();
        let b = MockDriver::new();
        let first = registry.resolve(&[names::QR_CODE], &context(&a)).unwrap();
        let second = registry.resolve(&[names::QR_CODE], &context(&b)).unwrap();
        let first = first.get::<qr_code::QrCodePage>(names::QR_CODE).unwrap();
        let second = second.get::<qr_code::QrCodePage>(names::QR_CODE).unwrap();
        assert_ne!(first.base().page().id(), second.base().page().id());
    }

    #[test]
    fn test_screenshot_comparator_follows_config() {
        let mut config = SuiteConfig::default();
        config.screenshots.dir = std::path::PathBuf::from("/refs");
        let registry = standard_registry(&config).unwrap();
        let fixtures = registry
            .resolve(&[names::SCREENSHOTS], &context(&MockDriver::new()))
            .unwrap();
        let comparator = fixtures.get::<ScreenshotComparator>(names::SCREENSHOTS).unwrap();
        assert_eq!(comparator.settings().dir, std::path::PathBuf::from("/refs"));
    }

    #[cfg(feature = "api")]
    #[test]
    fn test_api_clients_follow_config() {
        let mut config = SuiteConfig::default();
        config.api.cat_fact = "http://127.0.0.1:9/".to_string();
        let registry = standard_registry(&config).unwrap();
        let fixtures = registry
            .resolve(&[names::CAT_FACT_API], &context(&MockDriver::new()))
            .unwrap();
        let client = fixtures
            .get::<crate::api::ApiClient>(names::CAT_FACT_API)
            .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
    }
}
