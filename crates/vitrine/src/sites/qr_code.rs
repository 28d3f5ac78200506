//! QA Playground QR-code generator.

use crate::assertion::Expect;
use crate::decode::QrDecoder;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// Generator URL
pub const QR_GENERATOR_URL: &str = "https://qaplayground.dev/apps/qr-code-generator/";

/// Text box, "Generate" button and the generated image
#[derive(Debug, Clone)]
pub struct QrCodePage {
    base: BasePage,
    input: Locator,
    generate: Locator,
    image: Locator,
    decoder: QrDecoder,
}

impl PageObject for QrCodePage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl QrCodePage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            input: page.get_by_role("textbox", Some("Enter text or URL")),
            generate: page.get_by_role("button", Some("Generate QR Code")),
            image: page.get_by_alt_text("qr-code"),
            base: BasePage::new(page, expect, QR_GENERATOR_URL),
            decoder: QrDecoder::new(),
        }
    }

    /// The generated image
    #[must_use]
    pub const fn image(&self) -> &Locator {
        &self.image
    }

    /// Type the payload
    pub async fn fill_text(&self, text: &str) -> VitrineResult<()> {
        self.input.fill(text).await
    }

    /// Press "Generate QR Code"
    pub async fn click_generate(&self) -> VitrineResult<()> {
        self.generate.click().await
    }

    /// Type the payload and generate
    pub async fn generate(&self, text: &str) -> VitrineResult<()> {
        self.fill_text(text).await?;
        self.click_generate().await
    }

    /// Payload read back from a screenshot of the generated image
    pub async fn decoded_text(&self) -> VitrineResult<String> {
        self.decoder.decode_locator(&self.image).await
    }

    /// The generated image is shown
    pub async fn verify_image_visible(&self) -> VitrineResult<()> {
        self.base.expect().to_be_visible(&self.image).await
    }

    /// The generated image decodes to `expected`
    pub async fn verify_decodes_to(&self, expected: &str) -> VitrineResult<()> {
        let decoded = self.decoded_text().await?;
        self.base
            .expect()
            .equals(&decoded.as_str(), &expected, "decoded QR payload")
    }
}
