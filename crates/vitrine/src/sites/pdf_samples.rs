//! Sample PDF sources: the PrinceXML gallery and the smallpdf blog sample.

use crate::assertion::Expect;
use crate::decode::PdfText;
use crate::locator::Locator;
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};
use crate::result::VitrineResult;

/// Gallery URL
pub const PDF_SAMPLES_URL: &str = "https://www.princexml.com/samples/";

/// smallpdf sample article URL
pub const SMALLPDF_URL: &str = "https://smallpdf.com/blog/sample-pdf";

/// Samples the suites read, by position among the gallery's "PDF" links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Invoice with an organic-produce table
    Invoice,
    /// Plain YesLogic invoice
    PlainInvoice,
    /// "Blue-sky printing" essay
    BlueSky,
}

impl Sample {
    /// Zero-based index of the sample's "PDF" link
    #[must_use]
    pub const fn link_index(&self) -> usize {
        match self {
            Self::Invoice => 1,
            Self::PlainInvoice => 2,
            Self::BlueSky => 6,
        }
    }
}

/// Sample gallery
#[derive(Debug, Clone)]
pub struct PdfSamplesPage {
    base: BasePage,
    pdf_links: Locator,
}

impl PageObject for PdfSamplesPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl PdfSamplesPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            pdf_links: page.get_by_role("link", Some("PDF")),
            base: BasePage::new(page, expect, PDF_SAMPLES_URL),
        }
    }

    /// "PDF" link of a sample
    #[must_use]
    pub fn link(&self, sample: Sample) -> Locator {
        self.pdf_links.nth(sample.link_index())
    }

    /// Download a sample into the download directory and extract its text
    pub async fn download(&self, sample: Sample) -> VitrineResult<PdfText> {
        let download = self
            .base
            .page()
            .download_by_clicking(&self.link(sample))
            .await?;
        tracing::debug!(?sample, file = %download.suggested_filename, "reading sample");
        PdfText::from_path(&download.path)
    }

    /// Download the produce invoice
    pub async fn download_invoice(&self) -> VitrineResult<PdfText> {
        self.download(Sample::Invoice).await
    }

    /// Download the plain invoice
    pub async fn download_plain_invoice(&self) -> VitrineResult<PdfText> {
        self.download(Sample::PlainInvoice).await
    }

    /// Download the blue-sky essay
    pub async fn download_blue_sky(&self) -> VitrineResult<PdfText> {
        self.download(Sample::BlueSky).await
    }

    /// Check that `text` contains each expected line, through the page's expectation view
    pub fn verify_contains_all(&self, text: &PdfText, expected: &[&str]) -> VitrineResult<()> {
        let text = text.text();
        for line in expected {
            self.base.expect().contains(&text, line, "PDF text")?;
        }
        Ok(())
    }
}

/// smallpdf article offering one sample PDF and an upload entry point
#[derive(Debug, Clone)]
pub struct SmallpdfPage {
    base: BasePage,
    download_link: Locator,
    add_file: Locator,
}

impl PageObject for SmallpdfPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl SmallpdfPage {
    /// Build the page object; no element is looked up yet
    #[must_use]
    pub fn new(page: PageHandle, expect: Expect) -> Self {
        Self {
            download_link: page.get_by_role("link", Some("Download Sample PDF")),
            add_file: page.get_by_role("button", Some("Add PDF, image, Word, Excel,")),
            base: BasePage::new(page, expect, SMALLPDF_URL),
        }
    }

    /// Download the sample and extract its text
    pub async fn download_sample(&self) -> VitrineResult<PdfText> {
        let download = self
            .base
            .page()
            .download_by_clicking(&self.download_link)
            .await?;
        PdfText::from_path(&download.path)
    }

    /// Open the file picker of the upload widget
    pub async fn click_add_file(&self) -> VitrineResult<()> {
        self.add_file.click().await
    }
}
