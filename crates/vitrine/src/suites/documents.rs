use super::tags;
use crate::decode::QrDecoder;
use crate::harness::{TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::sites::names;
use crate::sites::pdf_samples::{PdfSamplesPage, Sample, SmallpdfPage};
use crate::sites::qr_code::{QrCodePage, QR_GENERATOR_URL};

const INVOICE_LINES: &[&str] = &[
    "Invoice Number: #20130304",
    "Denny Gunawan",
    "123 Somewhere St, Melbourne VIC 3000",
    "(03) 1234 5678",
    "Subtotal $36.00",
    "GST (10%) $3.60",
    "Total $39.60",
];

const PLAIN_INVOICE_LINES: &[&str] = &[
    "Invoice",
    "Invoice date: Nov 26, 2016",
    "Invoice number: 161126",
    "Payment due: 30 days after invoice date",
    "Please transfer amount to:",
    "Bank account number: 13201652",
    "Bank SWIFT code: CTBAAU2S",
];

const BLUE_SKY_LINES: &[&str] = &["Blue-sky printing", "Prince"];

pub(super) fn qr_code() -> TestSuite {
    TestSuite::new("qr-code")
        .with_test(
            TestCase::new("generator URL decodes back", |ctx| async move {
                let qr = ctx.fixture::<QrCodePage>(names::QR_CODE)?;
                qr.navigate().await?;
                qr.generate(QR_GENERATOR_URL).await?;
                qr.verify_image_visible().await?;
                qr.verify_decodes_to(QR_GENERATOR_URL).await
            })
            .uses(&[names::QR_CODE])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("simple text produces an image", |ctx| async move {
                let qr = ctx.fixture::<QrCodePage>(names::QR_CODE)?;
                qr.navigate().await?;
                qr.generate("Hello World").await?;
                qr.verify_image_visible().await
            })
            .uses(&[names::QR_CODE])
            .tag(tags::SMOKE),
        )
        .with_test(
            TestCase::new("special characters survive", |ctx| async move {
                let qr = ctx.fixture::<QrCodePage>(names::QR_CODE)?;
                qr.navigate().await?;
                qr.generate("Test!@").await?;
                qr.verify_decodes_to("Test!@").await
            })
            .uses(&[names::QR_CODE])
            .tag(tags::REGRESSION),
        )
        .with_test(
            TestCase::new("numeric payload through the shared decoder", |ctx| async move {
                let qr = ctx.fixture::<QrCodePage>(names::QR_CODE)?;
                let decoder = ctx.fixture::<QrDecoder>(names::QR_DECODER)?;
                qr.navigate().await?;
                qr.generate("1234567890").await?;
                let decoded = decoder.decode_locator(qr.image()).await?;
                ctx.expect()
                    .equals(&decoded.as_str(), &"1234567890", "decoded QR payload")
            })
            .uses(&[names::QR_CODE, names::QR_DECODER])
            .tag(tags::REGRESSION),
        )
}

/// Download one sample and check every line softly
fn sample_test(name: &str, sample: Sample, lines: &'static [&'static str]) -> TestCase {
    TestCase::new(name, move |ctx| async move {
        let samples = ctx.fixture::<PdfSamplesPage>(names::PDF_SAMPLES)?;
        samples.navigate().await?;
        let text = samples.download(sample).await?.text();
        let soft = ctx.soft();
        for line in lines {
            soft.contains(&text, line, "PDF text")?;
        }
        Ok(())
    })
    .uses(&[names::PDF_SAMPLES])
    .tag(tags::REGRESSION)
}

pub(super) fn pdf_samples() -> TestSuite {
    TestSuite::new("pdf-samples")
        .with_test(sample_test("invoice contents", Sample::Invoice, INVOICE_LINES))
        .with_test(sample_test(
            "plain invoice contents",
            Sample::PlainInvoice,
            PLAIN_INVOICE_LINES,
        ))
        .with_test(sample_test("blue-sky essay contents", Sample::BlueSky, BLUE_SKY_LINES))
        .with_test(
            TestCase::new("smallpdf sample has text", |ctx| async move {
                let smallpdf = ctx.fixture::<SmallpdfPage>(names::SMALLPDF)?;
                smallpdf.navigate().await?;
                let text = smallpdf.download_sample().await?.text();
                ctx.expect().is_true(!text.is_empty(), "smallpdf sample text is not empty")
            })
            .uses(&[names::SMALLPDF])
            .tag(tags::SMOKE),
        )
}
