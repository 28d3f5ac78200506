//! Decoding oracles: turn downloaded or rendered artifacts into text that
//! expectations can compare against.

mod pdf;
mod qr;

pub use pdf::PdfText;
pub use qr::QrDecoder;

/// Render a QR code to PNG with a quiet zone
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn qr_png(payload: &str) -> Vec<u8> {
    use image::{GrayImage, ImageFormat, Luma};
    use qrcode::{Color, QrCode};

    const SCALE: u32 = 8;
    const QUIET: u32 = 4;

    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET) * SCALE;
    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside =
            (QUIET..QUIET + modules).contains(&mx) && (QUIET..QUIET + modules).contains(&my);
        if inside {
            let index = ((my - QUIET) * modules + (mx - QUIET)) as usize;
            if colors[index] == Color::Dark {
                return Luma([0]);
            }
        }
        Luma([255])
    });
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("in-memory PNG encoding");
    bytes.into_inner()
}

/// One page per entry, one text object per run
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn pdf_bytes(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for runs in pages {
        let mut operations = Vec::new();
        for (i, run) in runs.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![50.into(), (750 - 20 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*run)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let stream = content.encode().expect("content stream encodes");
        let content_id = doc.add_object(Stream::new(dictionary! {}, stream));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("in-memory PDF save");
    bytes
}
