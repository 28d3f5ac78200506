//! QR codes in screenshots.

use crate::locator::Locator;
use crate::result::{VitrineError, VitrineResult};

/// Reads the payload of the first decodable QR grid in an image
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode an encoded image (PNG, JPEG)
    pub fn decode_png(&self, bytes: &[u8]) -> VitrineResult<String> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| VitrineError::decode(format!("unreadable image: {err}")))?
            .to_luma8();
        let (width, height) = image.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        tracing::debug!(grids = grids.len(), width, height, "scanned for QR grids");

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(err) => last_error = Some(err),
            }
        }
        Err(VitrineError::decode(match last_error {
            Some(err) => format!("Failed to decode QR code: {err}"),
            None => "Failed to decode QR code".to_string(),
        }))
    }

    /// Screenshot the element and decode it
    pub async fn decode_locator(&self, locator: &Locator) -> VitrineResult<String> {
        let png = locator.screenshot().await?;
        self.decode_png(&png)
    }
}
