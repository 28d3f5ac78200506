//! Screenshot comparison against reference PNGs on disk.
//!
//! A capture is compared pixel by pixel with `<dir>/<name>`; pixels whose
//! summed RGB distance exceeds the color threshold count as different. A
//! missing reference is written from the capture and the check fails, so the
//! first run of a new visual test never passes silently. In update mode every
//! capture replaces its reference and the check passes.

use crate::assertion::{Expect, Mismatch};
use crate::config::ScreenshotSettings;
use crate::locator::Locator;
use crate::result::{VitrineError, VitrineResult};
use image::{GenericImageView, Rgba};
use std::path::{Path, PathBuf};

/// Outcome of comparing two decoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Within the allowed number of differing pixels
    Match {
        /// Pixels that differed
        diff_pixels: usize,
    },
    /// Dimensions differ; pixels were not compared
    SizeMismatch {
        /// Reference width and height
        expected: (u32, u32),
        /// Capture width and height
        actual: (u32, u32),
    },
    /// Too many pixels differ
    PixelsDiffer {
        /// Pixels that differed
        diff_pixels: usize,
        /// Pixels compared
        total_pixels: usize,
    },
}

impl Comparison {
    /// Capture is close enough to the reference
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Compares captures with stored references
#[derive(Debug, Clone, Default)]
pub struct ScreenshotComparator {
    settings: ScreenshotSettings,
}

impl ScreenshotComparator {
    /// Comparator using `settings`
    #[must_use]
    pub const fn new(settings: ScreenshotSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    #[must_use]
    pub const fn settings(&self) -> &ScreenshotSettings {
        &self.settings
    }

    /// Reference file for `name`; `.png` is appended when missing
    #[must_use]
    pub fn reference_path(&self, name: &str) -> PathBuf {
        let path = self.settings.dir.join(name);
        if path.extension().is_some_and(|ext| ext == "png") {
            path
        } else {
            path.with_extension("png")
        }
    }

    /// Compare two encoded images
    pub fn compare(&self, actual: &[u8], expected: &[u8]) -> VitrineResult<Comparison> {
        let actual = image::load_from_memory(actual)
            .map_err(|err| VitrineError::decode(format!("unreadable capture: {err}")))?;
        let expected = image::load_from_memory(expected)
            .map_err(|err| VitrineError::decode(format!("unreadable reference: {err}")))?;
        if actual.dimensions() != expected.dimensions() {
            return Ok(Comparison::SizeMismatch {
                expected: expected.dimensions(),
                actual: actual.dimensions(),
            });
        }
        let threshold = u32::from(self.settings.color_threshold);
        let actual = actual.to_rgba8();
        let expected = expected.to_rgba8();
        let diff_pixels = actual
            .pixels()
            .zip(expected.pixels())
            .filter(|(a, b)| pixel_diff(**a, **b) > threshold)
            .count();
        let total_pixels = (actual.width() as usize) * (actual.height() as usize);
        if diff_pixels <= self.settings.max_diff_pixels {
            Ok(Comparison::Match { diff_pixels })
        } else {
            Ok(Comparison::PixelsDiffer {
                diff_pixels,
                total_pixels,
            })
        }
    }

    /// Capture `locator` and check it against the reference `name`
    pub async fn verify(&self, expect: &Expect, locator: &Locator, name: &str) -> VitrineResult<()> {
        let capture = locator.screenshot().await?;
        self.verify_png(expect, &capture, name)
    }

    /// Check an already captured PNG against the reference `name`
    pub fn verify_png(&self, expect: &Expect, capture: &[u8], name: &str) -> VitrineResult<()> {
        let path = self.reference_path(name);
        if !path.exists() {
            write_png(&path, capture)?;
            if self.settings.update {
                tracing::info!(reference = %path.display(), "reference screenshot created");
                return expect.check(Ok(()));
            }
            tracing::warn!(reference = %path.display(), "no reference screenshot; capture written");
            return expect.check(Err(Mismatch::new(
                "to_match_screenshot",
                path.display().to_string(),
                "no reference; capture written in its place",
            )
            .with_subject(name)));
        }

        let reference = std::fs::read(&path)?;
        let comparison = self.compare(capture, &reference)?;
        if comparison.is_match() {
            return expect.check(Ok(()));
        }
        if self.settings.update {
            write_png(&path, capture)?;
            tracing::info!(reference = %path.display(), "reference screenshot updated");
            return expect.check(Ok(()));
        }

        let actual_path = actual_path(&path);
        write_png(&actual_path, capture)?;
        let actual = match comparison {
            Comparison::SizeMismatch { expected, actual } => format!(
                "{}x{} capture against a {}x{} reference",
                actual.0, actual.1, expected.0, expected.1
            ),
            Comparison::PixelsDiffer {
                diff_pixels,
                total_pixels,
            } => format!(
                "{diff_pixels} of {total_pixels} pixels differ (capture at {})",
                actual_path.display()
            ),
            Comparison::Match { .. } => String::new(),
        };
        expect.check(Err(Mismatch::new(
            "to_match_screenshot",
            format!("at most {} differing pixels", self.settings.max_diff_pixels),
            actual,
        )
        .with_subject(name)))
    }
}

/// Summed absolute RGB channel distance; alpha is ignored
fn pixel_diff(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    let Rgba([r1, g1, b1, _]) = a;
    let Rgba([r2, g2, b2, _]) = b;
    u32::from(r1.abs_diff(r2)) + u32::from(g1.abs_diff(g2)) + u32::from(b1.abs_diff(b2))
}

/// `name.png` becomes `name-actual.png`
fn actual_path(reference: &Path) -> PathBuf {
    let stem = reference
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    reference.with_file_name(format!("{stem}-actual.png"))
}

fn write_png(path: &Path, bytes: &[u8]) -> VitrineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
