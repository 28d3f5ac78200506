//! Plain text of a PDF document.

use crate::result::{VitrineError, VitrineResult};
use lopdf::Document;
use percent_encoding::percent_decode_str;
use std::path::Path;

/// Text extracted from a PDF.
///
/// Text runs are taken in page order, each percent-decoded and trimmed,
/// then joined with single spaces. Empty runs are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pages: Vec<String>,
}

impl PdfText {
    /// Read and extract a PDF file
    pub fn from_path(path: impl AsRef<Path>) -> VitrineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            VitrineError::decode(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Extract text from PDF bytes
    pub fn from_bytes(bytes: &[u8]) -> VitrineResult<Self> {
        let document = Document::load_mem(bytes)
            .map_err(|err| VitrineError::decode(format!("not a readable PDF: {err}")))?;
        let mut pages = Vec::new();
        for number in document.get_pages().keys() {
            let raw = document.extract_text(&[*number]).map_err(|err| {
                VitrineError::decode(format!("page {number}: {err}"))
            })?;
            pages.push(join_runs(raw.lines()));
        }
        tracing::debug!(pages = pages.len(), "extracted PDF text");
        Ok(Self { pages })
    }

    /// Number of pages
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of one page (zero-based)
    #[must_use]
    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    /// Whole-document text
    #[must_use]
    pub fn text(&self) -> String {
        join_runs(self.pages.iter().map(String::as_str))
    }

    /// Whether the document text contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }
}

impl std::fmt::Display for PdfText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

fn decode_run(run: &str) -> String {
    percent_decode_str(run).decode_utf8_lossy().trim().to_string()
}

fn join_runs<'a>(runs: impl Iterator<Item = &'a str>) -> String {
    runs.map(decode_run)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
