mod docx;
mod pdf;
mod pptx;

use std::path::Path;

use crate::error::ParserError;

/// One page/slide/section of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    /// 1-indexed.
    pub page_number: u32,
    /// Section title, slide title, etc. — absent for PDF pages.
    pub heading: Option<String>,
}

/// Extract ordered pages from a PDF/DOCX/PPTX file.
///
/// Routing is purely by extension; an unsupported extension is a caller bug
/// (the walker only ever hands this document-route extensions), not a
/// recoverable per-file condition, so it still returns `Err` rather than
/// panicking — the indexer logs it and moves on like any other extractor
/// failure.
pub fn extract_text(path: &Path) -> Result<Vec<Page>, ParserError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => pdf::extract(path),
        "docx" => docx::extract(path),
        "pptx" => pptx::extract(path),
        other => Err(ParserError::UnsupportedFormat {
            ext: other.to_string(),
        }),
    }
}
