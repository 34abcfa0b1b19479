use std::path::Path;

use crate::error::ParserError;

use super::Page;

/// One page per source page, no heading — matches the spec's PDF contract.
pub fn extract(path: &Path) -> Result<Vec<Page>, ParserError> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| ParserError::ExtractorFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(pages
        .into_iter()
        .enumerate()
        .filter_map(|(idx, text)| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Page {
                    text: trimmed.to_string(),
                    page_number: (idx + 1) as u32,
                    heading: None,
                })
            }
        })
        .collect())
}
