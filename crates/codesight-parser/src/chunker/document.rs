use std::sync::OnceLock;

use regex::Regex;

use codesight_core::{Chunk, Language};

use crate::extractors::Page;

use super::config::ChunkConfig;

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

/// Split extracted document pages into paragraph-bounded chunks.
///
/// Each page is split independently; `start_line`/`end_line` both carry the
/// page number (pages have no line numbers) and `scope` is the page's
/// heading, falling back to `"page N"`.
pub fn chunk_document(pages: &[Page], file_path: &str, language: Language, cfg: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        let scope = page
            .heading
            .clone()
            .unwrap_or_else(|| format!("page {}", page.page_number));
        chunks.extend(split_text_by_paragraphs(
            &page.text,
            file_path,
            page.page_number,
            &scope,
            language,
            cfg,
        ));
    }
    chunks
}

fn split_text_by_paragraphs(
    text: &str,
    file_path: &str,
    page_number: u32,
    scope: &str,
    language: Language,
    cfg: &ChunkConfig,
) -> Vec<Chunk> {
    let paragraphs: Vec<&str> = paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in &paragraphs {
        if !current.is_empty() && current.len() + para.len() + 2 > cfg.max_chars {
            chunks.push(Chunk::new(file_path, page_number, page_number, scope, language, current.clone()));

            if cfg.overlap_chars > 0 && current.len() > cfg.overlap_chars {
                let tail_start = floor_char_boundary(&current, current.len() - cfg.overlap_chars);
                current = current[tail_start..].to_string();
            } else {
                current.clear();
            }
        }

        if !current.is_empty() {
            current.push_str("\n\n");
            current.push_str(para);
        } else {
            current.push_str(para);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(Chunk::new(file_path, page_number, page_number, scope, language, current));
    }

    chunks
}

fn floor_char_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str, n: u32, heading: Option<&str>) -> Page {
        Page {
            text: text.to_string(),
            page_number: n,
            heading: heading.map(str::to_string),
        }
    }

    #[test]
    fn blank_page_yields_no_chunks() {
        let pages = vec![page("   \n\n", 1, None)];
        assert!(chunk_document(&pages, "a.pdf", Language::Pdf, &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn single_short_page_is_one_chunk() {
        let pages = vec![page("Paragraph one.\n\nParagraph two.", 1, Some("Intro"))];
        let chunks = chunk_document(&pages, "a.pdf", Language::Pdf, &ChunkConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].scope, "Intro");
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 1);
        assert!(chunks[0].content.contains("Paragraph one."));
        assert!(chunks[0].content.contains("Paragraph two."));
    }

    #[test]
    fn missing_heading_falls_back_to_page_label() {
        let pages = vec![page("Some text.", 3, None)];
        let chunks = chunk_document(&pages, "a.pdf", Language::Pdf, &ChunkConfig::default());
        assert_eq!(chunks[0].scope, "page 3");
    }

    #[test]
    fn long_page_splits_with_overlap_carryover() {
        let para = "x".repeat(100);
        let text = vec![para.clone(); 30].join("\n\n");
        let cfg = ChunkConfig {
            max_chars: 500,
            overlap_chars: 50,
            ..ChunkConfig::default()
        };
        let pages = vec![page(&text, 1, None)];
        let chunks = chunk_document(&pages, "a.pdf", Language::Pdf, &cfg);
        assert!(chunks.len() > 1);
        // Overlap carryover means consecutive chunks share trailing/leading text.
        let tail = &chunks[0].content[chunks[0].content.len() - 50..];
        assert!(chunks[1].content.starts_with(&tail[..tail.len().min(10)]) || chunks[1].content.contains(&tail[..10.min(tail.len())]));
    }
}
