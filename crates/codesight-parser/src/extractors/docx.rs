use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParserError;

use super::Page;

/// Groups paragraphs into heading-delimited sections; `page_number` counts
/// sections starting at 1, mirroring the original source's `_extract_docx`.
pub fn extract(path: &Path) -> Result<Vec<Page>, ParserError> {
    let xml = read_document_xml(path)?;
    Ok(sections_from_document_xml(&xml))
}

fn read_document_xml(path: &Path) -> Result<String, ParserError> {
    let file = File::open(path).map_err(|e| ParserError::ExtractorFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ParserError::ExtractorFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ParserError::ExtractorFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ParserError::ExtractorFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(xml)
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn sections_from_document_xml(xml: &str) -> Vec<Page> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut pages = Vec::new();
    let mut buf = Vec::new();

    let mut in_text = false;
    let mut paragraph_style: Option<String> = None;
    let mut paragraph_text = String::new();

    let mut current_heading: Option<String> = None;
    let mut current_section = String::new();
    let mut section_num = 0u32;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name == b"pStyle" {
                    for attr in e.attributes().flatten() {
                        let key = local_name(attr.key.as_ref());
                        if key == b"val" {
                            if let Ok(v) = attr.unescape_value() {
                                paragraph_style = Some(v.to_string());
                            }
                        }
                    }
                } else if name == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Ok(t) = e.unescape() {
                        paragraph_text.push_str(&t);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name == b"t" {
                    in_text = false;
                } else if name == b"p" {
                    let is_heading = paragraph_style
                        .as_deref()
                        .map(|s| s.starts_with("Heading"))
                        .unwrap_or(false);
                    let text = paragraph_text.trim().to_string();

                    if is_heading {
                        if !current_section.trim().is_empty() {
                            section_num += 1;
                            pages.push(Page {
                                text: current_section.trim().to_string(),
                                page_number: section_num,
                                heading: current_heading.clone(),
                            });
                            current_section.clear();
                        }
                        current_heading = if text.is_empty() { None } else { Some(text) };
                    } else if !text.is_empty() {
                        if !current_section.is_empty() {
                            current_section.push('\n');
                        }
                        current_section.push_str(&text);
                    }

                    paragraph_style = None;
                    paragraph_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    if !current_section.trim().is_empty() {
        section_num += 1;
        pages.push(Page {
            text: current_section.trim().to_string(),
            page_number: section_num,
            heading: current_heading,
        });
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_heading() {
        let xml = r#"<w:document xmlns:w="ns">
<w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Introduction</w:t></w:r></w:p>
<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Details</w:t></w:r></w:p>
<w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
</w:body>
</w:document>"#;
        let pages = sections_from_document_xml(xml);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].heading.as_deref(), Some("Introduction"));
        assert_eq!(pages[0].text, "First paragraph.");
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].heading.as_deref(), Some("Details"));
        assert_eq!(pages[1].text, "Second paragraph.");
        assert_eq!(pages[1].page_number, 2);
    }

    #[test]
    fn text_before_any_heading_has_no_heading() {
        let xml = r#"<w:document xmlns:w="ns">
<w:body>
<w:p><w:r><w:t>No heading yet.</w:t></w:r></w:p>
</w:body>
</w:document>"#;
        let pages = sections_from_document_xml(xml);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].heading, None);
        assert_eq!(pages[0].text, "No heading yet.");
    }
}
