use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParserError;

use super::Page;

/// One page per slide, in numeric slide order; `heading` is the title
/// placeholder's text when the slide has one.
pub fn extract(path: &Path) -> Result<Vec<Page>, ParserError> {
    let file = File::open(path).map_err(|e| ParserError::ExtractorFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ParserError::ExtractorFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut slide_numbers: Vec<u32> = archive
        .file_names()
        .filter_map(slide_number_from_entry_name)
        .collect();
    slide_numbers.sort_unstable();

    let mut pages = Vec::new();
    for n in slide_numbers {
        let entry_name = format!("ppt/slides/slide{n}.xml");
        let mut entry = match archive.by_name(&entry_name) {
            Ok(e) => e,
            Err(_) => continue,
        };
        let mut xml = String::new();
        if entry.read_to_string(&mut xml).is_err() {
            continue;
        }
        let (texts, heading) = parse_slide_xml(&xml);
        if !texts.is_empty() {
            pages.push(Page {
                text: texts.join("\n"),
                page_number: n,
                heading,
            });
        }
    }

    Ok(pages)
}

fn slide_number_from_entry_name(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("ppt/slides/slide")?;
    let digits = rest.strip_suffix(".xml")?;
    digits.parse().ok()
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Returns (non-empty paragraph texts across every shape, title placeholder text).
fn parse_slide_xml(xml: &str) -> (Vec<String>, Option<String>) {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut texts: Vec<String> = Vec::new();
    let mut title: Option<String> = None;

    let mut in_shape = false;
    let mut shape_is_title = false;
    let mut shape_paragraphs: Vec<String> = Vec::new();

    let mut in_text = false;
    let mut paragraph_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name == b"sp" {
                    in_shape = true;
                    shape_is_title = false;
                    shape_paragraphs.clear();
                } else if name == b"ph" {
                    for attr in e.attributes().flatten() {
                        let key = local_name(attr.key.as_ref());
                        if key == b"type" {
                            if let Ok(v) = attr.unescape_value() {
                                if v == "title" || v == "ctrTitle" {
                                    shape_is_title = true;
                                }
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
                } else if name == b"p" && in_shape {
                    let trimmed = paragraph_text.trim().to_string();
                    if !trimmed.is_empty() {
                        texts.push(trimmed.clone());
                        shape_paragraphs.push(trimmed);
                    }
                    paragraph_text.clear();
                } else if name == b"sp" {
                    if shape_is_title && !shape_paragraphs.is_empty() {
                        title = Some(shape_paragraphs.join(" "));
                    }
                    in_shape = false;
                    shape_is_title = false;
                    shape_paragraphs.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    (texts, title)
}
