use codesight_core::{Chunk, Language};

use super::config::ChunkConfig;
use super::patterns::{detect_scope, is_boundary_line};

/// Split a file's content into scope-delimited chunks.
///
/// 1. If `language` has a boundary pattern, split on those line starts.
/// 2. Each segment becomes one chunk unless it exceeds `max_lines`, in
///    which case it is sub-split into overlapping windows.
/// 3. Languages without a boundary pattern fall back to overlapping windows
///    over the whole file.
pub fn chunk_code(content: &str, file_path: &str, language: Language, cfg: &ChunkConfig) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.split('\n').collect();

    if language.has_boundary_pattern() {
        split_by_boundaries(&lines, file_path, language, cfg)
    } else {
        split_by_windows(&lines, file_path, language, cfg, 0)
    }
}

fn split_by_boundaries(lines: &[&str], file_path: &str, language: Language, cfg: &ChunkConfig) -> Vec<Chunk> {
    let mut boundary_indices = vec![0usize];
    for (i, line) in lines.iter().enumerate().skip(1) {
        if is_boundary_line(language, line) {
            boundary_indices.push(i);
        }
    }

    let mut chunks = Vec::new();
    for (idx, &start) in boundary_indices.iter().enumerate() {
        let end = boundary_indices.get(idx + 1).copied().unwrap_or(lines.len());
        let segment = &lines[start..end];

        if segment.len() <= cfg.max_lines as usize {
            let scope = detect_scope(segment.first().copied().unwrap_or(""), language);
            let content = segment.join("\n");
            chunks.push(Chunk::new(
                file_path,
                (start + 1) as u32,
                end as u32,
                scope,
                language,
                content,
            ));
        } else {
            chunks.extend(split_by_windows(segment, file_path, language, cfg, start));
        }
    }
    chunks
}

fn split_by_windows(
    lines: &[&str],
    file_path: &str,
    language: Language,
    cfg: &ChunkConfig,
    line_offset: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let stride = (cfg.max_lines as usize).saturating_sub(cfg.overlap_lines as usize).max(1);

    let mut i = 0usize;
    loop {
        let end = (i + cfg.max_lines as usize).min(lines.len());
        let segment = &lines[i..end];
        let scope = detect_scope(segment.first().copied().unwrap_or(""), language);
        let start_line = (line_offset + i + 1) as u32;
        let end_line = (line_offset + end) as u32;
        chunks.push(Chunk::new(
            file_path,
            start_line,
            end_line,
            scope,
            language,
            segment.join("\n"),
        ));

        i += stride;
        if i >= lines.len() {
            break;
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_code("   \n\n", "a.py", Language::Python, &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn python_two_functions() {
        let content = "def foo():\n    return 1\n\ndef bar():\n    return 2\n";
        let chunks = chunk_code(content, "a.py", Language::Python, &ChunkConfig::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].scope, "function foo");
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[1].scope, "function bar");
        assert_eq!(chunks[1].start_line, 4);
    }

    #[test]
    fn unknown_language_falls_back_to_windows() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let content = lines.join("\n");
        let cfg = ChunkConfig {
            max_lines: 4,
            overlap_lines: 1,
            ..ChunkConfig::default()
        };
        let chunks = chunk_code(&content, "a.unknown", Language::Unknown, &cfg);
        assert!(chunks.len() > 1);
        // Stride 3 over 10 lines -> windows [0,4) [3,7) [6,10) [9,10)
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 4);
    }

    #[test]
    fn large_scope_sub_split_with_overlap() {
        let mut body = String::new();
        for i in 0..300 {
            body.push_str(&format!("    x{i} = 1\n"));
        }
        let content = format!("def big():\n{body}");
        let chunks = chunk_code(&content, "a.py", Language::Python, &ChunkConfig::default());
        assert!(chunks.len() >= 2);
        // Windows overlap: second chunk starts before first chunk ends.
        assert!(chunks[1].start_line <= chunks[0].end_line);
    }

    #[test]
    fn byte_identical_file_yields_stable_chunk_ids() {
        let content = "def foo():\n    return 1\n";
        let c1 = chunk_code(content, "a.py", Language::Python, &ChunkConfig::default());
        let c2 = chunk_code(content, "a.py", Language::Python, &ChunkConfig::default());
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.chunk_id(), b.chunk_id());
        }
    }
}
