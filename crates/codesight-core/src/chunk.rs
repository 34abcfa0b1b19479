use sha2::{Digest, Sha256};

use crate::language::Language;

/// First 16 hex characters of `SHA-256(content)`.
///
/// A prefix is enough collision resistance for skip-detection within one
/// folder namespace, and keeps `chunk_id` strings short.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex = hex_encode(&digest);
    hex[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Build the stable primary key `"<file_path>:<start>-<end>:<hash16>"`.
///
/// Re-chunking byte-identical content yields the same id: it depends only
/// on the triple (path, line range, content hash), never on insertion order
/// or any other incidental state.
pub fn make_chunk_id(file_path: &str, start_line: u32, end_line: u32, hash16: &str) -> String {
    format!("{file_path}:{start_line}-{end_line}:{hash16}")
}

/// Build the three-line preamble prepended to a chunk's content before
/// embedding, grounding the vector in file/scope/line provenance.
pub fn make_context_header(file_path: &str, scope: &str, start_line: u32, end_line: u32) -> String {
    format!("# File: {file_path}\n# Scope: {scope}\n# Lines: {start_line}-{end_line}")
}

/// The atomic unit of the index: one vector row, one BM25 row, one primary key.
///
/// Chunks are value objects — every pipeline stage (chunker, differ,
/// embedder, store) passes them by value or by shared reference; only the
/// `DualStore` retains them past the end of an indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub scope: String,
    pub language: Language,
    pub content: String,
    pub content_hash: String,
    pub context_header: String,
}

impl Chunk {
    /// Construct a chunk, deriving `content_hash` and `context_header` from
    /// its other fields. Callers never set the hash or header by hand.
    pub fn new(
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        scope: impl Into<String>,
        language: Language,
        content: impl Into<String>,
    ) -> Self {
        let file_path = file_path.into();
        let scope = scope.into();
        let content = content.into();
        let hash = content_hash(&content);
        let context_header = make_context_header(&file_path, &scope, start_line, end_line);
        Self {
            file_path,
            start_line,
            end_line,
            scope,
            language,
            content,
            content_hash: hash,
            context_header,
        }
    }

    /// Stable primary key: `"<file_path>:<start>-<end>:<hash16>"`.
    pub fn chunk_id(&self) -> String {
        make_chunk_id(&self.file_path, self.start_line, self.end_line, &self.content_hash)
    }

    /// Text actually sent to the embedder: `context_header + "\n" + content`.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.context_header, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_16_hex_chars() {
        let h = content_hash("def foo(): pass");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_hash_deterministic_and_sensitive() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[test]
    fn chunk_id_format() {
        let c = Chunk::new("a/b.py", 1, 4, "function foo", Language::Python, "def foo():\n  pass");
        let id = c.chunk_id();
        assert!(id.starts_with("a/b.py:1-4:"));
        assert_eq!(id.len(), "a/b.py:1-4:".len() + 16);
    }

    #[test]
    fn byte_identical_content_yields_same_chunk_id() {
        let c1 = Chunk::new("a.py", 1, 2, "module-level", Language::Python, "x = 1");
        let c2 = Chunk::new("a.py", 1, 2, "module-level", Language::Python, "x = 1");
        assert_eq!(c1.chunk_id(), c2.chunk_id());
    }

    #[test]
    fn embedding_text_prepends_context_header() {
        let c = Chunk::new("a.py", 1, 1, "module-level", Language::Python, "x = 1");
        let text = c.embedding_text();
        assert!(text.starts_with("# File: a.py\n# Scope: module-level\n# Lines: 1-1\nx = 1"));
    }
}
