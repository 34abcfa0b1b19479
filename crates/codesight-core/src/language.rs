use serde::{Deserialize, Serialize};

/// Every language/doc-type tag the chunker can stamp onto a `Chunk`.
///
/// Values round-trip to the lowercase strings named in the spec
/// (`"python"`, `"rust"`, `"pdf"`, `"unknown"`, ...) at the serde boundary,
/// so the rest of the system can keep treating `language` as a string
/// wherever that's more convenient (FTS rows, CLI output) while internal
/// code gets exhaustiveness checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
    Ruby,
    Php,
    C,
    Cpp,
    #[serde(rename = "text")]
    PlainText,
    Pdf,
    Docx,
    Pptx,
    Unknown,
}

/// Extensions chunked by scope-aware code boundary regexes.
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "tsx", "jsx", "go", "rs", "java", "kt", "scala", "c", "cpp", "h", "hpp",
    "cs", "rb", "php", "swift", "m", "sql", "sh", "bash", "zsh", "yaml", "yml", "toml", "json",
    "html", "css", "scss", "tf", "hcl", "proto", "graphql", "lua", "r", "jl", "ex", "exs", "erl",
    "zig", "nim", "v", "dockerfile",
];

/// Extensions read as plain UTF-8 and chunked by overlapping windows (no boundary pattern).
pub const TEXT_EXTENSIONS: &[&str] = &["md", "txt", "rst", "csv", "log"];

/// Extensions routed through a document extractor (PDF/DOCX/PPTX).
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx"];

impl Language {
    /// Map a lowercased file extension (no leading dot) to a language/doc-type tag.
    ///
    /// Extensions outside the code/text/document sets the walker would have
    /// already filtered out return `Unknown` rather than `None` — every
    /// indexable file gets *some* language tag.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" => Self::Python,
            "js" | "jsx" | "mjs" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "java" | "kt" | "scala" | "cs" => Self::Java,
            "rb" | "rake" => Self::Ruby,
            "php" => Self::Php,
            "c" | "h" => Self::C,
            "cpp" | "hpp" | "cc" | "cxx" => Self::Cpp,
            "md" | "txt" | "rst" | "csv" | "log" => Self::PlainText,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            _ if CODE_EXTENSIONS.contains(&ext) => Self::Unknown,
            _ => Self::Unknown,
        }
    }

    /// Whether this tag has a boundary-pattern code chunker (see
    /// `codesight-parser`'s `_BOUNDARY_PATTERNS` equivalent). Languages
    /// without one fall back to overlapping-window chunking.
    pub fn has_boundary_pattern(self) -> bool {
        matches!(
            self,
            Self::Python
                | Self::JavaScript
                | Self::TypeScript
                | Self::Go
                | Self::Rust
                | Self::Java
                | Self::Ruby
                | Self::Php
                | Self::C
                | Self::Cpp
        )
    }

    pub fn is_document(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Pptx)
    }

    /// The string stamped onto `Chunk::language` and persisted in the FTS row.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str_tag(tag: &str) -> Self {
        match tag {
            "python" => Self::Python,
            "javascript" => Self::JavaScript,
            "typescript" => Self::TypeScript,
            "go" => Self::Go,
            "rust" => Self::Rust,
            "java" => Self::Java,
            "ruby" => Self::Ruby,
            "php" => Self::Php,
            "c" => Self::C,
            "cpp" => Self::Cpp,
            "text" => Self::PlainText,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("cs"), Language::Java);
        assert_eq!(Language::from_extension("pdf"), Language::Pdf);
        assert_eq!(Language::from_extension("md"), Language::PlainText);
        assert_eq!(Language::from_extension("zig"), Language::Unknown);
    }

    #[test]
    fn round_trip_str_tag() {
        for lang in [
            Language::Python,
            Language::Rust,
            Language::Pdf,
            Language::PlainText,
            Language::Unknown,
        ] {
            assert_eq!(Language::from_str_tag(lang.as_str()), lang);
        }
    }

    #[test]
    fn boundary_pattern_coverage() {
        assert!(Language::Python.has_boundary_pattern());
        assert!(Language::Rust.has_boundary_pattern());
        assert!(!Language::PlainText.has_boundary_pattern());
        assert!(!Language::Pdf.has_boundary_pattern());
    }
}
