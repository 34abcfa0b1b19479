use std::sync::OnceLock;

use regex::Regex;

use codesight_core::Language;

/// Regex matching the *start* of a line that begins a new top-level scope,
/// per language. Tested against one line at a time (never built with the
/// multi-line flag) so the same pattern works whether the chunker is
/// scanning a `Vec<&str>` of lines or a single candidate line in isolation.
fn boundary_regex(language: Language) -> Option<&'static Regex> {
    static PYTHON: OnceLock<Regex> = OnceLock::new();
    static JAVASCRIPT: OnceLock<Regex> = OnceLock::new();
    static TYPESCRIPT: OnceLock<Regex> = OnceLock::new();
    static GO: OnceLock<Regex> = OnceLock::new();
    static RUST: OnceLock<Regex> = OnceLock::new();
    static JAVA: OnceLock<Regex> = OnceLock::new();
    static RUBY: OnceLock<Regex> = OnceLock::new();
    static PHP: OnceLock<Regex> = OnceLock::new();
    static C: OnceLock<Regex> = OnceLock::new();
    static CPP: OnceLock<Regex> = OnceLock::new();

    match language {
        Language::Python => Some(PYTHON.get_or_init(|| Regex::new(r"^(class |def |async def )").unwrap())),
        Language::JavaScript => Some(JAVASCRIPT.get_or_init(|| {
            Regex::new(r"^(export\s+)?(function |class |const \w+ = |let \w+ = |var \w+ = )").unwrap()
        })),
        Language::TypeScript => Some(TYPESCRIPT.get_or_init(|| {
            Regex::new(r"^(export\s+)?(function |class |const \w+ = |let \w+ = |interface |type |enum )")
                .unwrap()
        })),
        Language::Go => Some(GO.get_or_init(|| Regex::new(r"^(func |type )").unwrap())),
        Language::Rust => {
            Some(RUST.get_or_init(|| Regex::new(r"^(pub\s+)?(fn |struct |enum |impl |trait |mod )").unwrap()))
        }
        Language::Java => Some(JAVA.get_or_init(|| {
            Regex::new(r"^(public |private |protected )?(static )?(class |interface |enum |void |int |String )")
                .unwrap()
        })),
        Language::Ruby => Some(RUBY.get_or_init(|| Regex::new(r"^(class |module |def )").unwrap())),
        Language::Php => {
            Some(PHP.get_or_init(|| Regex::new(r"^(class |function |public |private |protected )").unwrap()))
        }
        Language::C => Some(C.get_or_init(|| Regex::new(r"^(\w+\s+\*?\w+\s*\()").unwrap())),
        Language::Cpp => Some(CPP.get_or_init(|| {
            Regex::new(r"^(class |struct |namespace |template |(\w+\s+\*?\w+\s*\())").unwrap()
        })),
        _ => None,
    }
}

/// Whether `line` begins a new top-level scope for `language`.
pub fn is_boundary_line(language: Language, line: &str) -> bool {
    boundary_regex(language).map(|re| re.is_match(line)).unwrap_or(false)
}

/// Extract a human-readable scope label from the first non-blank line of a
/// chunk segment. Falls back to the first whitespace-delimited token, or
/// `"module-level"` for a blank segment.
pub fn detect_scope(first_line: &str, language: Language) -> String {
    let first_line = first_line.trim();
    if first_line.is_empty() {
        return "module-level".to_string();
    }

    static PY_DEF: OnceLock<Regex> = OnceLock::new();
    static PY_CLASS: OnceLock<Regex> = OnceLock::new();
    static JS_FN: OnceLock<Regex> = OnceLock::new();
    static JS_CLASS: OnceLock<Regex> = OnceLock::new();
    static JS_CONST: OnceLock<Regex> = OnceLock::new();
    static GO_FN: OnceLock<Regex> = OnceLock::new();
    static GO_TYPE: OnceLock<Regex> = OnceLock::new();
    static RUST_FN: OnceLock<Regex> = OnceLock::new();
    static RUST_STRUCT: OnceLock<Regex> = OnceLock::new();
    static RUST_IMPL: OnceLock<Regex> = OnceLock::new();

    if language == Language::Python {
        let re = PY_DEF.get_or_init(|| Regex::new(r"^(async\s+)?def\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("function {}", &c[2]);
        }
        let re = PY_CLASS.get_or_init(|| Regex::new(r"^class\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("class {}", &c[1]);
        }
    }

    if matches!(language, Language::JavaScript | Language::TypeScript) {
        let re = JS_FN.get_or_init(|| Regex::new(r"^(?:export\s+)?function\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("function {}", &c[1]);
        }
        let re = JS_CLASS.get_or_init(|| Regex::new(r"^(?:export\s+)?class\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("class {}", &c[1]);
        }
        let re = JS_CONST.get_or_init(|| Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("const {}", &c[1]);
        }
    }

    if language == Language::Go {
        let re = GO_FN.get_or_init(|| Regex::new(r"^func\s+(?:\(\w+\s+\*?\w+\)\s+)?(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("function {}", &c[1]);
        }
        let re = GO_TYPE.get_or_init(|| Regex::new(r"^type\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("type {}", &c[1]);
        }
    }

    if language == Language::Rust {
        let re = RUST_FN.get_or_init(|| Regex::new(r"^(?:pub\s+)?fn\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("function {}", &c[1]);
        }
        let re = RUST_STRUCT.get_or_init(|| Regex::new(r"^(?:pub\s+)?struct\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("struct {}", &c[1]);
        }
        let re = RUST_IMPL.get_or_init(|| Regex::new(r"^(?:pub\s+)?impl\s+(\w+)").unwrap());
        if let Some(c) = re.captures(first_line) {
            return format!("impl {}", &c[1]);
        }
    }

    first_line
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_boundaries() {
        assert!(is_boundary_line(Language::Python, "def foo():"));
        assert!(is_boundary_line(Language::Python, "class Foo:"));
        assert!(is_boundary_line(Language::Python, "async def foo():"));
        assert!(!is_boundary_line(Language::Python, "    return 1"));
    }

    #[test]
    fn rust_boundaries() {
        assert!(is_boundary_line(Language::Rust, "pub fn foo() {"));
        assert!(is_boundary_line(Language::Rust, "struct Foo {"));
        assert!(is_boundary_line(Language::Rust, "impl Foo {"));
        assert!(!is_boundary_line(Language::Rust, "    let x = 1;"));
    }

    #[test]
    fn scope_detection() {
        assert_eq!(detect_scope("def foo():", Language::Python), "function foo");
        assert_eq!(detect_scope("class Bar:", Language::Python), "class Bar");
        assert_eq!(detect_scope("pub fn foo() {", Language::Rust), "function foo");
        assert_eq!(detect_scope("struct Foo {", Language::Rust), "struct Foo");
        assert_eq!(detect_scope("impl Foo {", Language::Rust), "impl Foo");
        assert_eq!(detect_scope("", Language::Rust), "module-level");
        assert_eq!(detect_scope("XYZ = 1", Language::Unknown), "XYZ");
    }
}
