use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use codesight_core::{CODE_EXTENSIONS, DOCUMENT_EXTENSIONS, TEXT_EXTENSIONS};

/// Directories never descended into, regardless of `.gitignore`.
pub const ALWAYS_SKIP_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "dist",
    "build",
    ".eggs",
    ".next",
    ".nuxt",
    "vendor",
    "target",
    "Pods",
];

/// Files never indexed, regardless of extension (lockfiles).
pub const ALWAYS_SKIP_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Cargo.lock",
    "Gemfile.lock",
    "go.sum",
    "composer.lock",
];

/// Largest file size (bytes) the walker will hand to the router.
pub const MAX_FILE_SIZE_BYTES: u64 = 10_000_000;

/// Deterministic depth-first directory walk producing indexing candidates.
///
/// Single-threaded, stable-sorted on basenames within each directory so two
/// runs over an unchanged folder enumerate files in the same order.
/// Symlinked directories are not descended into.
pub fn walk_repo_files(repo_path: &Path) -> Vec<PathBuf> {
    let gitignore = load_root_gitignore(repo_path);
    let mut out = Vec::new();
    walk_dir(repo_path, repo_path, gitignore.as_ref(), &mut out);
    out
}

fn load_root_gitignore(repo_path: &Path) -> Option<Gitignore> {
    let path = repo_path.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(repo_path);
    builder.add(&path);
    builder.build().ok()
}

fn walk_dir(repo_root: &Path, dir: &Path, gitignore: Option<&Gitignore>, out: &mut Vec<PathBuf>) {
    let mut entries: Vec<fs::DirEntry> = match fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(Result::ok).collect(),
        Err(_) => return,
    };
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let meta = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };

        if meta.is_dir() {
            if meta.file_type().is_symlink() {
                continue;
            }
            if ALWAYS_SKIP_DIRS.contains(&name.as_ref()) || name.starts_with('.') {
                continue;
            }
            if let Some(gi) = gitignore {
                if gi.matched(&path, true).is_ignore() {
                    continue;
                }
            }
            walk_dir(repo_root, &path, gitignore, out);
            continue;
        }

        if !meta.is_file() {
            continue;
        }

        if name.starts_with('.') || ALWAYS_SKIP_FILES.contains(&name.as_ref()) {
            continue;
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !is_indexable_extension(&ext) {
            continue;
        }

        if let Some(gi) = gitignore {
            if gi.matched(&path, false).is_ignore() {
                continue;
            }
        }

        if meta.len() > MAX_FILE_SIZE_BYTES {
            continue;
        }

        out.push(path);
    }
}

fn is_indexable_extension(ext: &str) -> bool {
    CODE_EXTENSIONS.contains(&ext) || TEXT_EXTENSIONS.contains(&ext) || DOCUMENT_EXTENSIONS.contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[test]
    fn empty_dir_yields_no_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(walk_repo_files(tmp.path()).is_empty());
    }

    #[test]
    fn finds_code_and_skips_unknown_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("a.py"), "x = 1").unwrap();
        stdfs::write(tmp.path().join("b.bin"), [0u8, 1, 2]).unwrap();
        let files = walk_repo_files(tmp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.py"));
    }

    #[test]
    fn skips_blocklisted_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("app.py"), "x = 1").unwrap();
        let nm = tmp.path().join("node_modules");
        stdfs::create_dir_all(&nm).unwrap();
        stdfs::write(nm.join("index.js"), "module.exports = {}").unwrap();
        let files = walk_repo_files(tmp.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn skips_hidden_dirs_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("app.py"), "x = 1").unwrap();
        stdfs::write(tmp.path().join(".env.py"), "SECRET = 1").unwrap();
        let hidden = tmp.path().join(".secret");
        stdfs::create_dir_all(&hidden).unwrap();
        stdfs::write(hidden.join("key.py"), "KEY = 1").unwrap();
        let files = walk_repo_files(tmp.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn skips_lockfiles() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("app.py"), "x = 1").unwrap();
        stdfs::write(tmp.path().join("Cargo.lock"), "[[package]]").unwrap();
        let files = walk_repo_files(tmp.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn skips_oversized_files() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("small.py"), "x = 1").unwrap();
        let big_path = tmp.path().join("big.py");
        let f = stdfs::File::create(&big_path).unwrap();
        f.set_len(MAX_FILE_SIZE_BYTES + 1).unwrap();
        let files = walk_repo_files(tmp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("small.py"));
    }

    #[test]
    fn respects_root_gitignore() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join(".gitignore"), "ignored.py\nbuild_out/\n").unwrap();
        stdfs::write(tmp.path().join("app.py"), "x = 1").unwrap();
        stdfs::write(tmp.path().join("ignored.py"), "y = 1").unwrap();
        let out_dir = tmp.path().join("build_out");
        stdfs::create_dir_all(&out_dir).unwrap();
        stdfs::write(out_dir.join("gen.py"), "z = 1").unwrap();

        let files = walk_repo_files(tmp.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"app.py".to_string()));
        assert!(!names.contains(&"ignored.py".to_string()));
        assert!(!names.contains(&"gen.py".to_string()));
    }

    #[test]
    fn deterministic_ordering() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("zeta.py"), "z").unwrap();
        stdfs::write(tmp.path().join("alpha.py"), "a").unwrap();
        let first = walk_repo_files(tmp.path());
        let second = walk_repo_files(tmp.path());
        assert_eq!(first, second);
        assert!(first[0].ends_with("alpha.py"));
        assert!(first[1].ends_with("zeta.py"));
    }
}
