use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Current HEAD commit hash, or `None` if `repo_path` isn't a git repository
/// (or the `git` binary isn't on `PATH`, or the command times out).
///
/// Purely advisory metadata — stored in `repo_meta` for display, never used
/// to decide what to re-index.
pub fn current_commit(repo_path: &Path) -> Option<String> {
    let output = run_with_timeout(repo_path, &["rev-parse", "HEAD"], Duration::from_secs(10))?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if commit.is_empty() {
        None
    } else {
        Some(commit)
    }
}

fn run_with_timeout(repo_path: &Path, args: &[&str], timeout: Duration) -> Option<std::process::Output> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .ok()?;

    let start = std::time::Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return child.wait_with_output().ok(),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_git_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(current_commit(dir.path()), None);
    }
}
