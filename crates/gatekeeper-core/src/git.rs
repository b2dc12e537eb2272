//! Best-effort git snapshot, populated when the host doesn't supply its own
//! repository adapter. Read-only: branch, dirty-file count, head commit.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Default)]
pub struct GitSnapshot {
    pub branch: Option<String>,
    pub dirty_files: Vec<String>,
    pub head_commit: Option<String>,
}

impl GitSnapshot {
    /// Shell out to `git` in `repo_dir`. Returns `None` when the directory
    /// isn't inside a git work tree; individual field failures are logged
    /// and leave that field `None`/empty rather than failing the whole call.
    pub fn capture(repo_dir: &Path) -> Option<GitSnapshot> {
        if !is_git_repo(repo_dir) {
            return None;
        }

        let branch = run_git(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|s| s.trim().to_string())
            .ok();

        let head_commit = run_git(repo_dir, &["rev-parse", "--short", "HEAD"])
            .map(|s| s.trim().to_string())
            .ok();

        let dirty_files = run_git(repo_dir, &["status", "--porcelain"])
            .map(|s| {
                s.lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| l[3.min(l.len())..].trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Some(GitSnapshot {
            branch,
            dirty_files,
            head_commit,
        })
    }
}

fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        tracing::warn!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        anyhow::bail!("git {} exited non-zero", args.join(" "));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_git_directory_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitSnapshot::capture(dir.path()).is_none());
    }

    #[test]
    fn test_git_repo_captures_branch_and_head() {
        let dir = tempfile::tempdir().unwrap();
        let run = |args: &[&str]| {
            Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
                .unwrap()
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "init"]);

        let snapshot = GitSnapshot::capture(dir.path()).expect("should be a git repo");
        assert!(snapshot.head_commit.is_some());
        assert!(snapshot.branch.is_some());
    }
}
