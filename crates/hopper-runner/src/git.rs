// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree plumbing for the refine/ship stages: add/remove a
//! worktree, check for a dirty tree, read the current branch, capture a
//! diff numstat against `main`/`master`.

use std::path::Path;

use tokio::process::Command;

/// Create a worktree at `worktree_path` on a new `branch_name`, rooted in
/// `repo_dir`. `false` on any git failure (missing binary, existing
/// branch, ...).
pub async fn create_worktree(repo_dir: &Path, worktree_path: &Path, branch_name: &str) -> bool {
    let output = Command::new("git")
        .args(["worktree", "add"])
        .arg(worktree_path)
        .args(["-b", branch_name])
        .current_dir(repo_dir)
        .output()
        .await;
    match output {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Remove a worktree. Best-effort; a failure here does not block ship.
pub async fn remove_worktree(repo_dir: &Path, worktree_path: &Path) -> bool {
    let output = Command::new("git")
        .args(["worktree", "remove"])
        .arg(worktree_path)
        .current_dir(repo_dir)
        .output()
        .await;
    matches!(output, Ok(o) if o.status.success())
}

/// `true` if the repo has uncommitted changes, or if the check itself
/// failed — dirty is the conservative default.
pub async fn is_dirty(repo_dir: &Path) -> bool {
    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(repo_dir)
        .output()
        .await;
    match output {
        Ok(output) if output.status.success() => {
            !String::from_utf8_lossy(&output.stdout).trim().is_empty()
        }
        _ => true,
    }
}

/// The repo's current branch, or `None` for detached HEAD or on error.
pub async fn current_branch(repo_dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if branch == "HEAD" || branch.is_empty() {
        None
    } else {
        Some(branch)
    }
}

/// `git diff --numstat` against `main`, falling back to `master`. Empty
/// string if neither base exists or git is unavailable.
pub async fn diff_numstat(worktree_path: &Path) -> String {
    for base in ["main", "master"] {
        let output = Command::new("git")
            .args(["diff", "--numstat", base])
            .current_dir(worktree_path)
            .output()
            .await;
        if let Ok(output) = output {
            if output.status.success() {
                return String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
        }
    }
    String::new()
}
