// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Makefile-driven bootstrap for the refine worktree: if a `Makefile` is
//! present and `.venv/` isn't yet, run `make install`, then expose
//! `.venv/bin` and `node_modules/.bin` on `PATH` for every subprocess run
//! in that worktree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::process::Command;

pub fn has_makefile(worktree_path: &Path) -> bool {
    worktree_path.join("Makefile").is_file()
}

fn venv_dir(worktree_path: &Path) -> PathBuf {
    worktree_path.join(".venv")
}

/// Run `make install` in the worktree. `false` on a missing `make`
/// binary or a nonzero exit.
pub async fn run_make_install(worktree_path: &Path) -> bool {
    let output = Command::new("make")
        .arg("install")
        .current_dir(worktree_path)
        .output()
        .await;
    match output {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Ensures `.venv/` exists for a worktree with a Makefile, running
/// `make install` exactly once (idempotent: a no-op if `.venv/` is
/// already there). Returns `false` only when `make install` had to run
/// and failed.
pub async fn ensure_installed(worktree_path: &Path) -> bool {
    if !has_makefile(worktree_path) {
        return true;
    }
    if venv_dir(worktree_path).is_dir() {
        return true;
    }
    run_make_install(worktree_path).await
}

/// Build a subprocess environment with `.venv/bin` and
/// `node_modules/.bin` (when present) prepended to `PATH`, and
/// `VIRTUAL_ENV` set to the venv path. Venv bin goes first so a project
/// venv's interpreter always wins over a node shim of the same name.
pub fn activation_env(worktree_path: &Path) -> Vec<(String, String)> {
    let mut extra_path_entries = Vec::new();
    let venv_bin = venv_dir(worktree_path).join("bin");
    let venv_path = venv_dir(worktree_path);
    let has_venv = venv_bin.is_dir();
    if has_venv {
        extra_path_entries.push(venv_bin.display().to_string());
    }
    let node_bin = worktree_path.join("node_modules").join(".bin");
    if node_bin.is_dir() {
        extra_path_entries.push(node_bin.display().to_string());
    }

    if extra_path_entries.is_empty() {
        return Vec::new();
    }
    let mut env: HashMap<String, String> = HashMap::new();

    let current_path = std::env::var("PATH").unwrap_or_default();
    let mut new_path = extra_path_entries.join(":");
    if !current_path.is_empty() {
        new_path.push(':');
        new_path.push_str(&current_path);
    }
    env.insert("PATH".to_string(), new_path);
    if has_venv {
        env.insert("VIRTUAL_ENV".to_string(), venv_path.display().to_string());
    }
    env.into_iter().collect()
}
