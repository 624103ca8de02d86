// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout under `HOPPER_HOME` (spec.md §6).

use std::path::{Path, PathBuf};

/// The per-user hopper data directory: `$HOPPER_HOME` if set, else the
/// platform data directory's `hopper` subdirectory.
pub fn home_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("HOPPER_HOME") {
        return PathBuf::from(explicit);
    }
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hopper")
}

pub fn socket_path(home: &Path) -> PathBuf {
    home.join("server.sock")
}

pub fn active_jsonl(home: &Path) -> PathBuf {
    home.join("active.jsonl")
}

pub fn archived_jsonl(home: &Path) -> PathBuf {
    home.join("archived.jsonl")
}

pub fn backlog_jsonl(home: &Path) -> PathBuf {
    home.join("backlog.jsonl")
}

pub fn config_json(home: &Path) -> PathBuf {
    home.join("config.json")
}

pub fn activity_log(home: &Path) -> PathBuf {
    home.join("activity.log")
}

pub fn processing_log(home: &Path) -> PathBuf {
    home.join("processing.log")
}

pub fn daemon_lock(home: &Path) -> PathBuf {
    home.join("hopperd.lock")
}

pub fn lodes_dir(home: &Path) -> PathBuf {
    home.join("lodes")
}

pub fn lode_dir(home: &Path, lode_id: &str) -> PathBuf {
    lodes_dir(home).join(lode_id)
}

pub fn lode_worktree(home: &Path, lode_id: &str) -> PathBuf {
    lode_dir(home, lode_id).join("worktree")
}

pub fn lode_stage_in(home: &Path, lode_id: &str, stage: &str) -> PathBuf {
    lode_dir(home, lode_id).join(format!("{stage}_in.md"))
}

pub fn lode_stage_out(home: &Path, lode_id: &str, stage: &str) -> PathBuf {
    lode_dir(home, lode_id).join(format!("{stage}_out.md"))
}

pub fn lode_diff_txt(home: &Path, lode_id: &str) -> PathBuf {
    lode_dir(home, lode_id).join("diff.txt")
}
