// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance startup guard.
//!
//! A `hopperd.lock` file holding an advisory `flock` prevents two daemons
//! from racing to bind the same socket (spec.md §3 Non-goals: "a single
//! socket rendezvous per user"). Adapted from the teacher's `fs2`-based
//! advisory lock pattern rather than invented from scratch.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("io error acquiring daemon lock: {0}")]
    Io(#[from] std::io::Error),
    #[error("another hopperd instance already holds the lock at {0}")]
    AlreadyRunning(std::path::PathBuf),
}

/// An acquired exclusive lock. Released (unlocked, file left in place) on drop.
pub struct DaemonLock {
    file: File,
}

impl DaemonLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.try_lock_exclusive()
            .map_err(|_| LockError::AlreadyRunning(path.to_path_buf()))?;
        Ok(Self { file })
    }
}

impl Drop for DaemonLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
