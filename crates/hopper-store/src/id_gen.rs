// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collision-checked id allocation.
//!
//! `hopper-core::id` only knows how to draw one candidate; this module
//! owns the retry-and-check loop because only the store knows the full
//! universe of ids in play (active list, archived file, on-disk lode
//! directories).

use std::collections::HashSet;
use std::path::Path;

use hopper_core::id::IdGen;
use thiserror::Error;

use crate::paths;

/// spec.md §4.1: "Give up after 100 attempts (signals catastrophic
/// randomness failure)."
pub const MAX_ATTEMPTS: usize = 100;

#[derive(Debug, Error)]
#[error("failed to generate a unique id after {MAX_ATTEMPTS} attempts")]
pub struct IdGenExhausted;

/// Draw a fresh, collision-free lode id.
///
/// Checks the candidate against `active_ids`, the archived-lode id file,
/// and the existing subdirectories of `home/lodes/`.
pub fn generate_lode_id(
    gen: &dyn IdGen,
    home: &Path,
    active_ids: &HashSet<String>,
) -> Result<String, IdGenExhausted> {
    let archived_ids = load_archived_ids(home);
    let dir_names = load_lode_dir_names(home);

    for _ in 0..MAX_ATTEMPTS {
        let candidate = gen.next_candidate();
        if !active_ids.contains(&candidate)
            && !archived_ids.contains(&candidate)
            && !dir_names.contains(&candidate)
        {
            return Ok(candidate);
        }
    }
    Err(IdGenExhausted)
}

/// Draw a fresh, collision-free backlog item id (checked only against the
/// in-memory backlog list — backlog ids don't share a namespace with lode
/// directories).
pub fn generate_backlog_id(
    gen: &dyn IdGen,
    existing_ids: &HashSet<String>,
) -> Result<String, IdGenExhausted> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = gen.next_candidate();
        if !existing_ids.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(IdGenExhausted)
}

fn load_archived_ids(home: &Path) -> HashSet<String> {
    #[derive(serde::Deserialize)]
    struct IdOnly {
        id: String,
    }
    crate::jsonl::load_all::<IdOnly>(&paths::archived_jsonl(home))
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.id)
        .collect()
}

fn load_lode_dir_names(home: &Path) -> HashSet<String> {
    let dir = paths::lodes_dir(home);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return HashSet::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
