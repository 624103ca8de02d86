// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Title-to-branch-name slugification.

/// Convert a title to a git-branch-safe slug: lowercase, alphanumeric and
/// hyphens only, no leading/trailing or consecutive hyphens, truncated to
/// 40 characters, and never ending in `-lock` (git refuses `<branch>.lock`
/// collisions with its own lockfile naming).
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_was_sep = false;
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            collapsed.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            collapsed.push('-');
            last_was_sep = true;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    let truncated: String = trimmed.chars().take(40).collect();
    let truncated = truncated.trim_end_matches('-');

    truncated.strip_suffix("-lock").unwrap_or(truncated).to_string()
}
