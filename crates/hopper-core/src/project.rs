// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered project directories, stored inside `config.json`.

use serde::{Deserialize, Serialize};

/// A registered project directory. `name` is the path's basename and is
/// the handle used everywhere else (lode.project, CLI `--project`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub path: String,
    pub name: String,
    /// True once removed but retained because a lode still references it.
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub last_used_at: i64,
}

impl Project {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            disabled: false,
            last_used_at: 0,
        }
    }
}
