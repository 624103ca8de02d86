// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lode entity and its stage/state types.
//!
//! A lode is represented as a concrete record rather than a free-form
//! mapping: every field the wire protocol and the store can mutate is
//! named here. `state` stays string-shaped at the wire boundary (the
//! source treats it as free-form — a stage runner may park an opaque
//! sub-operation label there) but is modeled internally as [`StateLabel`]
//! so the lifecycle state machine can distinguish the handful of values it
//! actually acts on from display-only labels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backlog::BacklogItem;
use crate::id::LodeId;

/// One of the four pipeline stages. Ordered: `mill < refine < ship < shipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Mill,
    Refine,
    Ship,
    Shipped,
}

impl Stage {
    /// The stage that follows this one, or `None` for the terminal `shipped`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Mill => Some(Stage::Refine),
            Stage::Refine => Some(Stage::Ship),
            Stage::Ship => Some(Stage::Shipped),
            Stage::Shipped => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Mill => "mill",
            Stage::Refine => "refine",
            Stage::Ship => "ship",
            Stage::Shipped => "shipped",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recognized, state-machine-meaningful values of `state`. Anything else is
/// an opaque sub-operation label (e.g. the name of a running codex task)
/// carried verbatim and never interpreted by the lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLabel {
    New,
    Running,
    Stuck,
    Error,
    Ready,
    Completed,
    /// A free-form label, usually the name of the stage's current
    /// sub-operation (e.g. a codex task name) displayed to the user.
    Custom(String),
}

impl StateLabel {
    pub fn as_str(&self) -> &str {
        match self {
            StateLabel::New => "new",
            StateLabel::Running => "running",
            StateLabel::Stuck => "stuck",
            StateLabel::Error => "error",
            StateLabel::Ready => "ready",
            StateLabel::Completed => "completed",
            StateLabel::Custom(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, StateLabel::Custom(_))
    }
}

impl std::fmt::Display for StateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for StateLabel {
    fn from(s: &str) -> Self {
        match s {
            "new" => StateLabel::New,
            "running" => StateLabel::Running,
            "stuck" => StateLabel::Stuck,
            "error" => StateLabel::Error,
            "ready" => StateLabel::Ready,
            "completed" => StateLabel::Completed,
            other => StateLabel::Custom(other.to_string()),
        }
    }
}

impl From<String> for StateLabel {
    fn from(s: String) -> Self {
        StateLabel::from(s.as_str())
    }
}

impl Serialize for StateLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StateLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StateLabel::from(s))
    }
}

/// Per-stage agent session identity: a stable session id generated at lode
/// creation, and whether that stage's first run has already happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeStage {
    pub session_id: Uuid,
    #[serde(default)]
    pub started: bool,
}

impl ClaudeStage {
    pub fn fresh() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started: false,
        }
    }
}

/// The `mill`/`refine`/`ship` session-identity map carried on every lode.
/// Keyed by stage name rather than `Stage` directly so it serializes as the
/// plain `{"mill": ..., "refine": ..., "ship": ...}` object the wire format
/// and on-disk files use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeStageMap(HashMap<String, ClaudeStage>);

impl ClaudeStageMap {
    pub fn fresh() -> Self {
        let mut map = HashMap::new();
        for stage in ["mill", "refine", "ship"] {
            map.insert(stage.to_string(), ClaudeStage::fresh());
        }
        Self(map)
    }

    pub fn get(&self, stage: Stage) -> Option<&ClaudeStage> {
        self.0.get(stage.as_str())
    }

    pub fn get_mut(&mut self, stage: Stage) -> Option<&mut ClaudeStage> {
        self.0.get_mut(stage.as_str())
    }
}

/// One tracked unit of agent-driven work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lode {
    pub id: LodeId,
    pub stage: Stage,
    #[serde(default = "default_state")]
    pub state: StateLabel,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: String,
    pub project: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub branch: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tmux_pane: Option<String>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub codex_thread_id: Option<String>,
    #[serde(default)]
    pub auto: bool,
    #[serde(default)]
    pub backlog: Option<BacklogItem>,
    pub claude: ClaudeStageMap,
}

fn default_state() -> StateLabel {
    StateLabel::New
}

impl Lode {
    /// Branch name to use when no explicit override has been set.
    pub fn default_branch(&self) -> String {
        format!("hopper-{}", self.id.short(crate::id::ID_LEN))
    }

    /// The branch actually in effect: the explicit override if set, else
    /// the id-derived default.
    pub fn effective_branch(&self) -> String {
        if self.branch.is_empty() {
            self.default_branch()
        } else {
            self.branch.clone()
        }
    }

    /// Update `updated_at` to `now_ms`. Every mutator that changes an
    /// observable field must call this (invariant: `updated_at ≥ created_at`
    /// and non-decreasing across mutations).
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at);
    }

    pub fn is_terminal(&self) -> bool {
        self.stage == Stage::Shipped
    }

    /// True when `state` is exactly the done-status sentence for the
    /// lode's current stage, e.g. `"Mill complete"` while `stage == Mill`.
    pub fn status_matches_done(&self) -> bool {
        self.status == done_status_for(self.stage)
    }
}

/// The exact status sentence the runner emits on successful stage
/// completion, used both by the runner (to emit it) and the coordinator's
/// disconnect handler (to recognize it for auto-advance).
pub fn done_status_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Mill => "Mill complete",
        Stage::Refine => "Refine complete",
        Stage::Ship => "Ship complete",
        Stage::Shipped => "",
    }
}

#[cfg(test)]
#[path = "lode_tests.rs"]
mod tests;
