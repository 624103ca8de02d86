// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire message family.
//!
//! Every message is one JSON object, tagged by `type`, optionally carrying
//! a client timestamp `ts` (milliseconds since epoch). Unknown fields are
//! ignored on decode (`serde`'s default behavior) and missing optional
//! fields fall back to their defaults — this is how the dynamic,
//! free-form dicts the source passes over the wire are represented as a
//! concrete, exhaustively-matched Rust type without losing
//! forward-compatibility with a field neither side currently sends.

use hopper_core::{BacklogId, BacklogItem, Lode, LodeId, Stage};
use serde::{Deserialize, Serialize};

/// Messages a client (runner, CLI, TUI) sends to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Read-only handshake. Does not claim ownership.
    #[serde(rename = "connect")]
    Connect {
        #[serde(default)]
        lode_id: Option<LodeId>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "ping")]
    Ping {
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_list")]
    LodeList {
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "archived_list")]
    ArchivedList {
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_list")]
    BacklogList {
        #[serde(default)]
        ts: Option<i64>,
    },

    /// Claim ownership of `lode_id` on this connection.
    #[serde(rename = "lode_register")]
    LodeRegister {
        lode_id: LodeId,
        #[serde(default)]
        tmux_pane: Option<String>,
        #[serde(default)]
        pid: Option<u32>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_create")]
    LodeCreate {
        #[serde(default)]
        project: String,
        #[serde(default)]
        scope: String,
        #[serde(default = "default_true")]
        spawn: bool,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_stage")]
    LodeSetStage {
        lode_id: LodeId,
        stage: Stage,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_state")]
    LodeSetState {
        lode_id: LodeId,
        state: String,
        #[serde(default)]
        status: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_status")]
    LodeSetStatus {
        lode_id: LodeId,
        #[serde(default)]
        status: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_title")]
    LodeSetTitle {
        lode_id: LodeId,
        #[serde(default)]
        title: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_branch")]
    LodeSetBranch {
        lode_id: LodeId,
        #[serde(default)]
        branch: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_auto")]
    LodeSetAuto {
        lode_id: LodeId,
        #[serde(default)]
        auto: bool,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_codex_thread")]
    LodeSetCodexThread {
        lode_id: LodeId,
        codex_thread_id: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_set_claude_started")]
    LodeSetClaudeStarted {
        lode_id: LodeId,
        claude_stage: Stage,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_reset_claude_stage")]
    LodeResetClaudeStage {
        lode_id: LodeId,
        claude_stage: Stage,
        #[serde(default)]
        ts: Option<i64>,
    },

    /// Revert a `ship`-stage lode back to `refine` (spec.md §9 Open Question:
    /// resolved as its own message rather than overloading `lode_set_stage`,
    /// since it also resets state/status).
    #[serde(rename = "lode_resume_refine")]
    LodeResumeRefine {
        lode_id: LodeId,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_archive")]
    LodeArchive {
        lode_id: LodeId,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_promote_backlog")]
    LodePromoteBacklog {
        item_id: String,
        #[serde(default)]
        scope: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_add")]
    BacklogAdd {
        project: String,
        description: String,
        #[serde(default)]
        lode_id: Option<LodeId>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_remove")]
    BacklogRemove {
        item_id: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_update")]
    BacklogUpdate {
        item_id: String,
        description: String,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_set_queued")]
    BacklogSetQueued {
        item_id: String,
        #[serde(default)]
        queued: Option<LodeId>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "projects_reload")]
    ProjectsReload {
        #[serde(default)]
        ts: Option<i64>,
    },
}

fn default_true() -> bool {
    true
}

impl ClientMessage {
    /// The `type` discriminant, for logging (`Serialize` would require a
    /// full round-trip just to read the tag back out).
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientMessage::Connect { .. } => "connect",
            ClientMessage::Ping { .. } => "ping",
            ClientMessage::LodeList { .. } => "lode_list",
            ClientMessage::ArchivedList { .. } => "archived_list",
            ClientMessage::BacklogList { .. } => "backlog_list",
            ClientMessage::LodeRegister { .. } => "lode_register",
            ClientMessage::LodeCreate { .. } => "lode_create",
            ClientMessage::LodeSetStage { .. } => "lode_set_stage",
            ClientMessage::LodeSetState { .. } => "lode_set_state",
            ClientMessage::LodeSetStatus { .. } => "lode_set_status",
            ClientMessage::LodeSetTitle { .. } => "lode_set_title",
            ClientMessage::LodeSetBranch { .. } => "lode_set_branch",
            ClientMessage::LodeSetAuto { .. } => "lode_set_auto",
            ClientMessage::LodeSetCodexThread { .. } => "lode_set_codex_thread",
            ClientMessage::LodeSetClaudeStarted { .. } => "lode_set_claude_started",
            ClientMessage::LodeResetClaudeStage { .. } => "lode_reset_claude_stage",
            ClientMessage::LodeResumeRefine { .. } => "lode_resume_refine",
            ClientMessage::LodeArchive { .. } => "lode_archive",
            ClientMessage::LodePromoteBacklog { .. } => "lode_promote_backlog",
            ClientMessage::BacklogAdd { .. } => "backlog_add",
            ClientMessage::BacklogRemove { .. } => "backlog_remove",
            ClientMessage::BacklogUpdate { .. } => "backlog_update",
            ClientMessage::BacklogSetQueued { .. } => "backlog_set_queued",
            ClientMessage::ProjectsReload { .. } => "projects_reload",
        }
    }
}

/// Messages the daemon sends: direct request/response replies and
/// broadcasts fanned out to every connected client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected {
        tmux: Option<TmuxLocation>,
        #[serde(default)]
        lode: Option<Lode>,
        #[serde(default)]
        lode_found: Option<bool>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "pong")]
    Pong {
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_list")]
    LodeList {
        lodes: Vec<Lode>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "archived_list")]
    ArchivedList {
        lodes: Vec<Lode>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_list")]
    BacklogList {
        items: Vec<BacklogItem>,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_created")]
    LodeCreated {
        lode: Lode,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_updated")]
    LodeUpdated {
        lode: Lode,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_archived")]
    LodeArchived {
        lode: Lode,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "lode_promoted")]
    LodePromoted {
        lode: Lode,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_added")]
    BacklogAdded {
        item: BacklogItem,
        #[serde(default)]
        ts: Option<i64>,
    },

    #[serde(rename = "backlog_removed")]
    BacklogRemoved {
        item: BacklogItem,
        #[serde(default)]
        ts: Option<i64>,
    },

    /// Sent to every client just before the daemon tears down its
    /// listener on a graceful stop.
    #[serde(rename = "shutdown")]
    Shutdown {
        #[serde(default)]
        ts: Option<i64>,
    },
}

impl ServerMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::LodeList { .. } => "lode_list",
            ServerMessage::ArchivedList { .. } => "archived_list",
            ServerMessage::BacklogList { .. } => "backlog_list",
            ServerMessage::LodeCreated { .. } => "lode_created",
            ServerMessage::LodeUpdated { .. } => "lode_updated",
            ServerMessage::LodeArchived { .. } => "lode_archived",
            ServerMessage::LodePromoted { .. } => "lode_promoted",
            ServerMessage::BacklogAdded { .. } => "backlog_added",
            ServerMessage::BacklogRemoved { .. } => "backlog_removed",
            ServerMessage::Shutdown { .. } => "shutdown",
        }
    }

    /// Stamp `ts` with `now_ms` if the sender didn't set one, matching the
    /// source's "server messages add `ts` if absent" rule.
    pub fn with_ts_or(mut self, now_ms: i64) -> Self {
        let ts_slot = match &mut self {
            ServerMessage::Connected { ts, .. }
            | ServerMessage::Pong { ts, .. }
            | ServerMessage::LodeList { ts, .. }
            | ServerMessage::ArchivedList { ts, .. }
            | ServerMessage::BacklogList { ts, .. }
            | ServerMessage::LodeCreated { ts, .. }
            | ServerMessage::LodeUpdated { ts, .. }
            | ServerMessage::LodeArchived { ts, .. }
            | ServerMessage::LodePromoted { ts, .. }
            | ServerMessage::BacklogAdded { ts, .. }
            | ServerMessage::BacklogRemoved { ts, .. }
            | ServerMessage::Shutdown { ts, .. } => ts,
        };
        if ts_slot.is_none() {
            *ts_slot = Some(now_ms);
        }
        self
    }

    /// True for messages that represent a state-machine-meaningful change
    /// to a lode (used by the runner's done-signal watcher).
    pub fn lode_reached_completed(&self, lode_id: &LodeId) -> bool {
        matches!(self, ServerMessage::LodeUpdated { lode, .. } if &lode.id == lode_id && lode.state.as_str() == "completed")
    }
}

/// Server's tmux session/pane location, echoed back on `connect`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmuxLocation {
    pub session: String,
    pub pane: String,
}

pub use hopper_core::StateLabel;
