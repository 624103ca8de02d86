// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store`: in-memory active/archived/backlog lists plus `config.json`,
//! backed by the atomic JSONL persistence in [`crate::jsonl`].
//!
//! `Store` itself holds no lock — the coordinator wraps one in a
//! `parking_lot::Mutex` and serializes every read-modify-write-persist
//! sequence through it (spec.md §4.3, §5). Every mutator here is a plain
//! synchronous function over in-memory state; only `load`/`save_*` touch
//! the filesystem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use hopper_core::id::IdGen;
use hopper_core::{BacklogId, BacklogItem, ClaudeStageMap, Lode, LodeId, Stage, StateLabel};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::id_gen::{generate_backlog_id, generate_lode_id, IdGenExhausted};
use crate::jsonl::{self, JsonlError};
use crate::paths;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    IdGenExhausted(#[from] IdGenExhausted),
    #[error("lode not found: {0}")]
    LodeNotFound(String),
    #[error("backlog item not found: {0}")]
    BacklogItemNotFound(String),
}

/// All durable hopper state, loaded into memory at startup and kept in
/// sync with disk on every mutation.
pub struct Store {
    pub home: PathBuf,
    pub active: Vec<Lode>,
    pub backlog: Vec<BacklogItem>,
    pub config: Config,
}

impl Store {
    /// Load `active.jsonl`, `backlog.jsonl`, and `config.json` from `home`.
    /// `archived.jsonl` is never held in memory wholesale (spec.md §4.1
    /// treats it as append-only); callers read it on demand via
    /// [`Store::load_archived`].
    pub fn load(home: &Path) -> Result<Self, StoreError> {
        let active = jsonl::load_all(&paths::active_jsonl(home))?;
        let backlog = jsonl::load_all(&paths::backlog_jsonl(home))?;
        let config = Config::load(home)?;
        Ok(Self {
            home: home.to_path_buf(),
            active,
            backlog,
            config,
        })
    }

    pub fn save_active(&self) -> Result<(), StoreError> {
        jsonl::save_all(&paths::active_jsonl(&self.home), &self.active)?;
        Ok(())
    }

    pub fn save_backlog(&self) -> Result<(), StoreError> {
        jsonl::save_all(&paths::backlog_jsonl(&self.home), &self.backlog)?;
        Ok(())
    }

    pub fn save_config(&self) -> Result<(), StoreError> {
        self.config.save(&self.home)?;
        Ok(())
    }

    pub fn load_archived(&self) -> Result<Vec<Lode>, StoreError> {
        Ok(jsonl::load_all(&paths::archived_jsonl(&self.home))?)
    }

    pub fn find(&self, id: &str) -> Option<&Lode> {
        self.active.iter().find(|lode| lode.id.as_str() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Lode> {
        self.active.iter_mut().find(|lode| lode.id.as_str() == id)
    }

    pub fn find_backlog(&self, id: &str) -> Option<&BacklogItem> {
        self.backlog.iter().find(|item| item.id.as_str() == id)
    }

    /// spec.md §4.1: startup reconciliation. Stale ownership (`active`,
    /// `tmux_pane`, `pid`) cannot survive a restart — no runner process
    /// from a previous daemon lifetime is still attached.
    pub fn reconcile_startup(&mut self) -> Result<(), StoreError> {
        let mut changed = false;
        for lode in &mut self.active {
            if lode.active || lode.tmux_pane.is_some() || lode.pid.is_some() {
                lode.active = false;
                lode.tmux_pane = None;
                lode.pid = None;
                changed = true;
            }
        }
        if changed {
            self.save_active()?;
        }
        Ok(())
    }

    /// Create a fresh lode (spec.md §3 Lifecycle). `branch` defaults to
    /// `hopper-<id>` until an explicit override is set later.
    pub fn create_lode(
        &mut self,
        id_gen: &dyn IdGen,
        now_ms: i64,
        project: String,
        scope: String,
        title: String,
        backlog_snapshot: Option<BacklogItem>,
    ) -> Result<&Lode, StoreError> {
        let active_ids: HashSet<String> =
            self.active.iter().map(|l| l.id.as_str().to_string()).collect();
        let id = generate_lode_id(id_gen, &self.home, &active_ids)?;
        let lode_id = LodeId::new(id.clone());

        let lode = Lode {
            id: lode_id,
            stage: Stage::Mill,
            state: StateLabel::New,
            status: String::new(),
            title,
            project,
            scope,
            branch: String::new(),
            created_at: now_ms,
            updated_at: now_ms,
            active: false,
            tmux_pane: None,
            pid: None,
            codex_thread_id: None,
            auto: false,
            backlog: backlog_snapshot,
            claude: ClaudeStageMap::fresh(),
        };

        std::fs::create_dir_all(paths::lode_dir(&self.home, &id)).map_err(|e| {
            StoreError::Jsonl(JsonlError::Io {
                path: paths::lode_dir(&self.home, &id),
                source: e,
            })
        })?;

        self.active.push(lode);
        let pos = self.active.len() - 1;
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// Register ownership (spec.md §4.3 `lode_register`): sets `active`,
    /// `tmux_pane`, `pid` and touches `updated_at`.
    pub fn register(
        &mut self,
        id: &str,
        tmux_pane: Option<String>,
        pid: Option<u32>,
        now_ms: i64,
    ) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.active = true;
        lode.tmux_pane = tmux_pane;
        lode.pid = pid;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// Clear ownership on disconnect (spec.md §4.3 disconnect handler).
    pub fn clear_ownership(&mut self, id: &str, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.active = false;
        lode.tmux_pane = None;
        lode.pid = None;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_stage(&mut self, id: &str, stage: Stage, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.stage = stage;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_state(
        &mut self,
        id: &str,
        state: StateLabel,
        status: Option<String>,
        now_ms: i64,
    ) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.state = state;
        if let Some(status) = status {
            lode.status = status;
        }
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_status(&mut self, id: &str, status: String, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.status = status;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_title(&mut self, id: &str, title: String, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.title = title;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_branch(&mut self, id: &str, branch: String, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.branch = branch;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    pub fn set_auto(&mut self, id: &str, auto: bool, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        lode.auto = auto;
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// spec.md invariant 8: `codex_thread_id` is immutable once set
    /// non-null. A second call for the same lode is a no-op (idempotent,
    /// per spec.md §8's round-trip laws) rather than an error.
    pub fn set_codex_thread(
        &mut self,
        id: &str,
        codex_thread_id: String,
        now_ms: i64,
    ) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        if lode.codex_thread_id.is_none() {
            lode.codex_thread_id = Some(codex_thread_id);
        }
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// spec.md §4.4: flips `started` true only after a stage's first run
    /// has exited with a non-missing-binary code.
    pub fn set_claude_started(
        &mut self,
        id: &str,
        stage: Stage,
        now_ms: i64,
    ) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        if let Some(entry) = lode.claude.get_mut(stage) {
            entry.started = true;
        }
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// spec.md §4.4 Reset: rotates the stage's session UUID and clears
    /// `started`. Only permitted while `active == false`.
    pub fn reset_claude_stage(
        &mut self,
        id: &str,
        stage: Stage,
        now_ms: i64,
    ) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        if lode.active {
            return Err(StoreError::LodeNotFound(format!(
                "{id} is active; cannot reset claude stage while owned"
            )));
        }
        if let Some(entry) = lode.claude.get_mut(stage) {
            *entry = hopper_core::lode::ClaudeStage::fresh();
        }
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// spec.md §9 Open Question, resolved per the spec's suggestion:
    /// set `stage=refine, state=running, status="Resuming refine"`.
    /// Only legal from `ship`, and only before the lode is shipped.
    pub fn resume_refine(&mut self, id: &str, now_ms: i64) -> Result<&Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = &mut self.active[pos];
        if lode.stage != Stage::Ship {
            return Err(StoreError::LodeNotFound(format!(
                "{id} is not in ship stage; cannot resume refine"
            )));
        }
        lode.stage = Stage::Refine;
        lode.state = StateLabel::Running;
        lode.status = "Resuming refine".to_string();
        lode.touch(now_ms);
        self.save_active()?;
        Ok(&self.active[pos])
    }

    /// Move a lode from active to archived (spec.md invariant 5: archive
    /// is append-only; the id remains reserved for collision checks).
    pub fn archive(&mut self, id: &str) -> Result<Lode, StoreError> {
        let pos = self
            .active
            .iter()
            .position(|lode| lode.id.as_str() == id)
            .ok_or_else(|| StoreError::LodeNotFound(id.to_string()))?;
        let lode = self.active.remove(pos);
        jsonl::append_one(&paths::archived_jsonl(&self.home), &lode)?;
        self.save_active()?;
        Ok(lode)
    }

    pub fn add_backlog_item(
        &mut self,
        id_gen: &dyn IdGen,
        now_ms: i64,
        project: String,
        description: String,
        lode_id: Option<LodeId>,
    ) -> Result<&BacklogItem, StoreError> {
        let existing_ids: HashSet<String> = self
            .backlog
            .iter()
            .map(|item| item.id.as_str().to_string())
            .collect();
        let id = generate_backlog_id(id_gen, &existing_ids)?;
        let item = BacklogItem {
            id: BacklogId::new(id),
            project,
            description,
            created_at: now_ms,
            lode_id,
            queued: None,
        };
        self.backlog.push(item);
        let pos = self.backlog.len() - 1;
        self.save_backlog()?;
        Ok(&self.backlog[pos])
    }

    pub fn remove_backlog_item(&mut self, id: &str) -> Result<BacklogItem, StoreError> {
        let pos = self
            .backlog
            .iter()
            .position(|item| item.id.as_str() == id)
            .ok_or_else(|| StoreError::BacklogItemNotFound(id.to_string()))?;
        let item = self.backlog.remove(pos);
        self.save_backlog()?;
        Ok(item)
    }

    pub fn update_backlog_item(
        &mut self,
        id: &str,
        description: String,
    ) -> Result<&BacklogItem, StoreError> {
        let pos = self
            .backlog
            .iter()
            .position(|item| item.id.as_str() == id)
            .ok_or_else(|| StoreError::BacklogItemNotFound(id.to_string()))?;
        self.backlog[pos].description = description;
        self.save_backlog()?;
        Ok(&self.backlog[pos])
    }

    pub fn set_backlog_queued(
        &mut self,
        id: &str,
        queued: Option<LodeId>,
    ) -> Result<&BacklogItem, StoreError> {
        let pos = self
            .backlog
            .iter()
            .position(|item| item.id.as_str() == id)
            .ok_or_else(|| StoreError::BacklogItemNotFound(id.to_string()))?;
        self.backlog[pos].queued = queued;
        self.save_backlog()?;
        Ok(&self.backlog[pos])
    }

    /// Create a lode from a backlog item (spec.md §4.3 `lode_promote_backlog`):
    /// embed the item snapshot into `backlog`, then remove the original item.
    pub fn promote_backlog(
        &mut self,
        id_gen: &dyn IdGen,
        now_ms: i64,
        item_id: &str,
        scope_override: Option<String>,
    ) -> Result<&Lode, StoreError> {
        let item = self
            .find_backlog(item_id)
            .cloned()
            .ok_or_else(|| StoreError::BacklogItemNotFound(item_id.to_string()))?;
        let scope = scope_override.unwrap_or_else(|| item.description.clone());
        let project = item.project.clone();
        let title = item.description.clone();
        self.create_lode(id_gen, now_ms, project, scope, title, Some(item))?;
        let pos = self.active.len() - 1;
        self.remove_backlog_item(item_id)?;
        Ok(&self.active[pos])
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
