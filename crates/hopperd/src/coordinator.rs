// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator: message dispatch, the authoritative in-memory state,
//! the ownership registry, and auto-advance (spec.md §4.3).
//!
//! Every handler acquires [`Coordinator::inner`]'s lock for the entire
//! read-modify-write-persist sequence, then releases it before any
//! broadcast is enqueued (spec.md: "Broadcasts are never emitted under
//! the lock").

use std::sync::Arc;

use hopper_core::{Clock, IdGen, Stage, StateLabel};
use hopper_protocol::{ClientMessage, ServerMessage, TmuxLocation};
use hopper_store::Store;
use parking_lot::Mutex;

use crate::activity_log::activity;
use crate::registry::{ConnId, Registry};
use crate::writer::{WriteJob, WriteTarget, WriterHandle};

/// Spawns the next (or same) stage's runner process in the background.
/// Implemented by `hopper-cli` (which knows how to exec the `hopper`
/// binary); a no-op `Noop` exists for unit tests.
pub trait RunnerSpawner: Send + Sync {
    fn spawn(&self, lode_id: &str, stage: Stage);
}

pub struct NoopSpawner;
impl RunnerSpawner for NoopSpawner {
    fn spawn(&self, _lode_id: &str, _stage: Stage) {}
}

struct Inner {
    store: Store,
    registry: Registry,
}

pub struct Coordinator {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    writer: WriterHandle,
    spawner: Arc<dyn RunnerSpawner>,
    tmux: Option<TmuxLocation>,
}

/// A direct reply plus whatever broadcast(s) the same handler produced,
/// and the set of connections that must now be force-disconnected
/// (spec.md invariant 1: registering evicts the prior owner).
pub struct Outcome {
    pub reply: Option<ServerMessage>,
    pub broadcasts: Vec<ServerMessage>,
    pub evict: Vec<ConnId>,
}

impl Outcome {
    fn reply_only(message: ServerMessage) -> Self {
        Self {
            reply: Some(message),
            broadcasts: Vec::new(),
            evict: Vec::new(),
        }
    }

    fn broadcast_only(message: ServerMessage) -> Self {
        Self {
            reply: None,
            broadcasts: vec![message],
            evict: Vec::new(),
        }
    }

    fn none() -> Self {
        Self {
            reply: None,
            broadcasts: Vec::new(),
            evict: Vec::new(),
        }
    }

    fn error(conn_err: impl Into<String>) -> Self {
        // Errors from a one-way mutation (unknown lode id, etc.) are
        // logged and otherwise swallowed, matching spec.md §7's "the
        // coordinator never crashes on a client-side bug".
        tracing::debug!(error = %conn_err.into(), "mutation rejected");
        Self::none()
    }
}

impl Coordinator {
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
        writer: WriterHandle,
        spawner: Arc<dyn RunnerSpawner>,
        tmux: Option<TmuxLocation>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store,
                registry: Registry::new(),
            }),
            clock,
            id_gen,
            writer,
            spawner,
            tmux,
        }
    }

    fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Flush the outcome's reply/broadcasts/evictions through the writer
    /// and listener. Call this *after* releasing the state lock.
    pub fn dispatch_outcome(&self, conn: ConnId, outcome: Outcome, clients: &crate::writer::Clients) {
        if let Some(reply) = outcome.reply {
            self.writer.send(WriteJob {
                target: WriteTarget::One(conn),
                message: reply.with_ts_or(self.now_ms()),
            });
        }
        for broadcast in outcome.broadcasts {
            self.writer.send(WriteJob {
                target: WriteTarget::All,
                message: broadcast.with_ts_or(self.now_ms()),
            });
        }
        for evicted_conn in outcome.evict {
            // Closing the socket is the listener's job (it owns the read
            // half); we only need to drop our write-half entry so the
            // writer stops addressing it.
            clients.lock().remove(&evicted_conn);
        }
    }

    /// Handle one client message. Returns the outcome to dispatch.
    pub fn handle(&self, conn: ConnId, msg: ClientMessage) -> Outcome {
        let now = self.now_ms();
        let mut guard = self.inner.lock();
        let Inner { store, registry } = &mut *guard;

        match msg {
            ClientMessage::Connect { lode_id, .. } => {
                let (lode, found) = match lode_id {
                    Some(id) => match store.find(id.as_str()) {
                        Some(lode) => (Some(lode.clone()), Some(true)),
                        None => (None, Some(false)),
                    },
                    None => (None, None),
                };
                Outcome::reply_only(ServerMessage::Connected {
                    tmux: self.tmux.clone(),
                    lode,
                    lode_found: found,
                    ts: None,
                })
            }

            ClientMessage::Ping { .. } => Outcome::reply_only(ServerMessage::Pong { ts: None }),

            ClientMessage::LodeList { .. } => Outcome::reply_only(ServerMessage::LodeList {
                lodes: store.active.clone(),
                ts: None,
            }),

            ClientMessage::ArchivedList { .. } => {
                let lodes = store.load_archived().unwrap_or_default();
                Outcome::reply_only(ServerMessage::ArchivedList { lodes, ts: None })
            }

            ClientMessage::BacklogList { .. } => Outcome::reply_only(ServerMessage::BacklogList {
                items: store.backlog.clone(),
                ts: None,
            }),

            ClientMessage::LodeRegister {
                lode_id,
                tmux_pane,
                pid,
                ..
            } => match store.register(lode_id.as_str(), tmux_pane, pid, now) {
                Ok(lode) => {
                    let previous_owner = registry.register(lode_id.as_str(), conn);
                    activity!(lode_id, change = "register", conn = conn);
                    let mut outcome = Outcome::broadcast_only(ServerMessage::LodeUpdated {
                        lode: lode.clone(),
                        ts: None,
                    });
                    outcome.evict = previous_owner.into_iter().collect();
                    outcome
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeCreate {
                project,
                scope,
                spawn,
                ..
            } => match store.create_lode(
                self.id_gen.as_ref(),
                now,
                project,
                scope,
                String::new(),
                None,
            ) {
                Ok(lode) => {
                    let lode = lode.clone();
                    activity!(lode.id, change = "create");
                    if spawn {
                        self.spawner.spawn(lode.id.as_str(), lode.stage);
                    }
                    Outcome {
                        reply: Some(ServerMessage::LodeCreated {
                            lode: lode.clone(),
                            ts: None,
                        }),
                        broadcasts: vec![ServerMessage::LodeCreated { lode, ts: None }],
                        evict: Vec::new(),
                    }
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeSetStage { lode_id, stage, .. } => {
                match store.set_stage(lode_id.as_str(), stage, now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "set_stage", stage = %stage);
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeSetState {
                lode_id,
                state,
                status,
                ..
            } => {
                let status = if status.is_empty() { None } else { Some(status) };
                match store.set_state(lode_id.as_str(), StateLabel::from(state), status, now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "set_state", state = %lode.state);
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeSetStatus {
                lode_id, status, ..
            } => match store.set_status(lode_id.as_str(), status, now) {
                Ok(lode) => {
                    activity!(lode_id, change = "set_status");
                    Outcome::broadcast_only(ServerMessage::LodeUpdated {
                        lode: lode.clone(),
                        ts: None,
                    })
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeSetTitle { lode_id, title, .. } => {
                match store.set_title(lode_id.as_str(), title, now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "set_title");
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeSetBranch { lode_id, branch, .. } => {
                match store.set_branch(lode_id.as_str(), branch, now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "set_branch");
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeSetAuto { lode_id, auto, .. } => {
                match store.set_auto(lode_id.as_str(), auto, now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "set_auto", auto = auto);
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeSetCodexThread {
                lode_id,
                codex_thread_id,
                ..
            } => match store.set_codex_thread(lode_id.as_str(), codex_thread_id, now) {
                Ok(lode) => {
                    activity!(lode_id, change = "set_codex_thread");
                    Outcome::broadcast_only(ServerMessage::LodeUpdated {
                        lode: lode.clone(),
                        ts: None,
                    })
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeSetClaudeStarted {
                lode_id,
                claude_stage,
                ..
            } => match store.set_claude_started(lode_id.as_str(), claude_stage, now) {
                Ok(lode) => {
                    activity!(lode_id, change = "set_claude_started", stage = %claude_stage);
                    Outcome::broadcast_only(ServerMessage::LodeUpdated {
                        lode: lode.clone(),
                        ts: None,
                    })
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeResetClaudeStage {
                lode_id,
                claude_stage,
                ..
            } => match store.reset_claude_stage(lode_id.as_str(), claude_stage, now) {
                Ok(lode) => {
                    activity!(lode_id, change = "reset_claude_stage", stage = %claude_stage);
                    Outcome::broadcast_only(ServerMessage::LodeUpdated {
                        lode: lode.clone(),
                        ts: None,
                    })
                }
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::LodeResumeRefine { lode_id, .. } => {
                match store.resume_refine(lode_id.as_str(), now) {
                    Ok(lode) => {
                        activity!(lode_id, change = "resume_refine");
                        Outcome::broadcast_only(ServerMessage::LodeUpdated {
                            lode: lode.clone(),
                            ts: None,
                        })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodeArchive { lode_id, .. } => {
                let owner = registry.owner_of(lode_id.as_str());
                match store.archive(lode_id.as_str()) {
                    Ok(lode) => {
                        activity!(lode_id, change = "archive");
                        if let Some(owner_conn) = owner {
                            registry.disconnect(owner_conn);
                        }
                        Outcome::broadcast_only(ServerMessage::LodeArchived { lode, ts: None })
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::LodePromoteBacklog { item_id, scope, .. } => {
                let scope = if scope.is_empty() { None } else { Some(scope) };
                match store.promote_backlog(self.id_gen.as_ref(), now, &item_id, scope) {
                    Ok(lode) => {
                        let lode = lode.clone();
                        activity!(lode.id, change = "promote_backlog");
                        Outcome {
                            reply: Some(ServerMessage::LodePromoted {
                                lode: lode.clone(),
                                ts: None,
                            }),
                            broadcasts: vec![ServerMessage::LodePromoted { lode, ts: None }],
                            evict: Vec::new(),
                        }
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }

            ClientMessage::BacklogAdd {
                project,
                description,
                lode_id,
                ..
            } => match store.add_backlog_item(self.id_gen.as_ref(), now, project, description, lode_id) {
                Ok(item) => Outcome::broadcast_only(ServerMessage::BacklogAdded {
                    item: item.clone(),
                    ts: None,
                }),
                Err(err) => Outcome::error(err.to_string()),
            },

            ClientMessage::BacklogRemove { item_id, .. } => {
                let resolved = resolve_backlog_prefix(&store.backlog, &item_id);
                match resolved {
                    Some(id) => match store.remove_backlog_item(&id) {
                        Ok(item) => Outcome::broadcast_only(ServerMessage::BacklogRemoved { item, ts: None }),
                        Err(err) => Outcome::error(err.to_string()),
                    },
                    None => Outcome::none(),
                }
            }

            ClientMessage::BacklogUpdate {
                item_id,
                description,
                ..
            } => {
                let resolved = resolve_backlog_prefix(&store.backlog, &item_id);
                match resolved {
                    Some(id) => match store.update_backlog_item(&id, description) {
                        Ok(item) => Outcome::broadcast_only(ServerMessage::BacklogAdded {
                            item: item.clone(),
                            ts: None,
                        }),
                        Err(err) => Outcome::error(err.to_string()),
                    },
                    None => Outcome::none(),
                }
            }

            ClientMessage::BacklogSetQueued { item_id, queued, .. } => {
                let resolved = resolve_backlog_prefix(&store.backlog, &item_id);
                match resolved {
                    Some(id) => match store.set_backlog_queued(&id, queued) {
                        Ok(item) => Outcome::broadcast_only(ServerMessage::BacklogAdded {
                            item: item.clone(),
                            ts: None,
                        }),
                        Err(err) => Outcome::error(err.to_string()),
                    },
                    None => Outcome::none(),
                }
            }

            ClientMessage::ProjectsReload { .. } => {
                match hopper_store::Config::load(&store.home) {
                    Ok(cfg) => {
                        store.config = cfg;
                        Outcome::none()
                    }
                    Err(err) => Outcome::error(err.to_string()),
                }
            }
        }
    }

    /// spec.md §4.3 disconnect handler: clear ownership, persist,
    /// broadcast, then evaluate auto-advance.
    pub fn handle_disconnect(&self, conn: ConnId) -> Outcome {
        let now = self.now_ms();
        let mut guard = self.inner.lock();
        let Inner { store, registry } = &mut *guard;

        let Some(lode_id) = registry.disconnect(conn) else {
            return Outcome::none();
        };

        let lode = match store.clear_ownership(&lode_id, now) {
            Ok(lode) => lode.clone(),
            Err(_) => return Outcome::none(),
        };
        activity!(lode_id, change = "disconnect");

        // Auto-advance (spec.md §4.3, §9 Open Question: only evaluated
        // once the owning connection is fully torn down).
        if lode.auto && lode.state.as_str() == "ready" && lode.stage != Stage::Shipped {
            if lode.status_matches_done() {
                if let Some(next) = lode.stage.next() {
                    self.spawner.spawn(lode.id.as_str(), next);
                }
            } else {
                // Runner exited without signalling completion: re-run the
                // same stage (spec.md §4.3: "status is NOT the terminal
                // 'done' message ... spawn the same-stage runner again").
                self.spawner.spawn(lode.id.as_str(), lode.stage);
            }
        }

        Outcome::broadcast_only(ServerMessage::LodeUpdated { lode, ts: None })
    }

    pub fn is_active(&self, lode_id: &str) -> bool {
        self.inner
            .lock()
            .store
            .find(lode_id)
            .map(|lode| lode.active)
            .unwrap_or(false)
    }
}

fn resolve_backlog_prefix(items: &[hopper_core::BacklogItem], prefix: &str) -> Option<String> {
    match hopper_store::backlog::find_by_prefix(items, prefix) {
        hopper_store::backlog::PrefixMatch::One(item) => Some(item.id.as_str().to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
