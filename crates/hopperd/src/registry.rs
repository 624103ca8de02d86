// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ownership registry (spec.md §4.3): two maps, `by_lode` and
//! `by_conn`, mutated together so at most one connection owns any lode.

use std::collections::HashMap;

/// Opaque per-connection identifier, assigned by the listener when a
/// socket is accepted.
pub type ConnId = u64;

#[derive(Default)]
pub struct Registry {
    by_lode: HashMap<String, ConnId>,
    by_conn: HashMap<ConnId, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `lode_id` for `conn`. Returns the previous owner's `ConnId`,
    /// if any, so the caller can disconnect it (spec.md invariant 1: "at
    /// most one client owns a lode at any instant").
    pub fn register(&mut self, lode_id: &str, conn: ConnId) -> Option<ConnId> {
        let previous_owner = self.by_lode.insert(lode_id.to_string(), conn);
        if let Some(prev) = previous_owner {
            self.by_conn.remove(&prev);
        }
        if let Some(prev_lode) = self.by_conn.insert(conn, lode_id.to_string()) {
            if prev_lode != lode_id {
                self.by_lode.remove(&prev_lode);
            }
        }
        previous_owner
    }

    /// Remove a connection going away. Returns the lode id it owned, if any.
    pub fn disconnect(&mut self, conn: ConnId) -> Option<String> {
        let lode_id = self.by_conn.remove(&conn)?;
        if self.by_lode.get(&lode_id) == Some(&conn) {
            self.by_lode.remove(&lode_id);
        }
        Some(lode_id)
    }

    pub fn owner_of(&self, lode_id: &str) -> Option<ConnId> {
        self.by_lode.get(lode_id).copied()
    }

    #[cfg(test)]
    pub fn lode_of(&self, conn: ConnId) -> Option<&str> {
        self.by_conn.get(&conn).map(String::as_str)
    }
}
