// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog items: deferred lode ideas that may later be promoted into a lode.

use serde::{Deserialize, Serialize};

pub use crate::id::BacklogId;

/// A deferred unit of work, addressable by id (or an unambiguous id prefix
/// at the CLI boundary — see `hopper-store::backlog::find_by_prefix`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub id: BacklogId,
    pub project: String,
    pub description: String,
    pub created_at: i64,
    #[serde(default)]
    pub lode_id: Option<crate::id::LodeId>,
    /// The id of a lode this item is waiting behind, if queued.
    #[serde(default)]
    pub queued: Option<crate::id::LodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_optional_fields_as_null_when_absent() {
        let item = BacklogItem {
            id: BacklogId::new("abcd2345"),
            project: "p".into(),
            description: "do the thing".into(),
            created_at: 1,
            lode_id: None,
            queued: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["lode_id"], serde_json::Value::Null);
        assert_eq!(json["queued"], serde_json::Value::Null);
    }

    #[test]
    fn round_trips_through_json() {
        let item = BacklogItem {
            id: BacklogId::new("abcd2345"),
            project: "p".into(),
            description: "do the thing".into(),
            created_at: 1,
            lode_id: Some(crate::id::LodeId::new("zzzz9999")),
            queued: Some(crate::id::LodeId::new("yyyy8888")),
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: BacklogItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.queued, item.queued);
    }
}
