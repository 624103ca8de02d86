// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefix-addressed backlog lookup.
//!
//! The CLI-facing backlog commands (`hopper backlog remove <prefix>`)
//! address items by an unambiguous id prefix rather than the full 8-char
//! id, mirroring the original's `backlog.py::find_by_prefix`. An empty or
//! ambiguous prefix resolves to nothing — the coordinator treats that as
//! a no-op rather than guessing.

use hopper_core::BacklogItem;

/// Resolution outcome for a prefix lookup.
#[derive(Debug, PartialEq)]
pub enum PrefixMatch<'a> {
    /// No item's id starts with the prefix.
    None,
    /// Exactly one item matched.
    One(&'a BacklogItem),
    /// More than one item matched; the prefix is ambiguous.
    Ambiguous(Vec<&'a BacklogItem>),
}

/// Find the backlog item(s) whose id starts with `prefix`. An empty
/// prefix never matches (matches everything would be surprising and is
/// never what a caller addressing-by-prefix means).
pub fn find_by_prefix<'a>(items: &'a [BacklogItem], prefix: &str) -> PrefixMatch<'a> {
    if prefix.is_empty() {
        return PrefixMatch::None;
    }
    let matches: Vec<&BacklogItem> = items
        .iter()
        .filter(|item| item.id.as_str().starts_with(prefix))
        .collect();
    match matches.len() {
        0 => PrefixMatch::None,
        1 => PrefixMatch::One(matches[0]),
        _ => PrefixMatch::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::BacklogId;

    fn item(id: &str) -> BacklogItem {
        BacklogItem {
            id: BacklogId::new(id),
            project: "p".into(),
            description: "d".into(),
            created_at: 0,
            lode_id: None,
            queued: None,
        }
    }

    #[test]
    fn empty_prefix_matches_nothing() {
        let items = vec![item("abcd2345")];
        assert_eq!(find_by_prefix(&items, ""), PrefixMatch::None);
    }

    #[test]
    fn unique_prefix_resolves_to_one() {
        let items = vec![item("abcd2345"), item("zzzz9999")];
        match find_by_prefix(&items, "abcd") {
            PrefixMatch::One(found) => assert_eq!(found.id, "abcd2345"),
            other => panic!("expected One, got {other:?}"),
        }
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let items = vec![item("abcd2345"), item("abcd6666")];
        match find_by_prefix(&items, "abcd") {
            PrefixMatch::Ambiguous(matches) => assert_eq!(matches.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn no_match_returns_none() {
        let items = vec![item("abcd2345")];
        assert_eq!(find_by_prefix(&items, "zzzz"), PrefixMatch::None);
    }
}
