// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hopper_core::id::SequentialIdGen;
use hopper_core::Stage;
use tempfile::tempdir;

fn store_in(dir: &Path) -> Store {
    Store::load(dir).unwrap()
}

#[test]
fn create_lode_persists_and_is_findable() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let lode = store
        .create_lode(&gen, 1000, "proj".into(), "scope".into(), "title".into(), None)
        .unwrap();
    let id = lode.id.as_str().to_string();
    assert!(store.find(&id).is_some());

    let reloaded = store_in(dir.path());
    assert!(reloaded.find(&id).is_some());
}

#[test]
fn create_lode_makes_the_lode_directory() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let lode = store
        .create_lode(&gen, 1000, "proj".into(), "scope".into(), "".into(), None)
        .unwrap();
    let id = lode.id.as_str().to_string();
    assert!(paths::lode_dir(dir.path(), &id).is_dir());
}

#[test]
fn reconcile_startup_clears_stale_ownership() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.register(&id, Some("%1".into()), Some(42), 10).unwrap();
    assert!(store.find(&id).unwrap().active);

    let mut reloaded = store_in(dir.path());
    reloaded.reconcile_startup().unwrap();
    let lode = reloaded.find(&id).unwrap();
    assert!(!lode.active);
    assert!(lode.tmux_pane.is_none());
    assert!(lode.pid.is_none());
}

#[test]
fn register_then_second_register_overwrites_ownership_fields() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.register(&id, Some("%1".into()), Some(1), 1).unwrap();
    store.register(&id, Some("%2".into()), Some(2), 2).unwrap();
    let lode = store.find(&id).unwrap();
    assert_eq!(lode.tmux_pane.as_deref(), Some("%2"));
    assert_eq!(lode.pid, Some(2));
}

#[test]
fn clear_ownership_resets_active_pane_and_pid() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.register(&id, Some("%1".into()), Some(1), 1).unwrap();
    store.clear_ownership(&id, 2).unwrap();
    let lode = store.find(&id).unwrap();
    assert!(!lode.active);
    assert!(lode.tmux_pane.is_none());
    assert!(lode.pid.is_none());
}

#[test]
fn touch_policy_never_moves_updated_at_backwards() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 100, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.set_status(&id, "a".into(), 200).unwrap();
    store.set_status(&id, "b".into(), 50).unwrap();
    assert_eq!(store.find(&id).unwrap().updated_at, 200);
}

#[test]
fn codex_thread_id_is_immutable_once_set() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.set_codex_thread(&id, "thread-1".into(), 1).unwrap();
    store.set_codex_thread(&id, "thread-2".into(), 2).unwrap();
    assert_eq!(
        store.find(&id).unwrap().codex_thread_id.as_deref(),
        Some("thread-1")
    );
}

#[test]
fn reset_claude_stage_rejected_while_active() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.register(&id, None, None, 1).unwrap();
    assert!(store.reset_claude_stage(&id, Stage::Mill, 2).is_err());
}

#[test]
fn reset_claude_stage_rotates_session_id_and_clears_started() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    let original_session = store.find(&id).unwrap().claude.get(Stage::Mill).unwrap().session_id;
    store.set_claude_started(&id, Stage::Mill, 1).unwrap();
    store.reset_claude_stage(&id, Stage::Mill, 2).unwrap();
    let entry = store.find(&id).unwrap().claude.get(Stage::Mill).unwrap();
    assert!(!entry.started);
    assert_ne!(entry.session_id, original_session);
}

#[test]
fn resume_refine_only_legal_from_ship_stage() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    assert!(store.resume_refine(&id, 1).is_err());
    store.set_stage(&id, Stage::Ship, 1).unwrap();
    store.resume_refine(&id, 2).unwrap();
    let lode = store.find(&id).unwrap();
    assert_eq!(lode.stage, Stage::Refine);
    assert_eq!(lode.status, "Resuming refine");
}

#[test]
fn archive_moves_lode_out_of_active_into_archived_file() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    store.archive(&id).unwrap();
    assert!(store.find(&id).is_none());
    let archived = store.load_archived().unwrap();
    assert!(archived.iter().any(|lode| lode.id.as_str() == id));
}

#[test]
fn backlog_add_remove_round_trips() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let id = store
        .add_backlog_item(&gen, 0, "p".into(), "do the thing".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    assert!(store.find_backlog(&id).is_some());
    store.remove_backlog_item(&id).unwrap();
    assert!(store.find_backlog(&id).is_none());
}

#[test]
fn promote_backlog_creates_a_lode_and_removes_the_backlog_item() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let item_id = store
        .add_backlog_item(&gen, 0, "proj".into(), "do the thing".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    let lode = store.promote_backlog(&gen, 1, &item_id, None).unwrap();
    assert_eq!(lode.project, "proj");
    assert_eq!(lode.scope, "do the thing");
    assert!(lode.backlog.is_some());
    assert!(store.find_backlog(&item_id).is_none());
}

#[test]
fn id_generation_never_collides_with_an_existing_lode_directory() {
    let dir = tempdir().unwrap();
    let gen = SequentialIdGen::new();
    let mut store = store_in(dir.path());
    let first = store
        .create_lode(&gen, 0, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    let second = store
        .create_lode(&gen, 1, "p".into(), "s".into(), "".into(), None)
        .unwrap()
        .id
        .as_str()
        .to_string();
    assert_ne!(first, second);
}
