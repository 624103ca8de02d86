//! `hopper lode create|list|restart` (spec.md §3 Lode entity, §6).
//!
//! `create --no-spawn` is used throughout so these specs never need a real
//! tmux session or coding-agent binary — only the coordinator's state
//! machine is under test here.

use crate::prelude::{Daemon, Project};

#[test]
fn create_prints_an_eight_char_base32_id() {
    let daemon = Daemon::start();
    let project = Project::empty();
    daemon.hopper().args(&["project", "add", &project.path().display().to_string()]).passes();

    let out = daemon
        .hopper()
        .args(&["lode", "create", &project.name(), "do the thing", "--no-spawn"])
        .passes();

    let id = out.stdout().trim().to_string();
    assert_eq!(id.len(), 8, "id should be 8 characters: {id:?}");
    assert!(
        id.chars().all(|c| "abcdefghijklmnopqrstuvwxyz234567".contains(c)),
        "id should be lowercase base32: {id:?}"
    );
}

#[test]
fn list_is_empty_until_a_lode_is_created() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["lode", "list"]).passes().stdout_eq("no active lodes\n");
}

#[test]
fn created_lode_appears_in_list_at_stage_mill_state_new() {
    let daemon = Daemon::start();
    let project = Project::empty();
    daemon.hopper().args(&["project", "add", &project.path().display().to_string()]).passes();

    let out = daemon
        .hopper()
        .args(&["lode", "create", &project.name(), "do the thing", "--no-spawn"])
        .passes();
    let id = out.stdout().trim().to_string();

    daemon
        .hopper()
        .args(&["lode", "list"])
        .passes()
        .stdout_has(&id)
        .stdout_has("mill")
        .stdout_has("new")
        .stdout_has(&project.name());
}

#[test]
fn lode_is_persisted_to_active_jsonl_with_a_fresh_claude_session_per_stage() {
    let daemon = Daemon::start();
    let project = Project::empty();
    daemon.hopper().args(&["project", "add", &project.path().display().to_string()]).passes();

    let out = daemon
        .hopper()
        .args(&["lode", "create", &project.name(), "do the thing", "--no-spawn"])
        .passes();
    let id = out.stdout().trim().to_string();

    let contents = std::fs::read_to_string(daemon.home().join("active.jsonl")).unwrap();
    let lode: serde_json::Value = contents.lines().find_map(|l| {
        let v: serde_json::Value = serde_json::from_str(l).unwrap();
        (v["id"] == id).then_some(v)
    }).expect("created lode should be in active.jsonl");

    assert_eq!(lode["stage"], "mill");
    assert_eq!(lode["active"], false);
    for stage in ["mill", "refine", "ship"] {
        assert_eq!(lode["claude"][stage]["started"], false);
        assert!(lode["claude"][stage]["session_id"].is_string());
    }
    // The three per-stage session ids must be distinct (spec.md §4.4).
    let mill_id = lode["claude"]["mill"]["session_id"].as_str().unwrap();
    let refine_id = lode["claude"]["refine"]["session_id"].as_str().unwrap();
    let ship_id = lode["claude"]["ship"]["session_id"].as_str().unwrap();
    assert_ne!(mill_id, refine_id);
    assert_ne!(refine_id, ship_id);
}

#[test]
fn restart_of_an_unknown_lode_fails() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["lode", "restart", "zzzzzzzz"]).fails().stderr_has("unknown lode");
}
