//! `hopper backlog add|remove` (spec.md §3 Backlog item, §6).
//!
//! The CLI surface exposes no `backlog list`; these specs verify state by
//! reading `backlog.jsonl` directly, the same file the daemon itself
//! treats as the source of truth (spec.md §6 filesystem layout).

use crate::prelude::{wait_for, Daemon};

fn backlog_items(daemon: &Daemon) -> Vec<serde_json::Value> {
    let path = daemon.home().join("backlog.jsonl");
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn add_appends_one_item_to_backlog_jsonl() {
    let daemon = Daemon::start();
    daemon
        .hopper()
        .args(&["backlog", "add", "widgets", "make the widgets sparkle"])
        .passes();

    let found = wait_for(1000, || {
        backlog_items(&daemon)
            .iter()
            .any(|i| i["project"] == "widgets" && i["description"] == "make the widgets sparkle")
    });
    assert!(found, "backlog item should be persisted: {:?}", backlog_items(&daemon));
}

#[test]
fn remove_by_full_id_drops_the_item() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["backlog", "add", "widgets", "one"]).passes();

    assert!(wait_for(1000, || !backlog_items(&daemon).is_empty()));
    let id = backlog_items(&daemon)[0]["id"].as_str().unwrap().to_string();

    daemon.hopper().args(&["backlog", "remove", &id]).passes();
    assert!(wait_for(1000, || backlog_items(&daemon).is_empty()));
}

#[test]
fn remove_by_unambiguous_prefix_drops_the_item() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["backlog", "add", "widgets", "one"]).passes();
    assert!(wait_for(1000, || !backlog_items(&daemon).is_empty()));

    let id = backlog_items(&daemon)[0]["id"].as_str().unwrap().to_string();
    let prefix = &id[..4];

    daemon.hopper().args(&["backlog", "remove", prefix]).passes();
    assert!(wait_for(1000, || backlog_items(&daemon).is_empty()));
}

#[test]
fn remove_of_an_unmatched_prefix_fails() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["backlog", "remove", "zzzzzzzz"]).fails().stderr_has("no backlog item");
}
