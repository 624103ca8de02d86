//! `hopper config get|set|delete|list|path|json` (spec.md §6).

use crate::prelude::Daemon;

#[test]
fn set_then_get_round_trips_a_plain_string() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["config", "set", "theme", "dark"]).passes();
    daemon.hopper().args(&["config", "get", "theme"]).passes().stdout_eq("dark\n");
}

#[test]
fn set_parses_json_scalars() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["config", "set", "auto_ship", "true"]).passes();
    daemon.hopper().args(&["config", "get", "auto_ship"]).passes().stdout_eq("true\n");
}

#[test]
fn get_on_an_unknown_key_fails() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["config", "get", "nope"]).fails().stderr_has("no such key");
}

#[test]
fn delete_removes_the_key() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["config", "set", "theme", "dark"]).passes();
    daemon.hopper().args(&["config", "delete", "theme"]).passes();
    daemon.hopper().args(&["config", "get", "theme"]).fails();
}

#[test]
fn list_includes_every_key_sorted() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["config", "set", "zebra", "1"]).passes();
    daemon.hopper().args(&["config", "set", "apple", "2"]).passes();

    let out = daemon.hopper().args(&["config", "list"]).passes();
    let stdout = out.stdout();
    let apple_at = stdout.find("apple").expect("apple should be listed");
    let zebra_at = stdout.find("zebra").expect("zebra should be listed");
    assert!(apple_at < zebra_at, "list should be sorted by key");
}

#[test]
fn path_points_at_config_json_under_home() {
    let daemon = Daemon::start();
    daemon
        .hopper()
        .args(&["config", "path"])
        .passes()
        .stdout_has(&daemon.home().join("config.json").display().to_string());
}

#[test]
fn json_round_trips_through_project_add() {
    let daemon = Daemon::start();
    let project = crate::prelude::Project::empty();
    daemon
        .hopper()
        .args(&["project", "add", &project.path().display().to_string()])
        .passes();

    let out = daemon.hopper().args(&["config", "json"]).passes();
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout()).expect("config json should parse");
    assert!(parsed["projects"].as_array().unwrap().iter().any(|p| p["name"] == project.name()));
}
