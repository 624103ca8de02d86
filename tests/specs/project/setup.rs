//! `hopper project add|remove|rename|list` (spec.md §3 Project entity, §6).

use crate::prelude::{Daemon, Project};

#[test]
fn add_then_list_shows_the_project() {
    let daemon = Daemon::start();
    let project = Project::empty();

    daemon
        .hopper()
        .args(&["project", "add", &project.path().display().to_string()])
        .passes()
        .stdout_eq(&format!("{}\n", project.name()));

    daemon
        .hopper()
        .args(&["project", "list"])
        .passes()
        .stdout_has(&project.name())
        .stdout_has(&project.path().display().to_string());
}

#[test]
fn add_accepts_an_explicit_name_override() {
    let daemon = Daemon::start();
    let project = Project::empty();

    daemon
        .hopper()
        .args(&["project", "add", &project.path().display().to_string(), "--name", "widgets"])
        .passes()
        .stdout_eq("widgets\n");

    daemon.hopper().args(&["project", "list"]).passes().stdout_has("widgets");
}

#[test]
fn adding_the_same_name_twice_fails() {
    let daemon = Daemon::start();
    let project = Project::empty();
    let path = project.path().display().to_string();

    daemon.hopper().args(&["project", "add", &path]).passes();
    daemon.hopper().args(&["project", "add", &path]).fails().stderr_has("already registered");
}

#[test]
fn rename_then_list_shows_the_new_name() {
    let daemon = Daemon::start();
    let project = Project::empty();
    let path = project.path().display().to_string();

    daemon.hopper().args(&["project", "add", &path, "--name", "old"]).passes();
    daemon.hopper().args(&["project", "rename", "old", "new"]).passes();

    let list = daemon.hopper().args(&["project", "list"]).passes();
    let stdout = list.stdout();
    assert!(stdout.contains("new"));
    assert!(!stdout.contains("old"));
}

#[test]
fn remove_drops_an_unreferenced_project_entirely() {
    let daemon = Daemon::start();
    let project = Project::empty();
    let path = project.path().display().to_string();

    daemon.hopper().args(&["project", "add", &path]).passes();
    daemon.hopper().args(&["project", "remove", &project.name()]).passes();

    daemon
        .hopper()
        .args(&["project", "list"])
        .passes()
        .stdout_eq("no registered projects\n");
}

#[test]
fn removing_an_unknown_project_fails() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["project", "remove", "nope"]).fails().stderr_has("unknown project");
}
