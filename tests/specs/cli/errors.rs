//! Argument and connectivity error paths (spec.md §7).

use crate::prelude::cli;

#[test]
fn unknown_subcommand_fails_with_usage() {
    cli().args(&["bogus"]).fails().stderr_has("error");
}

#[test]
fn missing_required_argument_fails() {
    cli().args(&["project", "add"]).fails();
}

#[test]
fn ping_without_a_daemon_fails() {
    let home = tempfile::tempdir().unwrap();
    // Point at a home with no socket and a short timeout so the test is fast.
    cli()
        .env("HOPPER_HOME", home.path())
        .env("HOPPER_REQUEST_TIMEOUT_MS", "200")
        .args(&["ping"])
        .fails();
}

#[test]
fn status_outside_a_lode_session_fails() {
    let home = tempfile::tempdir().unwrap();
    cli()
        .env("HOPPER_HOME", home.path())
        .args(&["status", "doing a thing"])
        .fails()
        .stderr_has("HOPPER_LID");
}
