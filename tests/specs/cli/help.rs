//! `hopper --help` and per-subcommand help text (spec.md §6 CLI surface).

use crate::prelude::cli;

#[test]
fn top_level_help_lists_every_subcommand() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("lode orchestrator")
        .stdout_has("ping")
        .stdout_has("process")
        .stdout_has("processed")
        .stdout_has("status")
        .stdout_has("lode")
        .stdout_has("backlog")
        .stdout_has("project")
        .stdout_has("config")
        .stdout_has("screenshot")
        .stdout_has("code");
}

#[test]
fn lode_help_lists_its_subcommands() {
    cli()
        .args(&["lode", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("create")
        .stdout_has("restart")
        .stdout_has("watch");
}

#[test]
fn config_help_lists_its_subcommands() {
    cli()
        .args(&["config", "--help"])
        .passes()
        .stdout_has("get")
        .stdout_has("set")
        .stdout_has("delete")
        .stdout_has("list")
        .stdout_has("path")
        .stdout_has("json");
}

#[test]
fn version_flag_succeeds() {
    cli().args(&["--version"]).passes();
}
