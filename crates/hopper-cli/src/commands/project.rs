// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper project` — registered project directories (spec.md §3 Project
//! entity). Projects live in `config.json`, not the coordinator's active
//! state, so these commands mutate `Config` directly and then nudge a
//! running daemon to pick up the change via `projects_reload`.

use std::path::Path;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use hopper_core::Project;
use hopper_protocol::ClientMessage;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Register a project directory
    Add {
        /// Path to the project's working directory
        path: String,
        /// Override the name (defaults to the path's basename)
        #[arg(long)]
        name: Option<String>,
    },
    /// Unregister a project (kept disabled if a lode still references it)
    Remove {
        /// Project name
        name: String,
    },
    /// Rename a registered project
    Rename {
        /// Current name
        old_name: String,
        /// New name
        new_name: String,
    },
    /// List registered projects
    List {},
}

pub async fn handle(args: ProjectArgs) -> Result<()> {
    match args.command {
        ProjectCommand::Add { path, name } => add(path, name).await,
        ProjectCommand::Remove { name } => remove(name).await,
        ProjectCommand::Rename { old_name, new_name } => rename(old_name, new_name).await,
        ProjectCommand::List {} => list().await,
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

async fn add(path: String, name: Option<String>) -> Result<()> {
    let home = crate::env::home();
    let mut config = hopper_store::Config::load(&home)?;

    let name = name.unwrap_or_else(|| basename(&path));
    if config.projects.iter().any(|p| p.name == name && !p.disabled) {
        bail!("project already registered: {name}");
    }

    if let Some(existing) = config.projects.iter_mut().find(|p| p.name == name && p.disabled) {
        existing.disabled = false;
        existing.path = path;
    } else {
        config.projects.push(Project::new(path, name.clone()));
    }

    config.save(&home)?;
    reload_daemon().await;
    println!("{name}");
    Ok(())
}

/// Kept (marked `disabled`) rather than deleted outright when a lode
/// still references it — matches `hopper_core::Project::disabled`'s
/// documented purpose.
async fn remove(name: String) -> Result<()> {
    let home = crate::env::home();
    let mut config = hopper_store::Config::load(&home)?;

    let still_referenced = {
        let active: Vec<hopper_core::Lode> =
            hopper_store::jsonl::load_all(&hopper_store::paths::active_jsonl(&home))?;
        active.iter().any(|lode| lode.project == name)
    };

    let project = config
        .projects
        .iter_mut()
        .find(|p| p.name == name && !p.disabled)
        .ok_or_else(|| anyhow::anyhow!("unknown project: {name}"))?;

    if still_referenced {
        project.disabled = true;
    } else {
        config.projects.retain(|p| p.name != name);
    }

    config.save(&home)?;
    reload_daemon().await;
    Ok(())
}

async fn rename(old_name: String, new_name: String) -> Result<()> {
    let home = crate::env::home();
    let mut config = hopper_store::Config::load(&home)?;

    if config.projects.iter().any(|p| p.name == new_name) {
        bail!("project already registered: {new_name}");
    }

    let project = config
        .projects
        .iter_mut()
        .find(|p| p.name == old_name)
        .ok_or_else(|| anyhow::anyhow!("unknown project: {old_name}"))?;
    project.name = new_name;

    config.save(&home)?;
    reload_daemon().await;
    Ok(())
}

async fn list() -> Result<()> {
    let config = hopper_store::Config::load(&crate::env::home())?;
    if config.projects.is_empty() {
        println!("no registered projects");
        return Ok(());
    }
    for project in &config.projects {
        let marker = if project.disabled { " (disabled)" } else { "" };
        println!("{}\t{}{}", project.name, project.path, marker);
    }
    Ok(())
}

/// Best-effort: a daemon that isn't running simply re-reads `config.json`
/// the next time it starts, so a failed nudge here is not an error.
async fn reload_daemon() {
    let _ = hopper_client::send_fire_and_forget(
        &crate::env::socket_path(),
        ClientMessage::ProjectsReload { ts: None },
        crate::env::request_timeout(),
    )
    .await;
}
