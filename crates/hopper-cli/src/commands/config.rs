// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper config` — the free-form key/value bag inside `config.json`
//! (spec.md §6 CLI surface: `config get|set|delete|list|path|json`).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one key's value
    Get { key: String },
    /// Set one key to a JSON (or plain-string) value
    Set { key: String, value: String },
    /// Remove one key
    Delete { key: String },
    /// List every key/value pair
    List {},
    /// Print the path to `config.json`
    Path {},
    /// Print the raw `config.json` document
    Json {},
}

pub async fn handle(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Get { key } => get(key),
        ConfigCommand::Set { key, value } => set(key, value),
        ConfigCommand::Delete { key } => delete(key),
        ConfigCommand::List {} => list(),
        ConfigCommand::Path {} => path(),
        ConfigCommand::Json {} => json(),
    }
}

fn get(key: String) -> Result<()> {
    let config = hopper_store::Config::load(&crate::env::home())?;
    match config.get(&key) {
        Some(value) => {
            println!("{}", render_value(value));
            Ok(())
        }
        None => bail!("no such key: {key}"),
    }
}

/// Parses `value` as JSON when possible so `hopper config set x true`
/// stores a bool rather than the string `"true"`; falls back to a plain
/// JSON string for anything that doesn't parse.
fn set(key: String, value: String) -> Result<()> {
    let home = crate::env::home();
    let mut config = hopper_store::Config::load(&home)?;
    let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
    config.set(&key, parsed);
    config.save(&home)?;
    Ok(())
}

fn delete(key: String) -> Result<()> {
    let home = crate::env::home();
    let mut config = hopper_store::Config::load(&home)?;
    if config.delete(&key).is_none() {
        bail!("no such key: {key}");
    }
    config.save(&home)?;
    Ok(())
}

fn list() -> Result<()> {
    let config = hopper_store::Config::load(&crate::env::home())?;
    let mut keys: Vec<(&String, &Value)> = config.list().collect();
    keys.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in keys {
        println!("{key}\t{}", render_value(value));
    }
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", hopper_store::paths::config_json(&crate::env::home()).display());
    Ok(())
}

fn json() -> Result<()> {
    let config = hopper_store::Config::load(&crate::env::home())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_value_unquotes_strings_but_not_other_types() {
        assert_eq!(render_value(&Value::String("dark".into())), "dark");
        assert_eq!(render_value(&Value::Bool(true)), "true");
        assert_eq!(render_value(&Value::from(5)), "5");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn set_parses_json_scalars_but_falls_back_to_a_string() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("HOPPER_HOME", dir.path());

        set("theme".to_string(), "dark".to_string()).unwrap();
        set("auto_ship".to_string(), "true".to_string()).unwrap();

        let config = hopper_store::Config::load(dir.path()).unwrap();
        assert_eq!(config.get("theme"), Some(&Value::String("dark".into())));
        assert_eq!(config.get("auto_ship"), Some(&Value::Bool(true)));

        std::env::remove_var("HOPPER_HOME");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn delete_errors_on_an_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("HOPPER_HOME", dir.path());

        let err = delete("nope".to_string()).unwrap_err();
        assert!(err.to_string().contains("no such key"));

        std::env::remove_var("HOPPER_HOME");
    }
}
