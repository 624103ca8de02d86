// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `config.json`: the projects list plus a free-form key/value document
//! backing `hopper config get|set|delete|list`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use hopper_core::Project;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::paths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config.json: {0}")]
    Json(#[from] serde_json::Error),
}

/// The on-disk config document: a dedicated `projects` array plus an
/// arbitrary string-keyed bag for user settings (`hopper config set k v`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = paths::config_json(home);
        match File::open(&path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                match serde_json::from_reader(reader) {
                    Ok(cfg) => Ok(cfg),
                    Err(_) => Ok(Config::default()),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, home: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(home)?;
        let path = paths::config_json(home);
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.extra.insert(key.to_string(), value);
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.extra.remove(key)
    }

    pub fn list(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extra.iter()
    }
}
