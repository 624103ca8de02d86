// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSONL (newline-delimited JSON) persistence.
//!
//! Every save writes `<target>.tmp` in the target's own directory,
//! flushes, then renames over the target — spec.md §4.1's atomic save
//! contract. A `.tmp` left over from a prior crash is never a read
//! target (readers only ever open the real path), so startup silently
//! ignores it.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonlError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON at {path}:{line}: {source}")]
    Json {
        path: std::path::PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Load every non-blank line of `path` as one `T`. Returns an empty `Vec`
/// if the file doesn't exist yet (first run).
pub fn load_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, JsonlError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(JsonlError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| JsonlError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let item = serde_json::from_str(trimmed).map_err(|e| JsonlError::Json {
            path: path.to_path_buf(),
            line: idx + 1,
            source: e,
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Atomically overwrite `path` with one JSON line per item
/// (spec.md invariant 4: "every mutation ... writes the entire active
/// list via a temp-file-plus-rename sequence").
pub fn save_all<T: Serialize>(path: &Path, items: &[T]) -> Result<(), JsonlError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| JsonlError::Io {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    {
        let file = File::create(&tmp_path).map_err(|e| JsonlError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        for item in items {
            serde_json::to_writer(&mut writer, item).map_err(|e| JsonlError::Json {
                path: tmp_path.clone(),
                line: 0,
                source: e,
            })?;
            writer.write_all(b"\n").map_err(|e| JsonlError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
        }
        writer.flush().map_err(|e| JsonlError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        let file = writer.into_inner().map_err(|e| JsonlError::Io {
            path: tmp_path.clone(),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|e| JsonlError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|e| JsonlError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Append one JSON line to `path` without reading or rewriting the rest —
/// the archive file is single-writer (only the coordinator writes it) so
/// a plain open-append-close is safe (spec.md §6).
pub fn append_one<T: Serialize>(path: &Path, item: &T) -> Result<(), JsonlError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| JsonlError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| JsonlError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    let mut line = serde_json::to_vec(item).map_err(|e| JsonlError::Json {
        path: path.to_path_buf(),
        line: 0,
        source: e,
    })?;
    line.push(b'\n');
    file.write_all(&line).map_err(|e| JsonlError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
