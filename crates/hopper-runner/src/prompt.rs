// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage prompt loading and `{{var}}` substitution.
//!
//! The terminal multiplexer, git plumbing and argument parser all sit
//! outside the core's interface; prompt templating is the same shape —
//! [`PromptRenderer`] is the seam the runner calls through, with one
//! concrete implementation backed by a `prompts/` directory and a
//! compiled-in fallback for each built-in stage prompt.

use std::collections::BTreeMap;
use std::path::PathBuf;

const DEFAULT_MILL: &str = include_str!("../prompts/mill.md");
const DEFAULT_REFINE: &str = include_str!("../prompts/refine.md");
const DEFAULT_SHIP: &str = include_str!("../prompts/ship.md");
const DEFAULT_CODE: &str = include_str!("../prompts/code.md");

/// The substitution context passed to a prompt: `project`, `dir`,
/// `scope`, `input`, ... Plain string map, built fresh per render.
pub type PromptContext = BTreeMap<String, String>;

pub trait PromptRenderer: Send + Sync {
    fn render(&self, name: &str, context: &PromptContext) -> Result<String, PromptError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("prompt not found: {0}")]
    NotFound(String),
    #[error("io error reading prompt {0}: {1}")]
    Io(String, std::io::Error),
}

/// Looks for `<prompts_dir>/<name>.md` first, falling back to the
/// compiled-in default for the four named stage prompts.
pub struct FilePromptRenderer {
    prompts_dir: Option<PathBuf>,
}

impl FilePromptRenderer {
    pub fn new(prompts_dir: Option<PathBuf>) -> Self {
        Self { prompts_dir }
    }

    fn default_for(name: &str) -> Option<&'static str> {
        match name {
            "mill" => Some(DEFAULT_MILL),
            "refine" => Some(DEFAULT_REFINE),
            "ship" => Some(DEFAULT_SHIP),
            "code" => Some(DEFAULT_CODE),
            _ => None,
        }
    }

    fn load_raw(&self, name: &str) -> Result<String, PromptError> {
        if let Some(dir) = &self.prompts_dir {
            let path = dir.join(format!("{name}.md"));
            match std::fs::read_to_string(&path) {
                Ok(text) => return Ok(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(PromptError::Io(path.display().to_string(), err)),
            }
        }
        Self::default_for(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }
}

impl PromptRenderer for FilePromptRenderer {
    fn render(&self, name: &str, context: &PromptContext) -> Result<String, PromptError> {
        let raw = self.load_raw(name)?;
        Ok(substitute(raw.trim(), context))
    }
}

/// Replaces every `{{key}}` occurrence with `context[key]`; an unknown
/// key is left untouched rather than erroring, matching the original's
/// "safe substitute" semantics.
fn substitute(text: &str, context: &PromptContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start..].find("}}") else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        let key = rest[start + 2..start + end].trim();
        match context.get(key) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &rest[start + end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> PromptContext {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitute_replaces_known_keys() {
        let text = "Working on {{project}} at {{dir}}.";
        let out = substitute(text, &ctx(&[("project", "hopper"), ("dir", "/tmp/x")]));
        assert_eq!(out, "Working on hopper at /tmp/x.");
    }

    #[test]
    fn substitute_leaves_unknown_keys_untouched() {
        let text = "Hello {{name}}.";
        let out = substitute(text, &PromptContext::new());
        assert_eq!(out, "Hello {{name}}.");
    }

    #[test]
    fn file_renderer_falls_back_to_default_for_mill() {
        let renderer = FilePromptRenderer::new(None);
        let rendered = renderer.render("mill", &PromptContext::new()).unwrap();
        assert!(!rendered.is_empty());
    }

    #[test]
    fn file_renderer_prefers_prompts_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mill.md"), "custom {{scope}}").unwrap();
        let renderer = FilePromptRenderer::new(Some(dir.path().to_path_buf()));
        let rendered = renderer
            .render("mill", &ctx(&[("scope", "widgets")]))
            .unwrap();
        assert_eq!(rendered, "custom widgets");
    }

    #[test]
    fn file_renderer_errors_on_unknown_prompt_with_no_default() {
        let renderer = FilePromptRenderer::new(None);
        let err = renderer.render("nonexistent", &PromptContext::new());
        assert!(matches!(err, Err(PromptError::NotFound(_))));
    }
}
