// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage configuration: prompt name, predecessor whose output feeds
//! this stage's input, the next stage, and whether the auto-dismiss
//! watcher always runs for it (vs. only on a lode's first run in it).

use hopper_core::Stage;

pub struct StageConfig {
    pub stage: Stage,
    pub prompt_name: &'static str,
    pub done_status: &'static str,
    pub next_stage: Stage,
    pub always_dismiss: bool,
    pub input_from: Option<Stage>,
}

pub fn config_for(stage: Stage) -> StageConfig {
    match stage {
        Stage::Mill => StageConfig {
            stage: Stage::Mill,
            prompt_name: "mill",
            done_status: "Mill complete",
            next_stage: Stage::Refine,
            always_dismiss: false,
            input_from: None,
        },
        Stage::Refine => StageConfig {
            stage: Stage::Refine,
            prompt_name: "refine",
            done_status: "Refine complete",
            next_stage: Stage::Ship,
            always_dismiss: true,
            input_from: Some(Stage::Mill),
        },
        Stage::Ship => StageConfig {
            stage: Stage::Ship,
            prompt_name: "ship",
            done_status: "Ship complete",
            next_stage: Stage::Shipped,
            always_dismiss: true,
            input_from: Some(Stage::Refine),
        },
        Stage::Shipped => {
            unreachable!("shipped is terminal; no runner ever targets it")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mill_feeds_refine_feeds_ship() {
        assert_eq!(config_for(Stage::Mill).next_stage, Stage::Refine);
        assert_eq!(config_for(Stage::Refine).next_stage, Stage::Ship);
        assert_eq!(config_for(Stage::Ship).next_stage, Stage::Shipped);
    }

    #[test]
    fn only_mill_skips_auto_dismiss() {
        assert!(!config_for(Stage::Mill).always_dismiss);
        assert!(config_for(Stage::Refine).always_dismiss);
        assert!(config_for(Stage::Ship).always_dismiss);
    }

    #[test]
    fn input_chain_matches_prior_stage_output() {
        assert_eq!(config_for(Stage::Mill).input_from, None);
        assert_eq!(config_for(Stage::Refine).input_from, Some(Stage::Mill));
        assert_eq!(config_for(Stage::Ship).input_from, Some(Stage::Refine));
    }
}
