// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn fresh_lode(id: &str, now_ms: i64) -> Lode {
    Lode {
        id: LodeId::new(id),
        stage: Stage::Mill,
        state: StateLabel::New,
        status: String::new(),
        title: String::new(),
        project: "demo".into(),
        scope: "do the thing".into(),
        branch: String::new(),
        created_at: now_ms,
        updated_at: now_ms,
        active: false,
        tmux_pane: None,
        pid: None,
        codex_thread_id: None,
        auto: false,
        backlog: None,
        claude: ClaudeStageMap::fresh(),
    }
}

#[test]
fn stage_ordering_is_mill_lt_refine_lt_ship_lt_shipped() {
    assert!(Stage::Mill < Stage::Refine);
    assert!(Stage::Refine < Stage::Ship);
    assert!(Stage::Ship < Stage::Shipped);
}

#[test]
fn stage_next_chains_through_shipped_then_stops() {
    assert_eq!(Stage::Mill.next(), Some(Stage::Refine));
    assert_eq!(Stage::Refine.next(), Some(Stage::Ship));
    assert_eq!(Stage::Ship.next(), Some(Stage::Shipped));
    assert_eq!(Stage::Shipped.next(), None);
}

#[test]
fn stage_serializes_lowercase() {
    let json = serde_json::to_string(&Stage::Refine).unwrap();
    assert_eq!(json, "\"refine\"");
}

#[test]
fn state_label_round_trips_recognized_values() {
    for label in ["new", "running", "stuck", "error", "ready", "completed"] {
        let parsed = StateLabel::from(label);
        assert!(parsed.is_recognized());
        assert_eq!(parsed.as_str(), label);
    }
}

#[test]
fn state_label_treats_unknown_strings_as_custom_opaque_labels() {
    let parsed = StateLabel::from("audit");
    assert!(!parsed.is_recognized());
    assert_eq!(parsed.as_str(), "audit");
}

#[test]
fn state_label_serializes_as_plain_string() {
    let json = serde_json::to_value(StateLabel::Custom("implement".into())).unwrap();
    assert_eq!(json, serde_json::Value::String("implement".into()));
}

#[test]
fn default_branch_is_hopper_dash_id() {
    let lode = fresh_lode("abcd2345", 0);
    assert_eq!(lode.default_branch(), "hopper-abcd2345");
    assert_eq!(lode.effective_branch(), "hopper-abcd2345");
}

#[test]
fn effective_branch_prefers_explicit_override() {
    let mut lode = fresh_lode("abcd2345", 0);
    lode.branch = "custom-branch".into();
    assert_eq!(lode.effective_branch(), "custom-branch");
}

#[test]
fn touch_advances_updated_at_but_never_decreases_it() {
    let mut lode = fresh_lode("abcd2345", 100);
    lode.touch(200);
    assert_eq!(lode.updated_at, 200);
    lode.touch(50); // stale timestamp must not move it backwards
    assert_eq!(lode.updated_at, 200);
}

#[test]
fn is_terminal_only_true_at_shipped() {
    let mut lode = fresh_lode("abcd2345", 0);
    assert!(!lode.is_terminal());
    lode.stage = Stage::Shipped;
    assert!(lode.is_terminal());
}

#[test]
fn status_matches_done_checks_the_stage_specific_sentence() {
    let mut lode = fresh_lode("abcd2345", 0);
    lode.stage = Stage::Refine;
    lode.status = "Refine complete".into();
    assert!(lode.status_matches_done());
    lode.status = "Refine in progress".into();
    assert!(!lode.status_matches_done());
}

#[test]
fn claude_stage_map_starts_fresh_and_unstarted_for_all_three_stages() {
    let map = ClaudeStageMap::fresh();
    for stage in [Stage::Mill, Stage::Refine, Stage::Ship] {
        let entry = map.get(stage).unwrap();
        assert!(!entry.started);
    }
}

#[test]
fn lode_round_trips_through_json_with_defaults_for_missing_optional_fields() {
    let lode = fresh_lode("abcd2345", 1_000);
    let json = serde_json::to_string(&lode).unwrap();
    let back: Lode = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, lode.id);
    assert_eq!(back.stage, lode.stage);

    // Unknown/omitted optional fields on an older document must not fail to parse.
    let minimal = serde_json::json!({
        "id": "zzzz9999",
        "stage": "mill",
        "project": "demo",
        "created_at": 1,
        "updated_at": 1,
        "claude": {"mill": {"session_id": "00000000-0000-0000-0000-000000000000", "started": false},
                   "refine": {"session_id": "00000000-0000-0000-0000-000000000000", "started": false},
                   "ship": {"session_id": "00000000-0000-0000-0000-000000000000", "started": false}}
    });
    let parsed: Lode = serde_json::from_value(minimal).unwrap();
    assert_eq!(parsed.state.as_str(), "new");
    assert!(!parsed.active);
    assert!(parsed.tmux_pane.is_none());
}

#[test]
fn done_status_for_each_stage_matches_the_runner_done_sentence() {
    assert_eq!(done_status_for(Stage::Mill), "Mill complete");
    assert_eq!(done_status_for(Stage::Refine), "Refine complete");
    assert_eq!(done_status_for(Stage::Ship), "Ship complete");
}
