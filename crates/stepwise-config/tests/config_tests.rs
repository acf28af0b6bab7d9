// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Stepwise configuration system.

use stepwise_config::diagnostic::ConfigError;
use stepwise_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[general]
log_level = "debug"

[storage]
database_path = "/tmp/stepwise-test.db"
wal_mode = false

[generation]
model = "claude-haiku-4-5-20251001"
timeout_secs = 20

[notes]
milestone_interval = 5
max_tokens = 800

[rubric]
default_threshold = 3.0
margin = 0.25
transcript_turns = 10

[heuristic]
almost_ready_at = 4
ready_at = 8

[suggestions]
link_template = "/r/{room_id}/{mode}"

[[modes]]
key = "explore"
label = "Explore"

[[modes]]
key = "apply"
label = "Apply"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/stepwise-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.generation.timeout_secs, 20);
    assert_eq!(config.notes.max_tokens, 800);
    assert!((config.rubric.default_threshold - 3.0).abs() < f64::EPSILON);
    assert_eq!(config.rubric.transcript_turns, 10);
    assert_eq!(config.heuristic.ready_at, 8);
    assert_eq!(config.suggestions.link_template, "/r/{room_id}/{mode}");
    assert_eq!(config.modes.len(), 2);
    assert_eq!(config.modes[1].key, "apply");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.notes.milestone_interval, 5);
    assert_eq!(config.modes.len(), 4);
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[rubric]
default_treshold = 3.0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("expected an UnknownKey error");
    assert_eq!(unknown.0, "default_treshold");
    assert_eq!(unknown.1.as_deref(), Some("default_threshold"));
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[notes]
milestone_interval = "five"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("milestone_interval"))));
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[rubric]
transcript_turns = 40
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("transcript_turns"))));
}
