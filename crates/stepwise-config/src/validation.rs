// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! All failures are collected; validation does not stop at the first one.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::StepwiseConfig;

/// Largest transcript tail an assessment may carry.
pub const MAX_TRANSCRIPT_TURNS: usize = 15;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &StepwiseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.generation.timeout_secs == 0 {
        fail("generation.timeout_secs must be at least 1".to_string());
    }

    if config.notes.milestone_interval == 0 {
        fail("notes.milestone_interval must be at least 1".to_string());
    }

    let threshold = config.rubric.default_threshold;
    if !(1.0..=4.0).contains(&threshold) {
        fail(format!(
            "rubric.default_threshold must be within the 1-4 score scale, got {threshold}"
        ));
    }

    if !(0.0..1.5).contains(&config.rubric.margin) {
        fail(format!(
            "rubric.margin must be in [0, 1.5), got {}",
            config.rubric.margin
        ));
    }

    let turns = config.rubric.transcript_turns;
    if turns == 0 || turns > MAX_TRANSCRIPT_TURNS {
        fail(format!(
            "rubric.transcript_turns must be between 1 and {MAX_TRANSCRIPT_TURNS}, got {turns}"
        ));
    }

    if !(1..=4).contains(&config.rubric.default_score) {
        fail(format!(
            "rubric.default_score must be between 1 and 4, got {}",
            config.rubric.default_score
        ));
    }

    if config.heuristic.almost_ready_at > config.heuristic.ready_at {
        fail(format!(
            "heuristic.almost_ready_at ({}) must not exceed heuristic.ready_at ({})",
            config.heuristic.almost_ready_at, config.heuristic.ready_at
        ));
    }

    if config.modes.is_empty() {
        fail("[[modes]] must list at least one mode".to_string());
    }

    let mut seen = HashSet::new();
    for (i, mode) in config.modes.iter().enumerate() {
        if mode.key.trim().is_empty() {
            fail(format!("modes[{i}].key must not be empty"));
        } else if !seen.insert(mode.key.as_str()) {
            fail(format!("duplicate mode key `{}` in [[modes]]", mode.key));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
