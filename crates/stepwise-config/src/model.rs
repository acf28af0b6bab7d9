// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Stepwise progression engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use stepwise_core::types::{ModeStep, ModeTable};

/// Top-level Stepwise configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepwiseConfig {
    /// Process-level settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text-generation backend settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Milestone note synthesis settings.
    #[serde(default)]
    pub notes: NotesConfig,

    /// Rubric assessment settings.
    #[serde(default)]
    pub rubric: RubricConfig,

    /// Message-count fallback used when a room has no rubric.
    #[serde(default)]
    pub heuristic: HeuristicConfig,

    /// Suggestion rendering settings.
    #[serde(default)]
    pub suggestions: SuggestionsConfig,

    /// Default ordered mode table, used by rooms without their own sequence.
    #[serde(default = "default_modes")]
    pub modes: Vec<ModeConfig>,
}

impl Default for StepwiseConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            storage: StorageConfig::default(),
            generation: GenerationConfig::default(),
            notes: NotesConfig::default(),
            rubric: RubricConfig::default(),
            heuristic: HeuristicConfig::default(),
            suggestions: SuggestionsConfig::default(),
            modes: default_modes(),
        }
    }
}

impl StepwiseConfig {
    /// The default mode table as domain steps, in configured order.
    pub fn mode_table(&self) -> ModeTable {
        ModeTable::new(
            self.modes
                .iter()
                .map(|m| ModeStep::new(m.key.clone(), m.label.clone()))
                .collect(),
        )
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("stepwise").join("stepwise.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("stepwise.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Text-generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// API key. `None` falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model used for notes and rubric assessments.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Upper bound on a single generation call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Messages endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            model: default_generation_model(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_generation_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

/// Milestone note synthesis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotesConfig {
    /// Message-count interval at which notes are regenerated.
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: u32,

    /// Maximum tokens for the notes generation call.
    #[serde(default = "default_notes_max_tokens")]
    pub max_tokens: u32,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            milestone_interval: default_milestone_interval(),
            max_tokens: default_notes_max_tokens(),
        }
    }
}

fn default_milestone_interval() -> u32 {
    5
}

fn default_notes_max_tokens() -> u32 {
    1024
}

/// Rubric assessment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RubricConfig {
    /// Readiness threshold used when a (room, mode) has no override.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,

    /// Half-width of the "almost ready" band around the threshold.
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Number of most recent messages sent with the assessment (at most 15).
    #[serde(default = "default_transcript_turns")]
    pub transcript_turns: usize,

    /// Maximum tokens for the assessment generation call.
    #[serde(default = "default_rubric_max_tokens")]
    pub max_tokens: u32,

    /// Score assigned to a criterion missing from the assessment.
    #[serde(default = "default_missing_score")]
    pub default_score: u8,
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            margin: default_margin(),
            transcript_turns: default_transcript_turns(),
            max_tokens: default_rubric_max_tokens(),
            default_score: default_missing_score(),
        }
    }
}

fn default_threshold() -> f64 {
    2.5
}

fn default_margin() -> f64 {
    0.2
}

fn default_transcript_turns() -> usize {
    15
}

fn default_rubric_max_tokens() -> u32 {
    1024
}

fn default_missing_score() -> u8 {
    2
}

/// Message-count thresholds for rooms without a rubric.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeuristicConfig {
    /// Message count from which a chat is "almost ready".
    #[serde(default = "default_almost_ready_at")]
    pub almost_ready_at: u32,

    /// Message count from which a chat is "ready".
    #[serde(default = "default_ready_at")]
    pub ready_at: u32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            almost_ready_at: default_almost_ready_at(),
            ready_at: default_ready_at(),
        }
    }
}

fn default_almost_ready_at() -> u32 {
    6
}

fn default_ready_at() -> u32 {
    12
}

/// Suggestion rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestionsConfig {
    /// Link to the next step. `{room_id}` and `{mode}` are substituted.
    #[serde(default = "default_link_template")]
    pub link_template: String,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            link_template: default_link_template(),
        }
    }
}

fn default_link_template() -> String {
    "/rooms/{room_id}/chats/new?mode={mode}".to_string()
}

/// One entry of the default mode table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    pub key: String,
    pub label: String,
}

fn default_modes() -> Vec<ModeConfig> {
    [
        ("explore", "Explore"),
        ("practice", "Practice"),
        ("assess", "Assess"),
        ("reflect", "Reflect"),
    ]
    .into_iter()
    .map(|(key, label)| ModeConfig {
        key: key.to_string(),
        label: label.to_string(),
    })
    .collect()
}
