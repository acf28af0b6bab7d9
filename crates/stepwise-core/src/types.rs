// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Stepwise workspace.
//!
//! Timestamps are ISO 8601 strings in UTC with millisecond precision
//! (`2026-03-01T12:00:00.000Z`), which sort lexicographically.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message. Immutable and append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// The chat a turn belongs to, as resolved from the surrounding platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub room_id: String,
    /// Key of the step the chat is currently in (e.g. "explore").
    pub mode: String,
    /// Owner of the chat, recorded on suggestion events.
    pub user_id: Option<String>,
}

/// Derived per-chat summary, regenerated only at milestones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteArtifact {
    pub chat_id: String,
    pub room_id: String,
    pub content: String,
    /// Message count at which this artifact was generated. Never decreases.
    pub watermark: u32,
    /// ISO 8601 timestamp of the generation.
    pub generated_at: String,
}

/// One level of a rubric criterion's scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricLevel {
    pub score: u8,
    pub description: String,
}

/// A weighted criterion scored on a discrete 1-4 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub name: String,
    pub weight: f64,
    /// Ordered levels, at most four.
    pub levels: Vec<RubricLevel>,
}

impl RubricCriterion {
    /// Creates a criterion with no level descriptions.
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            levels: Vec::new(),
        }
    }

    /// Appends a level description.
    pub fn with_level(mut self, score: u8, description: impl Into<String>) -> Self {
        self.levels.push(RubricLevel {
            score,
            description: description.into(),
        });
        self
    }
}

/// A step of a room's ordered mode sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeStep {
    pub key: String,
    pub label: String,
}

impl ModeStep {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// An immutable, ordered table of steps.
///
/// Cheap to clone; the default table is built once from configuration and
/// handed to whoever resolves room sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTable(Arc<[ModeStep]>);

impl ModeTable {
    pub fn new(steps: Vec<ModeStep>) -> Self {
        Self(steps.into())
    }

    pub fn steps(&self) -> &[ModeStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pointer to the step a learner could advance to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub key: String,
    pub label: String,
    pub link: String,
}

/// Suggestion backoff state for one (chat, mode) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub chat_id: String,
    pub mode: String,
    pub shown_once: bool,
    /// Assistant turns that must elapse before the suggestion resurfaces. Always >= 1.
    pub cooldown: u32,
    /// Eligible turns elapsed since the suggestion was last shown.
    pub since: u32,
    pub last_confidence: Option<f64>,
    pub last_shown_message_id: Option<String>,
    /// Optimistic-concurrency version; 0 means the row was never persisted.
    pub version: u64,
}

impl ProgressionState {
    /// A freshly reset state for `mode`.
    pub fn fresh(chat_id: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            mode: mode.into(),
            shown_once: false,
            cooldown: 1,
            since: 0,
            last_confidence: None,
            last_shown_message_id: None,
            version: 0,
        }
    }
}

/// Kind of a suggestion audit event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuggestionEventType {
    /// The suggestion was surfaced to the learner.
    Shown,
    /// The learner followed the suggestion.
    Accepted,
    /// The learner dismissed the suggestion.
    Dismissed,
}

/// Append-only audit record for suggestion activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEvent {
    pub id: String,
    pub chat_id: String,
    pub mode: String,
    pub event_type: SuggestionEventType,
    pub user_id: Option<String>,
    pub message_id: Option<String>,
    pub created_at: String,
}

/// A single request to the text-generation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub max_tokens: u32,
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
    /// True when the output hit `max_tokens` before finishing.
    pub truncated: bool,
}
