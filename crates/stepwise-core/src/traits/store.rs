// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence of the engine's derived state.

use async_trait::async_trait;

use crate::error::StepwiseError;
use crate::types::{NoteArtifact, ProgressionState, SuggestionEvent};

/// One [`NoteArtifact`] per chat.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get_note(&self, chat_id: &str) -> Result<Option<NoteArtifact>, StepwiseError>;

    /// Creates or overwrites the chat's artifact in one atomic write.
    ///
    /// Returns `false` when a stored artifact already carries a higher
    /// watermark; the stored artifact is then left untouched.
    async fn upsert_note(&self, note: &NoteArtifact) -> Result<bool, StepwiseError>;

    /// All artifacts of a room ordered by `generated_at` ascending.
    async fn notes_for_room(
        &self,
        room_id: &str,
        exclude_chat_id: Option<&str>,
    ) -> Result<Vec<NoteArtifact>, StepwiseError>;
}

/// One [`ProgressionState`] row per (chat, mode).
#[async_trait]
pub trait ProgressionStore: Send + Sync {
    async fn load_state(
        &self,
        chat_id: &str,
        mode: &str,
    ) -> Result<Option<ProgressionState>, StepwiseError>;

    /// The most recently saved state of the chat, whatever its mode.
    async fn load_active_state(
        &self,
        chat_id: &str,
    ) -> Result<Option<ProgressionState>, StepwiseError>;

    /// Compare-and-swap on `state.version`.
    ///
    /// Returns the new version, or [`StepwiseError::Conflict`] when the
    /// stored version no longer matches.
    async fn save_state(&self, state: &ProgressionState) -> Result<u64, StepwiseError>;
}

/// Append-only suggestion audit log.
#[async_trait]
pub trait SuggestionLog: Send + Sync {
    async fn append_event(&self, event: &SuggestionEvent) -> Result<(), StepwiseError>;

    async fn events_for_chat(&self, chat_id: &str)
    -> Result<Vec<SuggestionEvent>, StepwiseError>;
}
