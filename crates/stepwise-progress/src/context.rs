// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room-level context built from the note artifacts of its chats.
//!
//! Read-only: the aggregate is eventually consistent with the latest
//! successful note write and never mutates anything.

use std::fmt::Write;
use std::sync::Arc;

use stepwise_core::NoteStore;
use stepwise_core::types::{Chat, NoteArtifact};
use tracing::{debug, warn};

/// Concatenates a room's artifacts, oldest first.
pub struct ContextAggregator {
    notes: Arc<dyn NoteStore>,
}

impl ContextAggregator {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    /// All artifacts of `room_id` (minus `exclude_chat_id`) as one text,
    /// or `None` when there are none or they cannot be read.
    pub async fn aggregate_for_room(
        &self,
        room_id: &str,
        exclude_chat_id: Option<&str>,
    ) -> Option<String> {
        match self.notes.notes_for_room(room_id, exclude_chat_id).await {
            Ok(notes) => {
                debug!(room_id, artifacts = notes.len(), "aggregating room notes");
                render_aggregate(&notes)
            }
            Err(e) => {
                warn!(room_id, error = %e, "failed to load room notes (non-fatal)");
                None
            }
        }
    }

    /// The room aggregate wrapped for prepending to a new chat's system prompt.
    pub async fn preamble_for_chat(&self, chat: &Chat) -> Option<String> {
        let aggregate = self
            .aggregate_for_room(&chat.room_id, Some(&chat.id))
            .await?;
        Some(format!(
            "<prior_sessions>\nNotes from the learner's earlier conversations in this room, \
             oldest first. Build on them instead of repeating covered ground.\n\n\
             {aggregate}</prior_sessions>"
        ))
    }
}

/// Header-delimited concatenation of `notes` in the given order.
pub fn render_aggregate(notes: &[NoteArtifact]) -> Option<String> {
    if notes.is_empty() {
        return None;
    }
    let total = notes.len();
    let mut out = String::new();
    for (i, note) in notes.iter().enumerate() {
        let _ = writeln!(
            out,
            "### Session {} of {total} (notes as of {})\n{}\n",
            i + 1,
            note.generated_at,
            note.content.trim()
        );
    }
    Some(out)
}
