// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Milestone-triggered note synthesis.
//!
//! Notes are a derived cache: at every milestone the whole history is
//! re-summarized and the chat's single artifact is overwritten. A chat of
//! `n` messages therefore causes at most `n / interval` generation calls.

use std::sync::Arc;
use std::time::Duration;

use stepwise_config::model::NotesConfig;
use stepwise_core::types::{GenerationRequest, NoteArtifact};
use stepwise_core::{ChatDirectory, MessageStream, NoteStore, StepwiseError, TextGeneration};
use tracing::{debug, info, warn};

use crate::generation::complete_within;
use crate::metrics;
use crate::milestone::MilestoneDetector;
use crate::prompts::{NOTES_SYSTEM_PROMPT, notes_prompt};

/// (Re)computes a chat's note artifact when a milestone is crossed.
pub struct NoteSynthesizer {
    messages: Arc<dyn MessageStream>,
    chats: Arc<dyn ChatDirectory>,
    notes: Arc<dyn NoteStore>,
    generator: Arc<dyn TextGeneration>,
    detector: MilestoneDetector,
    max_tokens: u32,
    timeout: Duration,
}

impl NoteSynthesizer {
    pub fn new(
        messages: Arc<dyn MessageStream>,
        chats: Arc<dyn ChatDirectory>,
        notes: Arc<dyn NoteStore>,
        generator: Arc<dyn TextGeneration>,
        config: &NotesConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            messages,
            chats,
            notes,
            generator,
            detector: MilestoneDetector::new(config.milestone_interval),
            max_tokens: config.max_tokens,
            timeout,
        }
    }

    /// Regenerate the chat's notes if it sits on a milestone not yet covered.
    ///
    /// Returns true only when a new artifact was written. Every failure is
    /// logged and reported as false; nothing partial is ever stored.
    pub async fn synthesize_or_refresh(&self, chat_id: &str) -> bool {
        match self.try_synthesize(chat_id).await {
            Ok(written) => written,
            Err(e) => {
                if e.is_generation_failure() {
                    metrics::record_generation_failure("notes");
                }
                metrics::record_note_failed();
                warn!(chat_id, error = %e, "note synthesis failed (non-fatal)");
                false
            }
        }
    }

    async fn try_synthesize(&self, chat_id: &str) -> Result<bool, StepwiseError> {
        let count = self.messages.count_by_chat(chat_id).await?;
        if !self.detector.at_milestone(count) {
            return Ok(false);
        }

        let existing = self.notes.get_note(chat_id).await?;
        if let Some(note) = &existing {
            if note.watermark >= count {
                debug!(chat_id, count, watermark = note.watermark, "notes already current");
                return Ok(false);
            }
        }

        let room_id = match existing {
            Some(note) => note.room_id,
            None => self
                .chats
                .chat(chat_id)
                .await?
                .map(|chat| chat.room_id)
                .ok_or_else(|| StepwiseError::Validation(format!("unknown chat {chat_id}")))?,
        };

        let history = self.messages.list_by_chat(chat_id, None).await?;
        let request = GenerationRequest {
            prompt: notes_prompt(&history),
            system_prompt: NOTES_SYSTEM_PROMPT.to_string(),
            max_tokens: self.max_tokens,
        };
        let response = complete_within(self.generator.as_ref(), request, self.timeout).await?;

        let content = response.text.trim();
        if content.is_empty() {
            return Err(StepwiseError::MalformedOutput(
                "empty notes output".to_string(),
            ));
        }
        if response.truncated {
            warn!(chat_id, count, "notes output truncated at max_tokens");
        }

        let note = NoteArtifact {
            chat_id: chat_id.to_string(),
            room_id,
            content: content.to_string(),
            watermark: count,
            generated_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        };
        let written = self.notes.upsert_note(&note).await?;
        if written {
            metrics::record_note_generated();
            info!(
                chat_id,
                room_id = %note.room_id,
                watermark = count,
                "note artifact written"
            );
        }
        Ok(written)
    }
}
