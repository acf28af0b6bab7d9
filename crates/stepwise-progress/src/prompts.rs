// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates for note synthesis and rubric assessment.

use std::fmt::Write;

use stepwise_core::types::{Message, Role, RubricCriterion};

/// System prompt for milestone notes.
pub const NOTES_SYSTEM_PROMPT: &str = "You keep study notes for a learner working through a \
guided conversation. Write notes another tutor could pick up cold: the topics covered, what \
the learner understands, open misconceptions, and questions left unanswered. Use short \
markdown bullet lists. Do not address the learner.";

/// System prompt for rubric assessment.
pub const RUBRIC_SYSTEM_PROMPT: &str = "You are an assessor scoring a learner's recent \
conversation against a rubric. Score only what the transcript shows. Respond with a single \
JSON object and nothing else.";

/// Render messages as a plain transcript, one block per message.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        let speaker = match message.role {
            Role::User => "Learner",
            Role::Assistant => "Tutor",
        };
        let _ = writeln!(out, "{speaker}: {}\n", message.content.trim());
    }
    out
}

/// Prompt for regenerating a chat's notes from its full history.
pub fn notes_prompt(messages: &[Message]) -> String {
    format!(
        "Summarize the conversation below into study notes.\n\n\
         <conversation>\n{}</conversation>\n\n\
         Notes:",
        render_transcript(messages)
    )
}

/// Prompt asking for one score per criterion plus suggestions.
pub fn rubric_prompt(criteria: &[RubricCriterion], transcript: &[Message]) -> String {
    let mut rubric = String::new();
    for criterion in criteria {
        let _ = writeln!(rubric, "- {} (weight {})", criterion.name, criterion.weight);
        for level in &criterion.levels {
            let _ = writeln!(rubric, "    {}: {}", level.score, level.description);
        }
    }

    format!(
        "Rubric (score every criterion with an integer from 1 to 4):\n{rubric}\n\
         <transcript>\n{}</transcript>\n\n\
         Respond with JSON exactly in this shape:\n\
         {{\"criteria\": [{{\"name\": \"<criterion name>\", \"score\": <1-4>, \
         \"rationale\": \"<one sentence>\"}}], \
         \"suggestions\": [\"<short suggestion>\"]}}",
        render_transcript(transcript)
    )
}
