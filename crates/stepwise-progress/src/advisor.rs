// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Readiness recommendations and the pointer to a room's next step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepwise_config::model::{HeuristicConfig, SuggestionsConfig};
use stepwise_core::types::{Chat, ModeStep, NextStep};
use stepwise_core::{MessageStream, RoomModeSequence, StepwiseError};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::metrics;
use crate::rubric::{CriterionResult, ReadinessKind, RubricOutcome, RubricScorer};

/// Where a recommendation's readiness came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssessmentBasis {
    /// Scored against the room's rubric.
    Rubric,
    /// Message-count fallback; no rubric is configured.
    Heuristic,
}

/// Readiness judgement for a chat plus where it could go next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: ReadinessKind,
    /// In [0, 1].
    pub confidence: f64,
    pub suggestions: Vec<String>,
    /// `None` when the chat's mode is the last step (or not in the sequence).
    pub next_step: Option<NextStep>,
    pub basis: AssessmentBasis,
    /// Weighted rubric score; `None` for heuristic recommendations.
    pub overall: Option<f64>,
    pub threshold: Option<f64>,
    pub criteria: Vec<CriterionResult>,
}

impl Recommendation {
    /// Whether the suggestion gate should be consulted at all.
    pub fn is_eligible(&self) -> bool {
        self.kind == ReadinessKind::Ready && self.next_step.is_some()
    }
}

/// Combines rubric (or heuristic) readiness with the room's step sequence.
pub struct ProgressionAdvisor {
    scorer: RubricScorer,
    messages: Arc<dyn MessageStream>,
    sequence: Arc<dyn RoomModeSequence>,
    heuristic: HeuristicConfig,
    link_template: String,
}

impl ProgressionAdvisor {
    pub fn new(
        scorer: RubricScorer,
        messages: Arc<dyn MessageStream>,
        sequence: Arc<dyn RoomModeSequence>,
        heuristic: &HeuristicConfig,
        suggestions: &SuggestionsConfig,
    ) -> Self {
        Self {
            scorer,
            messages,
            sequence,
            heuristic: heuristic.clone(),
            link_template: suggestions.link_template.clone(),
        }
    }

    /// Recommendation for the chat's current mode, or `None` if it could not
    /// be computed this turn.
    pub async fn recommend(&self, chat: &Chat) -> Option<Recommendation> {
        match self.try_recommend(chat).await {
            Ok(recommendation) => Some(recommendation),
            Err(e) => {
                if e.is_generation_failure() {
                    metrics::record_generation_failure("rubric");
                }
                warn!(
                    chat_id = %chat.id,
                    room_id = %chat.room_id,
                    mode = %chat.mode,
                    error = %e,
                    "recommendation unavailable this turn (non-fatal)"
                );
                None
            }
        }
    }

    async fn try_recommend(&self, chat: &Chat) -> Result<Recommendation, StepwiseError> {
        let transcript = self
            .messages
            .list_by_chat(&chat.id, Some(self.scorer.transcript_turns()))
            .await?;
        let outcome = self
            .scorer
            .assess(&chat.room_id, &chat.mode, &transcript)
            .await?;
        let next_step = self.next_step(chat).await;

        let recommendation = match outcome {
            RubricOutcome::Assessed(assessment) => Recommendation {
                kind: assessment.kind,
                confidence: assessment.confidence(),
                suggestions: assessment.suggestions,
                next_step,
                basis: AssessmentBasis::Rubric,
                overall: Some(assessment.overall),
                threshold: Some(assessment.threshold),
                criteria: assessment.criteria,
            },
            RubricOutcome::NoRubric => {
                let count = self.messages.count_by_chat(&chat.id).await?;
                let (kind, confidence) = heuristic_readiness(count, &self.heuristic);
                Recommendation {
                    kind,
                    confidence,
                    suggestions: heuristic_suggestions(kind),
                    next_step,
                    basis: AssessmentBasis::Heuristic,
                    overall: None,
                    threshold: None,
                    criteria: Vec::new(),
                }
            }
        };

        metrics::record_assessment(&recommendation.basis.to_string());
        debug!(
            chat_id = %chat.id,
            mode = %chat.mode,
            kind = %recommendation.kind,
            basis = %recommendation.basis,
            confidence = recommendation.confidence,
            "recommendation computed"
        );
        Ok(recommendation)
    }

    async fn next_step(&self, chat: &Chat) -> Option<NextStep> {
        match self.sequence.ordered_modes(&chat.room_id).await {
            Ok(steps) => next_step_for(&steps, &chat.mode, &chat.room_id, &self.link_template),
            Err(e) => {
                warn!(room_id = %chat.room_id, error = %e, "mode sequence unavailable");
                None
            }
        }
    }
}

/// The step after `current` in `steps`, with its link rendered.
///
/// `None` when `current` is the last step or not part of the sequence.
pub fn next_step_for(
    steps: &[ModeStep],
    current: &str,
    room_id: &str,
    link_template: &str,
) -> Option<NextStep> {
    let position = steps.iter().position(|s| s.key == current)?;
    let next = steps.get(position + 1)?;
    Some(NextStep {
        key: next.key.clone(),
        label: next.label.clone(),
        link: link_template
            .replace("{room_id}", room_id)
            .replace("{mode}", &next.key),
    })
}

/// Message-count readiness for rooms without a rubric.
pub fn heuristic_readiness(count: u32, config: &HeuristicConfig) -> (ReadinessKind, f64) {
    let kind = if count >= config.ready_at {
        ReadinessKind::Ready
    } else if count >= config.almost_ready_at {
        ReadinessKind::AlmostReady
    } else {
        ReadinessKind::NotReady
    };
    let confidence = if config.ready_at == 0 {
        1.0
    } else {
        (f64::from(count) / f64::from(config.ready_at)).min(1.0)
    };
    (kind, confidence)
}

fn heuristic_suggestions(kind: ReadinessKind) -> Vec<String> {
    let text: &[&str] = match kind {
        ReadinessKind::Ready => &["Summarize what you have learned before moving on."],
        ReadinessKind::AlmostReady => &["Try explaining the main idea in your own words."],
        ReadinessKind::NotReady => &["Ask a follow-up question about something unclear."],
    };
    text.iter().map(|s| s.to_string()).collect()
}
