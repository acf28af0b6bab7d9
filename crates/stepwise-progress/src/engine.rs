// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn-processing facade over the progression components.
//!
//! A host calls [`ProgressionEngine::on_message_appended`] after every stored
//! message, [`ProgressionEngine::context_for_new_chat`] when a chat starts and
//! [`ProgressionEngine::after_assistant_turn`] after every assistant reply.

use std::sync::Arc;

use serde::Serialize;
use stepwise_config::StepwiseConfig;
use stepwise_core::types::{Chat, NextStep, SuggestionEventType};
use stepwise_core::{
    ChatDirectory, MessageStream, NoteStore, ProgressionStore, RoomModeSequence,
    RubricRepository, SuggestionLog, TextGeneration,
};
use tracing::warn;

use crate::advisor::{ProgressionAdvisor, Recommendation};
use crate::context::ContextAggregator;
use crate::gate::{GateDecision, SuggestionGate, TurnInfo};
use crate::notes::NoteSynthesizer;
use crate::rubric::RubricScorer;

/// External collaborators the engine is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub messages: Arc<dyn MessageStream>,
    pub chats: Arc<dyn ChatDirectory>,
    pub notes: Arc<dyn NoteStore>,
    pub rubrics: Arc<dyn RubricRepository>,
    pub modes: Arc<dyn RoomModeSequence>,
    pub states: Arc<dyn ProgressionStore>,
    pub events: Arc<dyn SuggestionLog>,
    pub generator: Arc<dyn TextGeneration>,
}

/// What the host should render after an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub recommendation: Option<Recommendation>,
    /// Whether to surface the next-step suggestion this turn.
    pub show_suggestion: bool,
    /// Set only when `show_suggestion` is true.
    pub next_step: Option<NextStep>,
}

impl TurnOutcome {
    fn hidden(recommendation: Option<Recommendation>) -> Self {
        Self {
            recommendation,
            show_suggestion: false,
            next_step: None,
        }
    }
}

/// The wired progression engine.
pub struct ProgressionEngine {
    chats: Arc<dyn ChatDirectory>,
    notes: NoteSynthesizer,
    context: ContextAggregator,
    advisor: ProgressionAdvisor,
    gate: SuggestionGate,
}

impl ProgressionEngine {
    pub fn new(config: &StepwiseConfig, deps: Collaborators) -> Self {
        let timeout = config.generation.timeout();
        let notes = NoteSynthesizer::new(
            deps.messages.clone(),
            deps.chats.clone(),
            deps.notes.clone(),
            deps.generator.clone(),
            &config.notes,
            timeout,
        );
        let scorer = RubricScorer::new(deps.rubrics, deps.generator, &config.rubric, timeout);
        let advisor = ProgressionAdvisor::new(
            scorer,
            deps.messages,
            deps.modes,
            &config.heuristic,
            &config.suggestions,
        );

        Self {
            chats: deps.chats,
            notes,
            context: ContextAggregator::new(deps.notes),
            advisor,
            gate: SuggestionGate::new(deps.states, deps.events),
        }
    }

    /// Resolve a chat id, logging lookup failures.
    pub async fn chat(&self, chat_id: &str) -> Option<Chat> {
        match self.chats.chat(chat_id).await {
            Ok(chat) => chat,
            Err(e) => {
                warn!(chat_id, error = %e, "chat lookup failed (non-fatal)");
                None
            }
        }
    }

    /// Refresh the chat's notes if a milestone was just reached.
    pub async fn on_message_appended(&self, chat_id: &str) -> bool {
        self.notes.synthesize_or_refresh(chat_id).await
    }

    /// Cross-chat context for a chat that is just starting.
    pub async fn context_for_new_chat(&self, chat: &Chat) -> Option<String> {
        self.context.preamble_for_chat(chat).await
    }

    /// Recommend, then let the gate decide whether to surface it.
    pub async fn after_assistant_turn(&self, chat: &Chat, message_id: &str) -> TurnOutcome {
        let Some(recommendation) = self.advisor.recommend(chat).await else {
            return TurnOutcome::hidden(None);
        };
        if !recommendation.is_eligible() {
            return TurnOutcome::hidden(Some(recommendation));
        }

        let turn = TurnInfo {
            message_id: Some(message_id),
            confidence: Some(recommendation.confidence),
        };
        let GateDecision { show, .. } = self.gate.evaluate_with(chat, &chat.mode, turn).await;
        TurnOutcome {
            next_step: if show {
                recommendation.next_step.clone()
            } else {
                None
            },
            show_suggestion: show,
            recommendation: Some(recommendation),
        }
    }

    /// Record the learner's response to a shown suggestion.
    pub async fn record_response(
        &self,
        chat: &Chat,
        response: SuggestionEventType,
        message_id: Option<&str>,
    ) -> bool {
        self.gate.record_response(chat, response, message_id).await
    }

    pub fn notes(&self) -> &NoteSynthesizer {
        &self.notes
    }

    pub fn context(&self) -> &ContextAggregator {
        &self.context
    }

    pub fn advisor(&self) -> &ProgressionAdvisor {
        &self.advisor
    }

    pub fn gate(&self) -> &SuggestionGate {
        &self.gate
    }
}
