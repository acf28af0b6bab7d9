// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for the "advance to next step" suggestion.
//!
//! The gate only controls how often an eligible suggestion is shown. Per
//! (chat, mode) it shows on the first eligible turn, then after 2, 4, 8, ...
//! further eligible turns: turns 1, 3, 7, 15, 31 and so on. Switching mode
//! resets the backoff.
//!
//! State writes are compare-and-swap on the row version; a lost race is
//! re-evaluated against the winner's state.

use std::sync::Arc;

use stepwise_core::types::{Chat, ProgressionState, SuggestionEvent, SuggestionEventType};
use stepwise_core::{ProgressionStore, StepwiseError, SuggestionLog};
use tracing::{debug, info, warn};

use crate::metrics;

/// Re-evaluations allowed after losing a compare-and-swap race.
pub const MAX_CONFLICT_RETRIES: usize = 3;

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub show: bool,
    /// The persisted state, or `None` if it could not be saved.
    pub state: Option<ProgressionState>,
}

impl GateDecision {
    fn hidden() -> Self {
        Self {
            show: false,
            state: None,
        }
    }
}

/// Turn details recorded alongside the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnInfo<'a> {
    /// The assistant message the suggestion would attach to.
    pub message_id: Option<&'a str>,
    pub confidence: Option<f64>,
}

/// One step of the backoff state machine.
///
/// Returns whether to show now and the next state. A state recorded for a
/// different mode is reset first; the reset state carries version 0.
pub fn advance(state: &ProgressionState, current_mode: &str) -> (bool, ProgressionState) {
    let mut next = if state.mode == current_mode {
        state.clone()
    } else {
        ProgressionState::fresh(state.chat_id.clone(), current_mode)
    };

    if !next.shown_once {
        next.shown_once = true;
        next.cooldown = 2;
        next.since = 0;
        return (true, next);
    }

    next.since = next.since.saturating_add(1);
    if next.since >= next.cooldown {
        next.cooldown = next.cooldown.saturating_mul(2);
        next.since = 0;
        (true, next)
    } else {
        (false, next)
    }
}

/// Persisted suggestion gate.
pub struct SuggestionGate {
    states: Arc<dyn ProgressionStore>,
    log: Arc<dyn SuggestionLog>,
}

impl SuggestionGate {
    pub fn new(states: Arc<dyn ProgressionStore>, log: Arc<dyn SuggestionLog>) -> Self {
        Self { states, log }
    }

    /// Evaluate the gate for `mode` with no turn details.
    pub async fn evaluate(&self, chat: &Chat, mode: &str) -> GateDecision {
        self.evaluate_with(chat, mode, TurnInfo::default()).await
    }

    /// Evaluate the gate once for an eligible assistant turn.
    ///
    /// Any persistence failure hides the suggestion for this turn.
    pub async fn evaluate_with(&self, chat: &Chat, mode: &str, turn: TurnInfo<'_>) -> GateDecision {
        for attempt in 0..=MAX_CONFLICT_RETRIES {
            match self.try_evaluate(chat, mode, turn).await {
                Ok(decision) => {
                    if decision.show {
                        self.record_shown(chat, mode, turn.message_id).await;
                    }
                    return decision;
                }
                Err(StepwiseError::Conflict { .. }) => {
                    debug!(chat_id = %chat.id, mode, attempt, "progression state changed concurrently, retrying");
                }
                Err(e) => {
                    warn!(chat_id = %chat.id, mode, error = %e, "suggestion gate unavailable (non-fatal)");
                    return GateDecision::hidden();
                }
            }
        }
        warn!(
            chat_id = %chat.id,
            mode,
            retries = MAX_CONFLICT_RETRIES,
            "gave up on contended progression state (non-fatal)"
        );
        GateDecision::hidden()
    }

    async fn try_evaluate(
        &self,
        chat: &Chat,
        mode: &str,
        turn: TurnInfo<'_>,
    ) -> Result<GateDecision, StepwiseError> {
        let base = self
            .states
            .load_active_state(&chat.id)
            .await?
            .unwrap_or_else(|| ProgressionState::fresh(chat.id.clone(), mode));

        let (show, mut next) = advance(&base, mode);
        if base.mode != mode {
            debug!(chat_id = %chat.id, from = %base.mode, to = mode, "mode changed, backoff reset");
            // The reset state overwrites whatever row this mode had before.
            next.version = self
                .states
                .load_state(&chat.id, mode)
                .await?
                .map_or(0, |s| s.version);
        }

        if let Some(confidence) = turn.confidence {
            next.last_confidence = Some(confidence);
        }
        if show {
            next.last_shown_message_id = turn.message_id.map(str::to_string);
        }

        next.version = self.states.save_state(&next).await?;
        Ok(GateDecision {
            show,
            state: Some(next),
        })
    }

    async fn record_shown(&self, chat: &Chat, mode: &str, message_id: Option<&str>) {
        metrics::record_suggestion_shown();
        info!(chat_id = %chat.id, mode, "next-step suggestion shown");
        if let Err(e) = self
            .append(chat, mode, SuggestionEventType::Shown, message_id)
            .await
        {
            warn!(chat_id = %chat.id, mode, error = %e, "suggestion event not recorded (non-fatal)");
        }
    }

    /// Record the learner accepting or dismissing the suggestion.
    ///
    /// Returns whether the event was stored. `Shown` events are only ever
    /// written by the gate itself and are rejected here.
    pub async fn record_response(
        &self,
        chat: &Chat,
        response: SuggestionEventType,
        message_id: Option<&str>,
    ) -> bool {
        if response == SuggestionEventType::Shown {
            warn!(chat_id = %chat.id, "shown events cannot be recorded as a response");
            return false;
        }
        match self.append(chat, &chat.mode, response, message_id).await {
            Ok(()) => {
                info!(chat_id = %chat.id, mode = %chat.mode, response = %response, "suggestion response recorded");
                true
            }
            Err(e) => {
                warn!(chat_id = %chat.id, error = %e, "suggestion response not recorded (non-fatal)");
                false
            }
        }
    }

    async fn append(
        &self,
        chat: &Chat,
        mode: &str,
        event_type: SuggestionEventType,
        message_id: Option<&str>,
    ) -> Result<(), StepwiseError> {
        let event = SuggestionEvent {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat.id.clone(),
            mode: mode.to_string(),
            event_type,
            user_id: chat.user_id.clone(),
            message_id: message_id.map(str::to_string),
            created_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        };
        self.log.append_event(&event).await
    }
}
