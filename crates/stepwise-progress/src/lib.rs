// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progression and context synthesis for Stepwise chats.
//!
//! - [`NoteSynthesizer`] distills a chat into a note artifact at message milestones
//! - [`ContextAggregator`] concatenates a room's artifacts for new chats
//! - [`RubricScorer`] and [`ProgressionAdvisor`] judge readiness to advance
//! - [`SuggestionGate`] backs off how often the "next step" suggestion resurfaces
//!
//! [`ProgressionEngine`] wires these together for a turn-processing host.
//! None of the public operations return errors: failures are logged and the
//! feature is simply unavailable for that turn.

pub mod advisor;
pub mod context;
pub mod engine;
pub mod gate;
pub mod generation;
pub mod metrics;
pub mod milestone;
pub mod notes;
pub mod prompts;
pub mod rubric;

#[cfg(test)]
pub(crate) mod testing;

pub use advisor::{AssessmentBasis, ProgressionAdvisor, Recommendation};
pub use context::ContextAggregator;
pub use engine::{Collaborators, ProgressionEngine, TurnOutcome};
pub use gate::{GateDecision, SuggestionGate, TurnInfo};
pub use milestone::{MilestoneDetector, at_milestone};
pub use notes::NoteSynthesizer;
pub use rubric::{CriterionResult, ReadinessKind, RubricAssessment, RubricOutcome, RubricScorer};
