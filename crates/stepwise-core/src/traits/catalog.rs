// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-room configuration: rubrics and the ordered step sequence.

use async_trait::async_trait;

use crate::error::StepwiseError;
use crate::types::{ModeStep, RubricCriterion};

/// Source of rubric criteria configured per (room, mode).
#[async_trait]
pub trait RubricRepository: Send + Sync {
    /// Ordered criteria for the pair. Empty when no rubric is configured.
    async fn criteria_for(
        &self,
        room_id: &str,
        mode: &str,
    ) -> Result<Vec<RubricCriterion>, StepwiseError>;

    /// Readiness threshold override for the pair, if any.
    async fn threshold_for(&self, room_id: &str, mode: &str)
    -> Result<Option<f64>, StepwiseError>;
}

/// The ordered steps a room moves learners through.
#[async_trait]
pub trait RoomModeSequence: Send + Sync {
    async fn ordered_modes(&self, room_id: &str) -> Result<Vec<ModeStep>, StepwiseError>;
}
