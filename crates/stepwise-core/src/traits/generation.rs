// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation capability used for notes and rubric assessments.

use async_trait::async_trait;

use crate::error::StepwiseError;
use crate::types::{GenerationRequest, GenerationResponse};

/// A single-shot text completion backend.
///
/// Implementations make exactly one outbound attempt per call and fail with
/// [`StepwiseError::Generation`] on auth, network, rate-limit or server
/// errors. Callers apply their own timeout.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Returns a short identifier for logs.
    fn name(&self) -> &str;

    /// Completes `request.prompt` under `request.system_prompt`.
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, StepwiseError>;
}
