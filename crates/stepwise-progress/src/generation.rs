// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded single-shot calls to the text-generation capability.

use std::time::Duration;

use stepwise_core::types::{GenerationRequest, GenerationResponse};
use stepwise_core::{StepwiseError, TextGeneration};
use tracing::debug;

/// Make one generation call, failing with [`StepwiseError::Timeout`] if it
/// does not finish within `timeout`.
pub async fn complete_within(
    generator: &dyn TextGeneration,
    request: GenerationRequest,
    timeout: Duration,
) -> Result<GenerationResponse, StepwiseError> {
    debug!(
        backend = generator.name(),
        max_tokens = request.max_tokens,
        "generation call"
    );
    match tokio::time::timeout(timeout, generator.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(StepwiseError::Timeout { duration: timeout }),
    }
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGeneration;

    #[test]
    fn strips_json_fence() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn leaves_plain_text() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let generator = ScriptedGeneration::new(vec![]).with_delay(Duration::from_secs(120));
        let request = GenerationRequest {
            prompt: "p".into(),
            system_prompt: "s".into(),
            max_tokens: 10,
        };
        let err = complete_within(&generator, request, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StepwiseError::Timeout { .. }));
        assert!(err.is_generation_failure());
    }
}
