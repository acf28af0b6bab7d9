// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Stepwise progression engine.

use thiserror::Error;

/// The primary error type used across collaborator traits and engine internals.
///
/// Engine operations exposed to the turn-processing flow never return this
/// type; they downgrade it to a failure-shaped result after logging.
#[derive(Debug, Error)]
pub enum StepwiseError {
    /// Missing or unusable rubric/mode configuration for a room.
    #[error("validation error: {0}")]
    Validation(String),

    /// The text-generation capability failed (auth, network, rate limit, server error).
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The generation call did not finish within the configured timeout.
    #[error("generation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The generation call returned output that could not be used.
    #[error("malformed generation output: {0}")]
    MalformedOutput(String),

    /// Storage backend errors (connection, query failure, serialization).
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A compare-and-swap write lost against a concurrent writer.
    #[error("concurrent update of progression state for {chat_id}/{mode}")]
    Conflict { chat_id: String, mode: String },

    /// Configuration errors detected at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StepwiseError {
    /// Returns true for every failure of the outbound generation call.
    ///
    /// Timeouts and unusable output are recovered exactly like transport
    /// failures: the enhancement is skipped for this turn.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            StepwiseError::Generation { .. }
                | StepwiseError::Timeout { .. }
                | StepwiseError::MalformedOutput(_)
        )
    }

    /// Wraps any storage-layer error.
    pub fn persistence<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StepwiseError::Persistence {
            source: Box::new(err),
        }
    }
}
