// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Stepwise progression engine.
//!
//! This crate provides the error taxonomy, the domain types shared by every
//! other crate, and the async traits through which the engine talks to its
//! collaborators (message history, text generation, rubric and mode
//! configuration, and the persistence of derived state).

pub mod error;
pub mod traits;
pub mod types;

pub use error::StepwiseError;
pub use traits::{
    ChatDirectory, MessageStream, NoteStore, ProgressionStore, RoomModeSequence,
    RubricRepository, SuggestionLog, TextGeneration,
};
pub use types::{
    Chat, GenerationRequest, GenerationResponse, Message, ModeStep, ModeTable, NextStep, NoteArtifact,
    ProgressionState, Role, RubricCriterion, RubricLevel, SuggestionEvent, SuggestionEventType,
};
