// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The engine consumes every external capability through these traits and
//! uses `#[async_trait]` for dynamic dispatch compatibility.

pub mod catalog;
pub mod generation;
pub mod history;
pub mod store;

pub use catalog::{RoomModeSequence, RubricRepository};
pub use generation::TextGeneration;
pub use history::{ChatDirectory, MessageStream};
pub use store::{NoteStore, ProgressionStore, SuggestionLog};
