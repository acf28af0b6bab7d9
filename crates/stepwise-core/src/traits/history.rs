// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to chats and their message history, owned by the platform.

use async_trait::async_trait;

use crate::error::StepwiseError;
use crate::types::{Chat, Message};

/// Read-only view over a chat's append-only message history.
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Number of messages in the chat.
    async fn count_by_chat(&self, chat_id: &str) -> Result<u32, StepwiseError>;

    /// Messages in chronological order.
    ///
    /// With `limit`, returns only the most recent `limit` messages, still
    /// oldest first.
    async fn list_by_chat(
        &self,
        chat_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StepwiseError>;
}

/// Resolves a chat id to its room, mode and owner.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    async fn chat(&self, chat_id: &str) -> Result<Option<Chat>, StepwiseError>;
}
