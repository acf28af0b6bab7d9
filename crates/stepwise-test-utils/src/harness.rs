// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` wires a temp-file SQLite database and a [`MockGeneration`]
//! into a complete [`ProgressionEngine`], plus helpers to seed chats,
//! messages and room configuration.

use std::sync::Arc;

use stepwise_config::StepwiseConfig;
use stepwise_config::model::StorageConfig;
use stepwise_core::types::{Chat, Message, ModeStep, Role, RubricCriterion};
use stepwise_core::{MessageStream, StepwiseError};
use stepwise_progress::{Collaborators, ProgressionEngine};
use stepwise_storage::{SqliteModeSequence, SqliteStore, queries};

use crate::mock_generation::MockGeneration;

/// Builder for test environments.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: StepwiseConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: StepwiseConfig::default(),
        }
    }

    /// Queue mock generation outputs.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Start from a custom configuration. The storage section is replaced.
    pub fn with_config(mut self, config: StepwiseConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<TestHarness, StepwiseError> {
        let temp_dir = tempfile::TempDir::new().map_err(StepwiseError::persistence)?;
        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };

        let store = SqliteStore::open(&config.storage).await?;
        let generation = MockGeneration::with_responses(self.responses);

        let shared = Arc::new(store.clone());
        let modes = Arc::new(SqliteModeSequence::new(
            store.database().clone(),
            config.mode_table(),
        ));
        let engine = ProgressionEngine::new(
            &config,
            Collaborators {
                messages: shared.clone(),
                chats: shared.clone(),
                notes: shared.clone(),
                rubrics: shared.clone(),
                modes,
                states: shared.clone(),
                events: shared,
                generator: Arc::new(generation.clone()),
            },
        );

        Ok(TestHarness {
            generation,
            store,
            engine,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired engine over a throwaway database.
pub struct TestHarness {
    pub generation: MockGeneration,
    pub store: SqliteStore,
    pub engine: ProgressionEngine,
    pub config: StepwiseConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn new() -> Result<Self, StepwiseError> {
        Self::builder().build().await
    }

    /// Register a chat owned by `learner-1`.
    pub async fn create_chat(
        &self,
        chat_id: &str,
        room_id: &str,
        mode: &str,
    ) -> Result<Chat, StepwiseError> {
        let chat = Chat {
            id: chat_id.to_string(),
            room_id: room_id.to_string(),
            mode: mode.to_string(),
            user_id: Some("learner-1".to_string()),
        };
        queries::chats::upsert_chat(self.store.database(), &chat).await?;
        Ok(chat)
    }

    /// Move a chat to another mode and return its updated record.
    pub async fn switch_mode(&self, chat: &Chat, mode: &str) -> Result<Chat, StepwiseError> {
        queries::chats::set_chat_mode(self.store.database(), &chat.id, mode).await?;
        Ok(Chat {
            mode: mode.to_string(),
            ..chat.clone()
        })
    }

    /// Append `n` alternating user/assistant messages, without running the engine.
    ///
    /// Returns the id of the last appended message.
    pub async fn append_messages(&self, chat_id: &str, n: u32) -> Result<String, StepwiseError> {
        let start = self.store.count_by_chat(chat_id).await?;
        let mut last_id = String::new();
        for i in start + 1..=start + n {
            let message = Message {
                id: format!("{chat_id}-m{i}"),
                chat_id: chat_id.to_string(),
                role: if i % 2 == 1 { Role::User } else { Role::Assistant },
                content: format!("message {i} of {chat_id}"),
                created_at: format!("2026-03-01T{:02}:{:02}:00.000Z", i / 60, i % 60),
            };
            queries::messages::insert_message(self.store.database(), &message).await?;
            last_id = message.id;
        }
        Ok(last_id)
    }

    /// Append `n` messages, notifying the engine after each one like a host would.
    ///
    /// Returns how many note artifacts were written.
    pub async fn append_and_process(&self, chat_id: &str, n: u32) -> Result<u32, StepwiseError> {
        let mut written = 0;
        for _ in 0..n {
            self.append_messages(chat_id, 1).await?;
            if self.engine.on_message_appended(chat_id).await {
                written += 1;
            }
        }
        Ok(written)
    }

    pub async fn set_rubric(
        &self,
        room_id: &str,
        mode: &str,
        criteria: &[RubricCriterion],
    ) -> Result<(), StepwiseError> {
        queries::rubrics::replace_rubric(self.store.database(), room_id, mode, criteria).await
    }

    pub async fn set_threshold(
        &self,
        room_id: &str,
        mode: &str,
        threshold: f64,
    ) -> Result<(), StepwiseError> {
        queries::rubrics::set_threshold(self.store.database(), room_id, mode, Some(threshold)).await
    }

    pub async fn set_room_modes(
        &self,
        room_id: &str,
        steps: &[ModeStep],
    ) -> Result<(), StepwiseError> {
        queries::modes::set_room_modes(self.store.database(), room_id, steps).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_seeds_and_counts_messages() {
        let harness = TestHarness::new().await.unwrap();
        harness.create_chat("c1", "r1", "explore").await.unwrap();
        let last = harness.append_messages("c1", 3).await.unwrap();
        assert_eq!(last, "c1-m3");
        let last = harness.append_messages("c1", 2).await.unwrap();
        assert_eq!(last, "c1-m5");
        assert_eq!(harness.store.count_by_chat("c1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn harness_uses_temp_file_database() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.config.storage.database_path.ends_with("test.db"));
    }
}
