// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the engine's collaborator traits.

use async_trait::async_trait;
use tracing::debug;

use stepwise_config::model::StorageConfig;
use stepwise_core::types::{
    Chat, Message, ModeStep, ModeTable, NoteArtifact, ProgressionState, RubricCriterion,
    SuggestionEvent,
};
use stepwise_core::{
    ChatDirectory, MessageStream, NoteStore, ProgressionStore, RoomModeSequence,
    RubricRepository, StepwiseError, SuggestionLog,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates every operation to the typed
/// query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, StepwiseError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MessageStream for SqliteStore {
    async fn count_by_chat(&self, chat_id: &str) -> Result<u32, StepwiseError> {
        queries::messages::count_by_chat(&self.db, chat_id).await
    }

    async fn list_by_chat(
        &self,
        chat_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StepwiseError> {
        queries::messages::list_by_chat(&self.db, chat_id, limit).await
    }
}

#[async_trait]
impl ChatDirectory for SqliteStore {
    async fn chat(&self, chat_id: &str) -> Result<Option<Chat>, StepwiseError> {
        queries::chats::get_chat(&self.db, chat_id).await
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn get_note(&self, chat_id: &str) -> Result<Option<NoteArtifact>, StepwiseError> {
        queries::notes::get_note(&self.db, chat_id).await
    }

    async fn upsert_note(&self, note: &NoteArtifact) -> Result<bool, StepwiseError> {
        let applied = queries::notes::upsert_note(&self.db, note).await?;
        if !applied {
            debug!(
                chat_id = %note.chat_id,
                watermark = note.watermark,
                "note write superseded by a newer watermark"
            );
        }
        Ok(applied)
    }

    async fn notes_for_room(
        &self,
        room_id: &str,
        exclude_chat_id: Option<&str>,
    ) -> Result<Vec<NoteArtifact>, StepwiseError> {
        queries::notes::notes_for_room(&self.db, room_id, exclude_chat_id).await
    }
}

#[async_trait]
impl ProgressionStore for SqliteStore {
    async fn load_state(
        &self,
        chat_id: &str,
        mode: &str,
    ) -> Result<Option<ProgressionState>, StepwiseError> {
        queries::progression::load_state(&self.db, chat_id, mode).await
    }

    async fn load_active_state(
        &self,
        chat_id: &str,
    ) -> Result<Option<ProgressionState>, StepwiseError> {
        queries::progression::load_active_state(&self.db, chat_id).await
    }

    async fn save_state(&self, state: &ProgressionState) -> Result<u64, StepwiseError> {
        queries::progression::save_state(&self.db, state).await
    }
}

#[async_trait]
impl SuggestionLog for SqliteStore {
    async fn append_event(&self, event: &SuggestionEvent) -> Result<(), StepwiseError> {
        queries::events::append_event(&self.db, event).await
    }

    async fn events_for_chat(
        &self,
        chat_id: &str,
    ) -> Result<Vec<SuggestionEvent>, StepwiseError> {
        queries::events::events_for_chat(&self.db, chat_id).await
    }
}

#[async_trait]
impl RubricRepository for SqliteStore {
    async fn criteria_for(
        &self,
        room_id: &str,
        mode: &str,
    ) -> Result<Vec<RubricCriterion>, StepwiseError> {
        queries::rubrics::criteria_for(&self.db, room_id, mode).await
    }

    async fn threshold_for(
        &self,
        room_id: &str,
        mode: &str,
    ) -> Result<Option<f64>, StepwiseError> {
        queries::rubrics::threshold_for(&self.db, room_id, mode).await
    }
}

/// Room sequences stored per room, falling back to the configured default table.
#[derive(Clone)]
pub struct SqliteModeSequence {
    db: Database,
    defaults: ModeTable,
}

impl SqliteModeSequence {
    pub fn new(db: Database, defaults: ModeTable) -> Self {
        Self { db, defaults }
    }
}

#[async_trait]
impl RoomModeSequence for SqliteModeSequence {
    async fn ordered_modes(&self, room_id: &str) -> Result<Vec<ModeStep>, StepwiseError> {
        let own = queries::modes::room_modes(&self.db, room_id).await?;
        if own.is_empty() {
            Ok(self.defaults.steps().to_vec())
        } else {
            Ok(own)
        }
    }
}
