// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command returns its result as a JSON value; `main` prints it.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use stepwise_anthropic::AnthropicGeneration;
use stepwise_config::StepwiseConfig;
use stepwise_core::types::{Chat, SuggestionEventType};
use stepwise_core::{ChatDirectory, NoteStore, StepwiseError, SuggestionLog};
use stepwise_progress::{
    Collaborators, ContextAggregator, GateDecision, ProgressionEngine, SuggestionGate,
};
use stepwise_storage::{SqliteModeSequence, SqliteStore};

fn to_json<T: Serialize>(value: &T) -> Result<Value, StepwiseError> {
    serde_json::to_value(value).map_err(|e| StepwiseError::Internal(e.to_string()))
}

async fn open_store(config: &StepwiseConfig) -> Result<SqliteStore, StepwiseError> {
    SqliteStore::open(&config.storage).await
}

async fn require_chat(store: &SqliteStore, chat_id: &str) -> Result<Chat, StepwiseError> {
    store
        .chat(chat_id)
        .await?
        .ok_or_else(|| StepwiseError::Validation(format!("unknown chat `{chat_id}`")))
}

/// Wire the full engine over `store` with the Anthropic backend.
fn build_engine(
    config: &StepwiseConfig,
    store: &SqliteStore,
) -> Result<ProgressionEngine, StepwiseError> {
    let generator = Arc::new(AnthropicGeneration::new(&config.generation)?);
    let shared = Arc::new(store.clone());
    let modes = Arc::new(SqliteModeSequence::new(
        store.database().clone(),
        config.mode_table(),
    ));
    Ok(ProgressionEngine::new(
        config,
        Collaborators {
            messages: shared.clone(),
            chats: shared.clone(),
            notes: shared.clone(),
            rubrics: shared.clone(),
            modes,
            states: shared.clone(),
            events: shared,
            generator,
        },
    ))
}

pub fn config_summary(config: &StepwiseConfig) -> Value {
    json!({
        "valid": true,
        "database_path": config.storage.database_path,
        "model": config.generation.model,
        "api_key_configured": config.generation.api_key.is_some(),
        "milestone_interval": config.notes.milestone_interval,
        "default_threshold": config.rubric.default_threshold,
        "modes": config.modes.iter().map(|m| m.key.as_str()).collect::<Vec<_>>(),
    })
}

pub async fn migrate(config: &StepwiseConfig) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let version = store.database().schema_version().await?;
    store.database().clone().close().await?;
    Ok(json!({
        "database_path": config.storage.database_path,
        "schema_version": version,
    }))
}

pub async fn notes(config: &StepwiseConfig, chat_id: &str) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let engine = build_engine(config, &store)?;
    let written = engine.on_message_appended(chat_id).await;
    let note = store.get_note(chat_id).await?;
    Ok(json!({
        "chat_id": chat_id,
        "written": written,
        "note": to_json(&note)?,
    }))
}

pub async fn context(
    config: &StepwiseConfig,
    room_id: &str,
    exclude: Option<&str>,
) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let aggregator = ContextAggregator::new(Arc::new(store));
    let aggregate = aggregator.aggregate_for_room(room_id, exclude).await;
    Ok(json!({ "room_id": room_id, "context": aggregate }))
}

pub async fn recommend(config: &StepwiseConfig, chat_id: &str) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let chat = require_chat(&store, chat_id).await?;
    let engine = build_engine(config, &store)?;
    to_json(&engine.advisor().recommend(&chat).await)
}

pub async fn gate(
    config: &StepwiseConfig,
    chat_id: &str,
    mode: &str,
) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let chat = require_chat(&store, chat_id).await?;
    let shared = Arc::new(store);
    let GateDecision { show, state } = SuggestionGate::new(shared.clone(), shared)
        .evaluate(&chat, mode)
        .await;
    Ok(json!({ "show": show, "state": to_json(&state)? }))
}

pub async fn turn(
    config: &StepwiseConfig,
    chat_id: &str,
    message_id: &str,
) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    let chat = require_chat(&store, chat_id).await?;
    let engine = build_engine(config, &store)?;
    to_json(&engine.after_assistant_turn(&chat, message_id).await)
}

pub async fn respond(
    config: &StepwiseConfig,
    chat_id: &str,
    response: &str,
    message_id: Option<&str>,
) -> Result<Value, StepwiseError> {
    let response = match SuggestionEventType::from_str(response) {
        Ok(SuggestionEventType::Shown) | Err(_) => {
            return Err(StepwiseError::Validation(format!(
                "response must be `accepted` or `dismissed`, got `{response}`"
            )));
        }
        Ok(kind) => kind,
    };
    let store = open_store(config).await?;
    let chat = require_chat(&store, chat_id).await?;
    let shared = Arc::new(store);
    let recorded = SuggestionGate::new(shared.clone(), shared)
        .record_response(&chat, response, message_id)
        .await;
    Ok(json!({ "chat_id": chat_id, "response": response, "recorded": recorded }))
}

pub async fn events(config: &StepwiseConfig, chat_id: &str) -> Result<Value, StepwiseError> {
    let store = open_store(config).await?;
    to_json(&store.events_for_chat(chat_id).await?)
}
