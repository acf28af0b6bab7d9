// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suggestion backoff state with optimistic concurrency.
//!
//! Every save bumps `version` and stamps `touched_seq` with the chat's next
//! sequence number, so the most recently written mode can be found without
//! relying on wall-clock ordering.

use rusqlite::{OptionalExtension, params};
use stepwise_core::StepwiseError;
use stepwise_core::types::ProgressionState;

use crate::database::{Database, map_tr_err};
use crate::queries::now_timestamp;

const STATE_COLUMNS: &str = "chat_id, mode, shown_once, cooldown, since, last_confidence, \
                             last_shown_message_id, version";

fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgressionState> {
    let version: i64 = row.get(7)?;
    Ok(ProgressionState {
        chat_id: row.get(0)?,
        mode: row.get(1)?,
        shown_once: row.get(2)?,
        cooldown: row.get(3)?,
        since: row.get(4)?,
        last_confidence: row.get(5)?,
        last_shown_message_id: row.get(6)?,
        version: u64::try_from(version).unwrap_or(0),
    })
}

/// State for a (chat, mode) pair.
pub async fn load_state(
    db: &Database,
    chat_id: &str,
    mode: &str,
) -> Result<Option<ProgressionState>, StepwiseError> {
    let chat_id = chat_id.to_string();
    let mode = mode.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {STATE_COLUMNS} FROM progression_state WHERE chat_id = ?1 AND mode = ?2"
                ),
                params![chat_id, mode],
                row_to_state,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The chat's most recently written state, whatever its mode.
pub async fn load_active_state(
    db: &Database,
    chat_id: &str,
) -> Result<Option<ProgressionState>, StepwiseError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {STATE_COLUMNS} FROM progression_state WHERE chat_id = ?1
                     ORDER BY touched_seq DESC LIMIT 1"
                ),
                params![chat_id],
                row_to_state,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-swap write keyed on `state.version`.
///
/// Version 0 means "create"; any other version must match the stored row.
/// Returns the new version or [`StepwiseError::Conflict`].
pub async fn save_state(db: &Database, state: &ProgressionState) -> Result<u64, StepwiseError> {
    let state = state.clone();
    let expected = i64::try_from(state.version)
        .map_err(|_| StepwiseError::Internal(format!("version {} out of range", state.version)))?;
    let now = now_timestamp();
    let previous = state.version;
    let (chat_id, mode) = (state.chat_id.clone(), state.mode.clone());

    let written = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let next_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(touched_seq), 0) + 1 FROM progression_state WHERE chat_id = ?1",
                params![state.chat_id],
                |row| row.get(0),
            )?;

            let changed = if expected == 0 {
                tx.execute(
                    "INSERT INTO progression_state
                        (chat_id, mode, shown_once, cooldown, since, last_confidence,
                         last_shown_message_id, version, touched_seq, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)
                     ON CONFLICT(chat_id, mode) DO NOTHING",
                    params![
                        state.chat_id,
                        state.mode,
                        state.shown_once,
                        state.cooldown,
                        state.since,
                        state.last_confidence,
                        state.last_shown_message_id,
                        next_seq,
                        now,
                    ],
                )?
            } else {
                tx.execute(
                    "UPDATE progression_state SET
                        shown_once = ?3, cooldown = ?4, since = ?5, last_confidence = ?6,
                        last_shown_message_id = ?7, version = version + 1,
                        touched_seq = ?8, updated_at = ?9
                     WHERE chat_id = ?1 AND mode = ?2 AND version = ?10",
                    params![
                        state.chat_id,
                        state.mode,
                        state.shown_once,
                        state.cooldown,
                        state.since,
                        state.last_confidence,
                        state.last_shown_message_id,
                        next_seq,
                        now,
                        expected,
                    ],
                )?
            };
            tx.commit()?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)?;

    if written {
        Ok(previous + 1)
    } else {
        Err(StepwiseError::Conflict { chat_id, mode })
    }
}
