// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Note artifact persistence. One row per chat, watermark never decreases.

use rusqlite::{OptionalExtension, params};
use stepwise_core::StepwiseError;
use stepwise_core::types::NoteArtifact;

use crate::database::{Database, map_tr_err};

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteArtifact> {
    Ok(NoteArtifact {
        chat_id: row.get(0)?,
        room_id: row.get(1)?,
        content: row.get(2)?,
        watermark: row.get(3)?,
        generated_at: row.get(4)?,
    })
}

/// Fetch the artifact for a chat.
pub async fn get_note(db: &Database, chat_id: &str) -> Result<Option<NoteArtifact>, StepwiseError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT chat_id, room_id, content, watermark, generated_at
                 FROM note_artifacts WHERE chat_id = ?1",
                params![chat_id],
                row_to_note,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or overwrite the chat's artifact in a single statement.
///
/// An existing row with a higher watermark wins; returns whether the write
/// was applied.
pub async fn upsert_note(db: &Database, note: &NoteArtifact) -> Result<bool, StepwiseError> {
    let note = note.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO note_artifacts (chat_id, room_id, content, watermark, generated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(chat_id) DO UPDATE SET
                    room_id = excluded.room_id,
                    content = excluded.content,
                    watermark = excluded.watermark,
                    generated_at = excluded.generated_at
                 WHERE excluded.watermark >= note_artifacts.watermark",
                params![
                    note.chat_id,
                    note.room_id,
                    note.content,
                    note.watermark,
                    note.generated_at,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// All artifacts of a room, oldest generation first.
pub async fn notes_for_room(
    db: &Database,
    room_id: &str,
    exclude_chat_id: Option<&str>,
) -> Result<Vec<NoteArtifact>, StepwiseError> {
    let room_id = room_id.to_string();
    let exclude = exclude_chat_id.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, room_id, content, watermark, generated_at
                 FROM note_artifacts
                 WHERE room_id = ?1 AND (?2 IS NULL OR chat_id != ?2)
                 ORDER BY generated_at ASC, chat_id ASC",
            )?;
            let rows = stmt.query_map(params![room_id, exclude], row_to_note)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
