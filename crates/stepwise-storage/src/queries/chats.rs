// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat directory mirror.

use rusqlite::{OptionalExtension, params};
use stepwise_core::StepwiseError;
use stepwise_core::types::Chat;

use crate::database::{Database, map_tr_err};

/// Insert a chat, or update its room, mode and owner if it already exists.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), StepwiseError> {
    let chat = chat.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (id, room_id, mode, user_id) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    room_id = excluded.room_id,
                    mode = excluded.mode,
                    user_id = excluded.user_id",
                params![chat.id, chat.room_id, chat.mode, chat.user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a chat by id.
pub async fn get_chat(db: &Database, chat_id: &str) -> Result<Option<Chat>, StepwiseError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, room_id, mode, user_id FROM chats WHERE id = ?1",
                params![chat_id],
                |row| {
                    Ok(Chat {
                        id: row.get(0)?,
                        room_id: row.get(1)?,
                        mode: row.get(2)?,
                        user_id: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Move a chat to another mode. Returns false if the chat does not exist.
pub async fn set_chat_mode(db: &Database, chat_id: &str, mode: &str) -> Result<bool, StepwiseError> {
    let chat_id = chat_id.to_string();
    let mode = mode.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chats SET mode = ?2 WHERE id = ?1",
                params![chat_id, mode],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
