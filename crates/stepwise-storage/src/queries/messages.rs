// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history mirror. Append-only.

use rusqlite::params;
use stepwise_core::StepwiseError;
use stepwise_core::types::{Message, Role};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

/// Append a message to its chat.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), StepwiseError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, chat_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    msg.id,
                    msg.chat_id,
                    msg.role.to_string(),
                    msg.content,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of messages in a chat.
pub async fn count_by_chat(db: &Database, chat_id: &str) -> Result<u32, StepwiseError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE chat_id = ?1",
                params![chat_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of a chat in insertion order.
///
/// With `limit`, only the most recent `limit` messages are returned, still
/// oldest first.
pub async fn list_by_chat(
    db: &Database,
    chat_id: &str,
    limit: Option<usize>,
) -> Result<Vec<Message>, StepwiseError> {
    let chat_id = chat_id.to_string();
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, created_at FROM (
                    SELECT seq, id, chat_id, role, content, created_at
                    FROM messages WHERE chat_id = ?1
                    ORDER BY seq DESC LIMIT ?2
                 ) ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![chat_id, limit], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    role: parse_column::<Role>(2, row.get(2)?)?,
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
