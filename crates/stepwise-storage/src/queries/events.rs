// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only suggestion audit log.
//!
//! UPDATE and DELETE are rejected by triggers installed in the schema.

use rusqlite::params;
use stepwise_core::StepwiseError;
use stepwise_core::types::{SuggestionEvent, SuggestionEventType};

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

/// Append one event.
pub async fn append_event(db: &Database, event: &SuggestionEvent) -> Result<(), StepwiseError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO suggestion_events
                    (id, chat_id, mode, event_type, user_id, message_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.id,
                    event.chat_id,
                    event.mode,
                    event.event_type.to_string(),
                    event.user_id,
                    event.message_id,
                    event.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Events of a chat in the order they were recorded.
pub async fn events_for_chat(
    db: &Database,
    chat_id: &str,
) -> Result<Vec<SuggestionEvent>, StepwiseError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, mode, event_type, user_id, message_id, created_at
                 FROM suggestion_events WHERE chat_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![chat_id], |row| {
                Ok(SuggestionEvent {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    mode: row.get(2)?,
                    event_type: parse_column::<SuggestionEventType>(3, row.get(3)?)?,
                    user_id: row.get(4)?,
                    message_id: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, kind: SuggestionEventType) -> SuggestionEvent {
        SuggestionEvent {
            id: id.to_string(),
            chat_id: "c1".to_string(),
            mode: "explore".to_string(),
            event_type: kind,
            user_id: Some("learner-1".to_string()),
            message_id: Some("m12".to_string()),
            created_at: "2026-03-01T12:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn append_and_list_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        append_event(&db, &event("e1", SuggestionEventType::Shown)).await.unwrap();
        append_event(&db, &event("e2", SuggestionEventType::Accepted)).await.unwrap();

        let events = events_for_chat(&db, "c1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, SuggestionEventType::Shown);
        assert_eq!(events[1].event_type, SuggestionEventType::Accepted);
        assert_eq!(events[1].message_id.as_deref(), Some("m12"));
    }

    #[tokio::test]
    async fn log_rejects_updates_and_deletes() {
        let db = Database::open_in_memory().await.unwrap();
        append_event(&db, &event("e1", SuggestionEventType::Shown)).await.unwrap();

        let update = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute("UPDATE suggestion_events SET mode = 'practice'", [])
            })
            .await;
        assert!(update.is_err());

        let delete = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM suggestion_events", [])
            })
            .await;
        assert!(delete.is_err());

        assert_eq!(events_for_chat(&db, "c1").await.unwrap().len(), 1);
    }
}
