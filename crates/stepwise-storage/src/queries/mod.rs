// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.

pub mod chats;
pub mod events;
pub mod messages;
pub mod modes;
pub mod notes;
pub mod progression;
pub mod rubrics;

use std::str::FromStr;

/// Current time in the storage timestamp format (`2026-03-01T12:00:00.000Z`).
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Parse a TEXT column into a strum-backed enum.
pub(crate) fn parse_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use stepwise_core::types::{Chat, Message, Role};

    use crate::database::Database;

    pub async fn db_with_chat(chat_id: &str, room_id: &str, mode: &str) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let chat = Chat {
            id: chat_id.to_string(),
            room_id: room_id.to_string(),
            mode: mode.to_string(),
            user_id: Some("learner-1".to_string()),
        };
        super::chats::upsert_chat(&db, &chat).await.unwrap();
        db
    }

    pub fn message(chat_id: &str, n: u32) -> Message {
        Message {
            id: format!("{chat_id}-m{n}"),
            chat_id: chat_id.to_string(),
            role: if n % 2 == 1 { Role::User } else { Role::Assistant },
            content: format!("message {n}"),
            created_at: format!("2026-03-01T12:00:{:02}.000Z", n % 60),
        }
    }
}
