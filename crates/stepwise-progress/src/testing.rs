// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stepwise_core::types::{Chat, GenerationRequest, GenerationResponse, Message, Role};
use stepwise_core::{StepwiseError, TextGeneration};
use stepwise_storage::queries;
use stepwise_storage::{Database, SqliteStore};

/// Replays queued outputs; `Err` entries fail the call.
///
/// A slimmer twin of `stepwise_test_utils::MockGeneration`. Unit tests in
/// this crate cannot use that one: the test-utils crate depends on this
/// crate, so its types would come from a second copy of `stepwise_progress`.
/// Integration tests under `tests/` use `MockGeneration`.
pub struct ScriptedGeneration {
    outputs: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGeneration {
    pub fn new(outputs: Vec<Result<String, String>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn ok(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGeneration for ScriptedGeneration {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, StepwiseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outputs.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(GenerationResponse {
                text,
                truncated: false,
            }),
            Some(Err(message)) => Err(StepwiseError::Generation {
                message,
                source: None,
            }),
            None => Err(StepwiseError::Generation {
                message: "script exhausted".into(),
                source: None,
            }),
        }
    }
}

pub fn chat(id: &str, room: &str, mode: &str) -> Chat {
    Chat {
        id: id.to_string(),
        room_id: room.to_string(),
        mode: mode.to_string(),
        user_id: Some("learner-1".to_string()),
    }
}

/// In-memory store holding `chat` with `messages` alternating user/assistant.
pub async fn store_with_chat(chat: &Chat, messages: u32) -> SqliteStore {
    let db = Database::open_in_memory().await.unwrap();
    queries::chats::upsert_chat(&db, chat).await.unwrap();
    let store = SqliteStore::new(db);
    append_messages(&store, &chat.id, 1, messages).await;
    store
}

/// Append messages numbered `from..=to`.
pub async fn append_messages(store: &SqliteStore, chat_id: &str, from: u32, to: u32) {
    for n in from..=to {
        let message = Message {
            id: format!("{chat_id}-m{n}"),
            chat_id: chat_id.to_string(),
            role: if n % 2 == 1 { Role::User } else { Role::Assistant },
            content: format!("turn {n} about photosynthesis"),
            created_at: format!("2026-03-01T12:{:02}:{:02}.000Z", n / 60, n % 60),
        };
        queries::messages::insert_message(store.database(), &message)
            .await
            .unwrap();
    }
}
