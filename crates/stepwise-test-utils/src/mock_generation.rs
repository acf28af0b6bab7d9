// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text-generation backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use stepwise_core::types::{GenerationRequest, GenerationResponse};
use stepwise_core::{StepwiseError, TextGeneration};

enum Scripted {
    Text { text: String, truncated: bool },
    Failure(String),
}

/// A generation backend that replays pre-configured outputs.
///
/// Outputs are popped from a FIFO queue. When the queue is empty the call
/// fails, so tests notice unexpected generation calls.
#[derive(Clone)]
pub struct MockGeneration {
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    calls: Arc<AtomicUsize>,
}

impl MockGeneration {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A mock pre-loaded with successful outputs.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let queue = responses
            .into_iter()
            .map(|text| Scripted::Text {
                text,
                truncated: false,
            })
            .collect();
        Self {
            queue: Arc::new(Mutex::new(queue)),
            ..Self::new()
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.queue.lock().await.push_back(Scripted::Text {
            text: text.into(),
            truncated: false,
        });
    }

    /// Queue an output that reports hitting `max_tokens`.
    pub async fn add_truncated_response(&self, text: impl Into<String>) {
        self.queue.lock().await.push_back(Scripted::Text {
            text: text.into(),
            truncated: true,
        });
    }

    /// Queue a failing call.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Failure(message.into()));
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGeneration for MockGeneration {
    fn name(&self) -> &str {
        "mock-generation"
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, StepwiseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        match self.queue.lock().await.pop_front() {
            Some(Scripted::Text { text, truncated }) => Ok(GenerationResponse { text, truncated }),
            Some(Scripted::Failure(message)) => Err(StepwiseError::Generation {
                message,
                source: None,
            }),
            None => Err(StepwiseError::Generation {
                message: "mock generation queue is empty".to_string(),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "p".into(),
            system_prompt: "s".into(),
            max_tokens: 8,
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let mock = MockGeneration::with_responses(vec!["one".into()]);
        mock.add_truncated_response("two").await;
        mock.add_failure("boom").await;

        assert_eq!(mock.complete(request()).await.unwrap().text, "one");
        let second = mock.complete(request()).await.unwrap();
        assert!(second.truncated);
        assert!(mock.complete(request()).await.is_err());
        assert!(mock.complete(request()).await.is_err());
        assert_eq!(mock.calls(), 4);
        assert_eq!(mock.requests().await.len(), 4);
    }
}
