//! Scripted in-process provider for tests and dry runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use coursebrief_core::{AppError, AppResult, ServiceErrorKind};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Return an empty generation.
    Empty,
    /// Fail with a service error of this kind.
    Fail(ServiceErrorKind),
}

impl MockReply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Mock client.
///
/// Replies are taken from the script in order. Once the script is exhausted
/// the fallback applies: a numbered `mock summary #n` text, or the repeated
/// failure for [`MockClient::always_failing`].
pub struct MockClient {
    script: Mutex<VecDeque<MockReply>>,
    fallback: Option<MockReply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(kind: ServiceErrorKind) -> Self {
        Self {
            fallback: Some(MockReply::Fail(kind)),
            ..Self::new()
        }
    }

    /// Number of completed `complete` calls, failures included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, call: usize) -> MockReply {
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| MockReply::Text(format!("mock summary #{}", call)))
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.chars().count() / 4).unwrap_or(u32::MAX)
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let content = match self.next_reply(call) {
            MockReply::Text(text) => text,
            MockReply::Empty => String::new(),
            MockReply::Fail(kind) => {
                return Err(AppError::service(
                    kind,
                    format!("mock failure on call {}", call),
                ))
            }
        };

        let usage = LlmUsage::new(estimate_tokens(&request.prompt), estimate_tokens(&content));
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: Some(usage),
        })
    }
}
