//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for offline
//! runs and engine-level integration testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chat_provider::{
    ChatMessage, CompletionClient, CompletionError, CompletionRequest, ProviderProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Reply(String),
    Fail(CompletionError),
}

/// Scripted completion client that records every request it receives.
///
/// Outcomes are consumed in order; once the script is exhausted the client
/// echoes the request input back.
#[derive(Debug, Default)]
pub struct MockCompletionClient {
    script: Mutex<VecDeque<MockOutcome>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionClient {
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = MockOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a client that answers with the given replies in order.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            replies
                .into_iter()
                .map(|reply| MockOutcome::Reply(reply.into())),
        )
    }

    /// Queues another outcome behind the current script.
    pub fn push(&self, outcome: MockOutcome) {
        lock_unpoisoned(&self.script).push_back(outcome);
    }

    /// Returns a copy of every request seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }
}

impl CompletionClient for MockCompletionClient {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError> {
        let echo = format!("You said: {}", request.input);
        lock_unpoisoned(&self.requests).push(request);

        match lock_unpoisoned(&self.script).pop_front() {
            Some(MockOutcome::Reply(text)) => Ok(ChatMessage::assistant(text)),
            Some(MockOutcome::Fail(error)) => Err(error),
            None => Ok(ChatMessage::assistant(echo)),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
