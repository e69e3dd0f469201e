//! Scripted test doubles.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ChatModel, CompletionRequest};
use crate::error::{AgentError, Result};

type ErrorFactory = Box<dyn Fn() -> AgentError + Send + Sync>;

/// A [`ChatModel`] that replays scripted replies in order.
///
/// Once the script runs out, every call fails with the fallback error
/// (or `EmptyResponse` when none was given).
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<ErrorFactory>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails with `error()`.
    pub fn failing<F>(error: F) -> Self
    where
        F: Fn() -> AgentError + Send + Sync + 'static,
    {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(Box::new(error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies with each string once, in order.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(reply) => reply,
            None => Err(self
                .fallback
                .as_ref()
                .map(|f| f())
                .unwrap_or(AgentError::EmptyResponse)),
        }
    }
}
