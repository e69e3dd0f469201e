//! First agent: turns a user message into classified sub-questions.

use std::sync::Arc;

use tracing::{debug, info};
use ward_core::{with_retry_if, RetryPolicy};

use crate::client::{ChatMessage, ChatModel, CompletionRequest};
use crate::context::Message;
use crate::error::{AgentError, Result};
use crate::intent::Interpretation;
use crate::prompts;

/// Splits, classifies, and generates SQL for one user message.
///
/// The model call and the parsing of its reply form a single retried unit:
/// a reply that fails validation is retried like a transport failure.
pub struct Interpreter {
    model: Arc<dyn ChatModel>,
    retry: RetryPolicy,
    system_prompt: String,
}

impl Interpreter {
    pub fn new(model: Arc<dyn ChatModel>, retry: RetryPolicy) -> Self {
        Self {
            model,
            retry,
            system_prompt: prompts::interpreter_prompt(),
        }
    }

    /// Replace the default system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Interpret `message` in the light of earlier `history`.
    ///
    /// `history` must not already contain `message`.
    pub async fn interpret(&self, message: &str, history: &[Message]) -> Result<Interpretation> {
        let request = CompletionRequest::new(&self.system_prompt)
            .with_history(history)
            .with_message(ChatMessage::user(message))
            .json();

        debug!(
            history_len = history.len(),
            message_len = message.len(),
            "Interpreting message"
        );

        let interpretation = with_retry_if(&self.retry, "interpreter", AgentError::is_retryable, || {
            let model = Arc::clone(&self.model);
            let request = request.clone();
            async move {
                let reply = model.complete(request).await?;
                debug!(reply = %reply, "Interpreter reply");
                Interpretation::parse(&reply, message)
            }
        })
        .await?;

        info!(
            sub_questions = interpretation.len(),
            queries = interpretation.query_count(),
            "Message interpreted"
        );
        Ok(interpretation)
    }
}
