//! Second agent: composes one plain-language answer for a turn.
//!
//! Fault details never reach the model: a failed lookup is described to it
//! only as "the lookup failed". The composed text is checked for SQL and
//! schema identifiers; if any slip through, or the model cannot be reached,
//! the answer is narrated locally from the findings instead.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};
use ward_core::{with_retry_if, RetryPolicy};
use ward_query::{QueryResult, Row};

use crate::client::{ChatMessage, ChatModel, CompletionRequest};
use crate::context::Message;
use crate::error::AgentError;
use crate::prompts::SUMMARIZER_SYSTEM_PROMPT;

/// Reply for a lookup that matched nothing.
pub const NOT_FOUND_MESSAGE: &str =
    "Sorry, we couldn't find that information. Try a different search term.";

/// Reply for a lookup that could not be completed.
pub const LOOKUP_FAILED_MESSAGE: &str =
    "Sorry, there was an issue getting that information. Please try rephrasing your question.";

/// Reply when there is nothing to summarize.
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, I couldn't understand. Try rephrasing.";

/// Rows shown to the model per question.
const MAX_PROMPT_ROWS: usize = 50;

/// Rows narrated per question in the local fallback.
const MAX_NARRATED_ROWS: usize = 5;

static TECHNICAL_LEAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bselect\b[\s\S]*?\bfrom\b|\bilike\b|\bjoin\b[\s\S]*?\bon\b|\bsql\b|\b[a-z]+(?:_[a-z]+)+\b",
    )
    .expect("Invalid leak regex")
});

/// What one sub-question produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FindingKind {
    /// Result of a database lookup.
    Lookup(QueryResult),
    /// Explanation written by the interpreter.
    Explanation(String),
    /// Both of the above.
    Mixed {
        explanation: String,
        result: QueryResult,
    },
    /// Clarifying question or greeting for the user.
    Clarify(String),
}

/// A sub-question together with what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub question: String,
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(question: impl Into<String>, kind: FindingKind) -> Self {
        Self {
            question: question.into(),
            kind,
        }
    }

    fn is_clarify(&self) -> bool {
        matches!(self.kind, FindingKind::Clarify(_))
    }
}

/// Final natural-language answer for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// The turn could not be completed and `text` is a generic apology.
    pub failed: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: true,
        }
    }
}

/// Composes answers from findings.
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    /// Compose one answer covering every finding, in order.
    ///
    /// Never fails: when the model is unavailable or leaks technical
    /// detail, the answer is narrated locally.
    pub async fn summarize(&self, message: &str, findings: &[Finding], history: &[Message]) -> Answer {
        if findings.is_empty() {
            return Answer::new(NOT_UNDERSTOOD_MESSAGE);
        }

        if findings.iter().all(Finding::is_clarify) {
            debug!(count = findings.len(), "Clarification only, answering directly");
            return Answer::new(narrate(findings));
        }

        let request = CompletionRequest::new(SUMMARIZER_SYSTEM_PROMPT)
            .with_history(history)
            .with_message(ChatMessage::user(digest(message, findings)));

        let composed = with_retry_if(&self.retry, "summarizer", AgentError::is_retryable, || {
            let model = Arc::clone(&self.model);
            let request = request.clone();
            async move { model.complete(request).await }
        })
        .await;

        match composed {
            Ok(text) if leaks_technical_detail(&text) => {
                warn!(answer = %text, "Summary exposed technical detail, narrating instead");
                Answer::new(narrate(findings))
            }
            Ok(text) => {
                info!(answer_len = text.len(), "Answer composed");
                Answer::new(text.trim())
            }
            Err(e) => {
                warn!(error = %e, "Summarizer unavailable, narrating instead");
                Answer::new(narrate(findings))
            }
        }
    }
}

/// Whether `text` contains SQL fragments or schema-style identifiers.
pub fn leaks_technical_detail(text: &str) -> bool {
    TECHNICAL_LEAK.is_match(text)
}

/// Describe the findings for the model, numbered in asked order.
fn digest(message: &str, findings: &[Finding]) -> String {
    let mut out = format!("Staff message: {}\n", message.trim());

    for (i, finding) in findings.iter().enumerate() {
        let _ = write!(out, "\nQuestion {}: {}\n", i + 1, finding.question);
        match &finding.kind {
            FindingKind::Lookup(result) => describe_result(&mut out, result),
            FindingKind::Explanation(text) => {
                let _ = writeln!(out, "Explanation: {}", text);
            }
            FindingKind::Mixed {
                explanation,
                result,
            } => {
                let _ = writeln!(out, "Explanation: {}", explanation);
                describe_result(&mut out, result);
            }
            FindingKind::Clarify(text) => {
                let _ = writeln!(out, "Ask the user: {}", text);
            }
        }
    }

    out.push_str("\nAnswer every question above, in this order, as one response.");
    out
}

fn describe_result(out: &mut String, result: &QueryResult) {
    match result {
        QueryResult::Rows(rows) => {
            let shown = &rows[..rows.len().min(MAX_PROMPT_ROWS)];
            let json = serde_json::to_string(shown).unwrap_or_default();
            let _ = writeln!(out, "Lookup results: {}", json);
            if rows.len() > shown.len() {
                let _ = writeln!(out, "({} more results not shown)", rows.len() - shown.len());
            }
        }
        QueryResult::Empty => out.push_str("Nothing was found.\n"),
        QueryResult::Fault { .. } => out.push_str("The lookup failed.\n"),
    }
}

/// Build an answer without the model.
pub fn narrate(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|finding| match &finding.kind {
            FindingKind::Lookup(result) => narrate_result(&finding.question, result),
            FindingKind::Explanation(text) | FindingKind::Clarify(text) => text.clone(),
            FindingKind::Mixed {
                explanation,
                result,
            } => format!(
                "{} {}",
                explanation,
                narrate_result(&finding.question, result)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn narrate_result(question: &str, result: &QueryResult) -> String {
    match result {
        QueryResult::Rows(rows) => {
            let facts: Vec<String> = rows
                .iter()
                .take(MAX_NARRATED_ROWS)
                .map(row_values)
                .filter(|v| !v.is_empty())
                .collect();
            if facts.is_empty() {
                return NOT_FOUND_MESSAGE.to_string();
            }
            let mut text = format!("Here's what I found for \"{}\": {}.", question, facts.join("; "));
            if rows.len() > MAX_NARRATED_ROWS {
                let _ = write!(text, " There are {} more matches.", rows.len() - MAX_NARRATED_ROWS);
            }
            text
        }
        QueryResult::Empty => NOT_FOUND_MESSAGE.to_string(),
        QueryResult::Fault { .. } => LOOKUP_FAILED_MESSAGE.to_string(),
    }
}

/// Values of a row in column order, skipping identifiers and nulls.
fn row_values(row: &Row) -> String {
    row.iter()
        .filter(|(key, _)| !(key.as_str() == "id" || key.ends_with("_id")))
        .filter_map(|(_, value)| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("yes".to_string()),
            Value::Bool(false) => Some("no".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}
