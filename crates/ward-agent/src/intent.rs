//! Intent classification output of the interpreter.
//!
//! The model replies with JSON; [`Interpretation::parse`] validates it into
//! typed sub-questions before anything downstream acts on it.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::error::{AgentError, Result};

/// Reply given in place of a lookup the read-only guard refused.
pub const READ_ONLY_CLARIFICATION: &str = "I can only look up hospital information, not change it. \
Could you rephrase that as a question about equipment, staff, or locations?";

static DESTRUCTIVE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|drop|alter|truncate|create|grant|revoke|merge|copy|call|execute|vacuum|comment)\b",
    )
    .expect("Invalid destructive keyword regex")
});

static READ_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(select|with)\b").expect("Invalid read prefix regex"));

/// Why a generated statement was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlRejection {
    #[error("statement is empty")]
    Empty,

    #[error("statement must start with SELECT or WITH")]
    NotRead,

    #[error("statement contains forbidden keyword {0}")]
    Forbidden(String),

    #[error("multiple statements are not allowed")]
    MultipleStatements,
}

/// A single read-only SQL statement and the question it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlRequest {
    sql: String,
    question: String,
}

impl SqlRequest {
    /// Validate `sql` and pair it with its originating question.
    ///
    /// A single trailing semicolon is stripped. String literals are not
    /// parsed, so a forbidden word inside a literal is also refused.
    pub fn new(
        sql: impl Into<String>,
        question: impl Into<String>,
    ) -> std::result::Result<Self, SqlRejection> {
        let sql = sql.into();
        let trimmed = sql.trim().trim_end_matches(';').trim();

        if trimmed.is_empty() {
            return Err(SqlRejection::Empty);
        }
        if trimmed.contains(';') {
            return Err(SqlRejection::MultipleStatements);
        }
        if !READ_PREFIX.is_match(trimmed) {
            return Err(SqlRejection::NotRead);
        }
        if let Some(m) = DESTRUCTIVE_KEYWORD.find(trimmed) {
            return Err(SqlRejection::Forbidden(m.as_str().to_uppercase()));
        }

        Ok(Self {
            sql: trimmed.to_string(),
            question: question.into(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

/// What the interpreter decided to do for one sub-question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Look the answer up in the database.
    DataQuery(SqlRequest),
    /// Answer from general medical knowledge.
    Explanation(String),
    /// Explain and look up.
    Mixed {
        sql: SqlRequest,
        explanation: String,
    },
    /// Ask the user to clarify (also used for greetings and off-topic input).
    Clarify(String),
}

impl Intent {
    /// The statement to execute, if this intent needs one.
    pub fn sql_request(&self) -> Option<&SqlRequest> {
        match self {
            Self::DataQuery(sql) | Self::Mixed { sql, .. } => Some(sql),
            Self::Explanation(_) | Self::Clarify(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DataQuery(_) => "data_query",
            Self::Explanation(_) => "explanation",
            Self::Mixed { .. } => "mixed",
            Self::Clarify(_) => "clarify",
        }
    }
}

/// One question detected in the user's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuestion {
    /// Position in the message, starting at 0.
    pub index: usize,
    /// The question as restated by the interpreter.
    pub question: String,
    pub intent: Intent,
}

/// The interpreter's output for one turn, in asked order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub sub_questions: Vec<SubQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawIntent {
    DataQuery,
    Explanation,
    Mixed,
    Clarify,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    question: Option<String>,
    intent: RawIntent,
    #[serde(default)]
    sql: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    clarification: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInterpretation {
    items: Vec<RawItem>,
}

impl Interpretation {
    /// Parse and validate the model's reply.
    ///
    /// `message` stands in for a missing `question` field. Statements that
    /// fail the read-only guard become clarifications.
    pub fn parse(reply: &str, message: &str) -> Result<Self> {
        let json = extract_json(reply)
            .ok_or_else(|| AgentError::ResponseParse("no JSON object in reply".into()))?;
        let raw: RawInterpretation = serde_json::from_str(json)
            .map_err(|e| AgentError::ResponseParse(format!("invalid interpretation: {}", e)))?;

        if raw.items.is_empty() {
            return Err(AgentError::ResponseParse("interpretation has no items".into()));
        }

        let sub_questions = raw
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.into_sub_question(index, message))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sub_questions })
    }

    pub fn len(&self) -> usize {
        self.sub_questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_questions.is_empty()
    }

    /// Number of statements this turn will execute.
    pub fn query_count(&self) -> usize {
        self.sub_questions
            .iter()
            .filter(|q| q.intent.sql_request().is_some())
            .count()
    }
}

impl RawItem {
    fn into_sub_question(self, index: usize, message: &str) -> Result<SubQuestion> {
        let question = self
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| message.trim().to_string());

        let intent = match self.intent {
            RawIntent::DataQuery => {
                let sql = required(self.sql, index, "sql")?;
                match SqlRequest::new(sql, question.clone()) {
                    Ok(request) => Intent::DataQuery(request),
                    Err(rejection) => refuse(index, &rejection, None),
                }
            }
            RawIntent::Explanation => {
                Intent::Explanation(required(self.explanation, index, "explanation")?)
            }
            RawIntent::Mixed => {
                let sql = required(self.sql, index, "sql")?;
                let explanation = required(self.explanation, index, "explanation")?;
                match SqlRequest::new(sql, question.clone()) {
                    Ok(sql) => Intent::Mixed { sql, explanation },
                    Err(rejection) => refuse(index, &rejection, Some(&explanation)),
                }
            }
            RawIntent::Clarify => {
                Intent::Clarify(required(self.clarification, index, "clarification")?)
            }
        };

        Ok(SubQuestion {
            index,
            question,
            intent,
        })
    }
}

fn required(field: Option<String>, index: usize, name: &str) -> Result<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AgentError::ResponseParse(format!("item {} is missing {}", index, name)))
}

/// Replace a refused lookup with the read-only notice, keeping any
/// explanation that came with it.
fn refuse(index: usize, rejection: &SqlRejection, explanation: Option<&str>) -> Intent {
    warn!(index, reason = %rejection, "Refusing generated SQL");
    match explanation {
        Some(text) => Intent::Clarify(format!("{} {}", text, READ_ONLY_CLARIFICATION)),
        None => Intent::Clarify(READ_ONLY_CLARIFICATION.to_string()),
    }
}

/// Locate the outermost JSON object, tolerating code fences and prose.
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
