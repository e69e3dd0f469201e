//! Turn orchestrator coordinating the two agents and the query executor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use ward_agent::{
    Answer, ChatModel, Finding, FindingKind, GroqClient, Intent, Interpretation, Interpreter,
    Message, Summarizer,
};
use ward_core::{with_retry_if, RetryPolicy, Settings};
use ward_query::{QueryExecutor, QueryFault, QueryResult, RpcExecutor};

use crate::error::{OrchestratorError, Result};
use crate::session::{Session, SessionId, SessionStore};

/// Answer given when a turn cannot be completed.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, there was an issue processing your request. Please try again in a moment.";

/// Default number of earlier messages shown to the agents.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Progress of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Received,
    Interpreted,
    /// Running this many statements.
    Executing(usize),
    Executed,
    Summarized,
    Appended,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Interpreted => write!(f, "interpreted"),
            Self::Executing(n) => write!(f, "executing({})", n),
            Self::Executed => write!(f, "executed"),
            Self::Summarized => write!(f, "summarized"),
            Self::Appended => write!(f, "appended"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Runs turns: interpret, execute, summarize, record.
///
/// Turns on the same session are serialized by the session lock; turns on
/// different sessions run concurrently.
pub struct Orchestrator {
    interpreter: Interpreter,
    summarizer: Summarizer,
    executor: Arc<dyn QueryExecutor>,
    retry: RetryPolicy,
    history_window: usize,
    sessions: SessionStore,
}

impl Orchestrator {
    /// Create an orchestrator where both agents share `model`.
    pub fn new(model: Arc<dyn ChatModel>, executor: Arc<dyn QueryExecutor>, retry: RetryPolicy) -> Self {
        Self {
            interpreter: Interpreter::new(Arc::clone(&model), retry),
            summarizer: Summarizer::new(model, retry),
            executor,
            retry,
            history_window: DEFAULT_HISTORY_WINDOW,
            sessions: SessionStore::new(),
        }
    }

    /// Build the production stack from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let model: Arc<dyn ChatModel> = Arc::new(GroqClient::from_settings(&settings.llm)?);
        let executor: Arc<dyn QueryExecutor> = Arc::new(RpcExecutor::from_settings(&settings.query)?);

        info!(
            model = %settings.llm.chat_model,
            procedure = %settings.query.procedure,
            max_retries = settings.retry.max_retries,
            "Initializing orchestrator"
        );

        Ok(Self::new(model, executor, settings.retry).with_history_window(settings.history_window))
    }

    /// Limit how many earlier messages the agents see.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a new empty session.
    pub async fn create_session(&self) -> SessionId {
        self.sessions.create().await
    }

    /// Snapshot of a session's history.
    pub async fn history(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        self.sessions
            .history(session_id)
            .await
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.to_string()))
    }

    /// Run one turn on `session_id`, creating the session if needed.
    ///
    /// Only caller errors are returned as `Err`. Agent and query faults
    /// produce an [`Answer`], marked failed when nothing could be salvaged.
    pub async fn handle_turn(&self, session_id: &SessionId, message: &str) -> Result<Answer> {
        let message = message.trim();
        if message.is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }

        let session = self.sessions.get_or_create(session_id).await;
        let mut session = session.lock().await;
        Ok(self.run_turn(&mut session, message).await)
    }

    async fn run_turn(&self, session: &mut Session, message: &str) -> Answer {
        session.turns += 1;
        let turn = session.turns;
        let id = session.id.clone();

        // Nothing is appended until the answer exists, so a turn abandoned
        // midway leaves the history untouched.
        let prior: Vec<Message> = session.history.recent(self.history_window).to_vec();
        log_state(&id, turn, TurnState::Received);

        let answer = self.answer(&id, turn, message, &prior).await;

        session.history.push_user(message);
        session.history.push_assistant(&answer.text);
        log_state(&id, turn, TurnState::Appended);
        answer
    }

    async fn answer(&self, id: &SessionId, turn: u64, message: &str, prior: &[Message]) -> Answer {
        let interpretation = match self.interpreter.interpret(message, prior).await {
            Ok(interpretation) => interpretation,
            Err(e) => {
                error!(session_id = %id, turn, error = %e, "Interpreter failed");
                log_state(id, turn, TurnState::Failed);
                return Answer::failure(GENERIC_FAILURE_MESSAGE);
            }
        };
        log_state(id, turn, TurnState::Interpreted);

        log_state(id, turn, TurnState::Executing(interpretation.query_count()));
        let mut results = self.execute_queries(id, &interpretation).await;
        log_state(id, turn, TurnState::Executed);

        let findings = collect_findings(interpretation, &mut results);
        let answer = self.summarizer.summarize(message, &findings, prior).await;
        log_state(id, turn, TurnState::Summarized);
        answer
    }

    /// Run every statement concurrently; results keyed by sub-question index.
    async fn execute_queries(
        &self,
        session_id: &SessionId,
        interpretation: &Interpretation,
    ) -> HashMap<usize, QueryResult> {
        let pending = interpretation.sub_questions.iter().filter_map(|sq| {
            sq.intent
                .sql_request()
                .map(|request| (sq.index, request.sql().to_string()))
        });

        let runs = pending.map(|(index, sql)| async move {
            debug!(session_id = %session_id, index, sql = %sql, "Executing query");
            let outcome = with_retry_if(&self.retry, "query", QueryFault::is_retryable, || {
                let executor = Arc::clone(&self.executor);
                let sql = sql.clone();
                async move { executor.execute(&sql).await }
            })
            .await;

            let result = QueryResult::from_outcome(outcome);
            match &result {
                QueryResult::Fault { kind, message } => {
                    error!(session_id = %session_id, index, kind = %kind, error = %message, "Query failed")
                }
                QueryResult::Empty => debug!(session_id = %session_id, index, "Query matched nothing"),
                QueryResult::Rows(rows) => {
                    debug!(session_id = %session_id, index, rows = rows.len(), "Query returned rows")
                }
            }
            (index, result)
        });

        join_all(runs).await.into_iter().collect()
    }
}

fn collect_findings(
    interpretation: Interpretation,
    results: &mut HashMap<usize, QueryResult>,
) -> Vec<Finding> {
    interpretation
        .sub_questions
        .into_iter()
        .map(|sq| {
            let mut result = || {
                results.remove(&sq.index).unwrap_or_else(|| {
                    warn!(index = sq.index, "No result recorded for query");
                    QueryResult::Empty
                })
            };
            let kind = match sq.intent {
                Intent::DataQuery(_) => FindingKind::Lookup(result()),
                Intent::Mixed { explanation, .. } => FindingKind::Mixed {
                    explanation,
                    result: result(),
                },
                Intent::Explanation(text) => FindingKind::Explanation(text),
                Intent::Clarify(text) => FindingKind::Clarify(text),
            };
            Finding::new(sq.question, kind)
        })
        .collect()
}

fn log_state(session_id: &SessionId, turn: u64, state: TurnState) {
    debug!(session_id = %session_id, turn, state = %state, "Turn state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ward_agent::testing::ScriptedModel;
    use ward_agent::AgentError;
    use ward_query::testing::ScriptedExecutor;

    fn orchestrator(model: ScriptedModel, executor: ScriptedExecutor) -> Orchestrator {
        Orchestrator::new(
            Arc::new(model),
            Arc::new(executor),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let orchestrator = orchestrator(ScriptedModel::replying(Vec::<String>::new()), ScriptedExecutor::new());
        let id = SessionId::from("s1");

        let err = orchestrator.handle_turn(&id, "   \n").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptyMessage));
        assert!(orchestrator.sessions().get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_interpreter_failure_gives_generic_answer() {
        let model = ScriptedModel::failing(|| AgentError::Transport("connection refused".into()));
        let orchestrator = orchestrator(model, ScriptedExecutor::new());
        let id = SessionId::from("s1");

        let answer = orchestrator.handle_turn(&id, "Where is the ventilator?").await.unwrap();
        assert!(answer.failed);
        assert_eq!(answer.text, GENERIC_FAILURE_MESSAGE);

        let history = orchestrator.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_history_unknown_session() {
        let orchestrator = orchestrator(ScriptedModel::replying(Vec::<String>::new()), ScriptedExecutor::new());
        let err = orchestrator.history(&SessionId::from("nope")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionNotFound(_)));
    }

    #[test]
    fn test_turn_state_display() {
        assert_eq!(TurnState::Executing(2).to_string(), "executing(2)");
        assert_eq!(TurnState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_collect_findings_keeps_order() {
        let interpretation = Interpretation::parse(
            r#"{"items": [
                {"question": "What is a ventilator?", "intent": "explanation", "explanation": "It helps patients breathe."},
                {"question": "Where is it?", "intent": "data_query", "sql": "SELECT l.building FROM equipment e JOIN locations l ON e.location_id = l.location_id"},
                {"question": "hmm", "intent": "clarify", "clarification": "Could you say more?"}
            ]}"#,
            "What is a ventilator and where is it?",
        )
        .unwrap();
        let mut results = HashMap::from([(1, QueryResult::Empty)]);

        let findings = collect_findings(interpretation, &mut results);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].kind, FindingKind::Explanation("It helps patients breathe.".into()));
        assert_eq!(findings[1].kind, FindingKind::Lookup(QueryResult::Empty));
        assert_eq!(findings[2].kind, FindingKind::Clarify("Could you say more?".into()));
        assert!(results.is_empty());
    }
}
