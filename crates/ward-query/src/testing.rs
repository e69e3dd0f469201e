//! Scripted executor for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::QueryFault;
use crate::executor::QueryExecutor;
use crate::result::Row;

type Outcome = Result<Vec<Row>, QueryFault>;

/// A [`QueryExecutor`] that answers by matching statement text.
///
/// Each rule pairs a case-insensitive substring with a queue of outcomes.
/// The first matching rule answers; its last outcome repeats once the queue
/// is down to one. Statements matching no rule return no rows.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Mutex<Vec<(String, VecDeque<Outcome>)>>,
    delay: Option<Duration>,
    delays: Vec<(String, Duration)>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with `outcomes`, in order.
    pub fn on(self, pattern: impl Into<String>, outcomes: Vec<Outcome>) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push((pattern.into().to_lowercase(), outcomes.into()));
        }
        self
    }

    /// Always answer statements containing `pattern` with `rows`.
    pub fn rows(self, pattern: impl Into<String>, rows: Vec<Row>) -> Self {
        self.on(pattern, vec![Ok(rows)])
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep before answering statements containing `pattern`.
    ///
    /// Takes precedence over [`ScriptedExecutor::with_delay`].
    pub fn delay_on(mut self, pattern: impl Into<String>, delay: Duration) -> Self {
        self.delays.push((pattern.into().to_lowercase(), delay));
        self
    }

    /// Statements executed so far, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of executions whose statement contains `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> usize {
        let pattern = pattern.to_lowercase();
        self.executed()
            .iter()
            .filter(|sql| sql.to_lowercase().contains(&pattern))
            .count()
    }

    fn delay_for(&self, sql: &str) -> Option<Duration> {
        let sql = sql.to_lowercase();
        self.delays
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, delay)| *delay)
            .or(self.delay)
    }

    fn next_outcome(&self, sql: &str) -> Outcome {
        let sql = sql.to_lowercase();
        let Ok(mut rules) = self.rules.lock() else {
            return Ok(Vec::new());
        };
        for (pattern, outcomes) in rules.iter_mut() {
            if !sql.contains(pattern.as_str()) {
                continue;
            }
            return match outcomes.len() {
                0 => Ok(Vec::new()),
                1 => outcomes[0].clone(),
                _ => outcomes.pop_front().unwrap_or_else(|| Ok(Vec::new())),
            };
        }
        Ok(Vec::new())
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryFault> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        if let Some(delay) = self.delay_for(sql) {
            tokio::time::sleep(delay).await;
        }
        self.next_outcome(sql)
    }
}
