//! Query results.

use serde_json::{Map, Value};

use crate::error::{FaultKind, QueryFault};

/// One result row: column name to value.
pub type Row = Map<String, Value>;

/// Outcome of running one statement, consumed once by the summarizer.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// At least one row came back.
    Rows(Vec<Row>),
    /// The statement ran and matched nothing. Not an error.
    Empty,
    /// The statement could not be run.
    Fault { kind: FaultKind, message: String },
}

impl QueryResult {
    /// Fold an executor outcome into a result.
    pub fn from_outcome(outcome: Result<Vec<Row>, QueryFault>) -> Self {
        match outcome {
            Ok(rows) if rows.is_empty() => Self::Empty,
            Ok(rows) => Self::Rows(rows),
            Err(fault) => Self::Fault {
                kind: fault.kind,
                message: fault.message,
            },
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            _ => 0,
        }
    }
}

impl From<Result<Vec<Row>, QueryFault>> for QueryResult {
    fn from(outcome: Result<Vec<Row>, QueryFault>) -> Self {
        Self::from_outcome(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_rows_are_empty_not_fault() {
        let result = QueryResult::from_outcome(Ok(vec![]));
        assert_eq!(result, QueryResult::Empty);
        assert!(!result.is_fault());
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn test_rows() {
        let result = QueryResult::from(Ok(vec![row(json!({"building": "ICU"}))]));
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn test_fault() {
        let result = QueryResult::from_outcome(Err(QueryFault::timeout("deadline")));
        assert_eq!(
            result,
            QueryResult::Fault {
                kind: FaultKind::Timeout,
                message: "deadline".into()
            }
        );
        assert!(result.is_fault());
    }
}
