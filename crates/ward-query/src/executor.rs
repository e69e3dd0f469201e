//! Executor trait.

use async_trait::async_trait;

use crate::error::QueryFault;
use crate::result::Row;

/// Runs a SQL statement through the store's restricted entry point.
///
/// Implementations report transport and remote failures as [`QueryFault`]
/// and return an empty vector when the statement matched nothing.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryFault>;
}
