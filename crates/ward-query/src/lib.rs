//! Query execution against the hospital data store.
//!
//! The store exposes a single restricted remote procedure that accepts a SQL
//! string. [`RpcExecutor`] calls it over HTTP; anything implementing
//! [`QueryExecutor`] can stand in for it. Executors never retry: callers wrap
//! [`QueryExecutor::execute`] with `ward_core::retry`.

mod error;
mod executor;
mod result;
mod rpc;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{FaultKind, QueryFault};
pub use executor::QueryExecutor;
pub use result::{QueryResult, Row};
pub use rpc::RpcExecutor;
