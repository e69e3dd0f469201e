//! HTTP client for the store's SQL procedure.
//!
//! The store is a PostgREST-style service: the procedure lives at
//! `{base_url}/rest/v1/rpc/{procedure}` and takes `{"query": "<sql>"}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};
use ward_core::{ConfigError, QuerySettings};

use crate::error::QueryFault;
use crate::executor::QueryExecutor;
use crate::result::Row;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    query: &'a str,
}

/// Executor backed by the remote SQL procedure.
#[derive(Clone)]
pub struct RpcExecutor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl RpcExecutor {
    /// Create an executor for `procedure` on the store at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        procedure: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/rest/v1/rpc/{}", base_url.trim_end_matches('/'), procedure),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Create an executor from loaded settings.
    pub fn from_settings(settings: &QuerySettings) -> Result<Self, ConfigError> {
        let (url, key) = settings.require_credentials()?;
        Ok(Self::new(url, key, &settings.procedure, settings.timeout))
    }

    /// Full procedure URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryExecutor for RpcExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryFault> {
        debug!(endpoint = %self.endpoint, sql = %sql, "Executing SQL");

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&RpcRequest { query: sql })
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;
        trace!(status = %status, body = %body, "Procedure response");

        if status.is_client_error() {
            return Err(QueryFault::rejected(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }
        if !status.is_success() {
            return Err(QueryFault::remote(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let rows = decode_rows(&body)?;
        debug!(rows = rows.len(), "Query returned");
        Ok(rows)
    }
}

fn classify_transport(err: reqwest::Error) -> QueryFault {
    if err.is_timeout() {
        QueryFault::timeout(err.to_string())
    } else {
        QueryFault::transport(err.to_string())
    }
}

/// Pull the `message` field out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Interpret a successful procedure body as rows.
///
/// `null` and `[]` mean no rows. A bare object is a single row. Scalars
/// inside an array are wrapped as `{"value": ...}`.
fn decode_rows(body: &str) -> Result<Vec<Row>, QueryFault> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| QueryFault::decode(format!("invalid JSON from procedure: {}", e)))?;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::Object(map) => map,
                other => {
                    let mut map = Row::new();
                    map.insert("value".to_string(), other);
                    map
                }
            })
            .collect()),
        Value::Object(map) => Ok(vec![map]),
        other => Err(QueryFault::decode(format!(
            "unexpected procedure result: {}",
            other
        ))),
    }
}
