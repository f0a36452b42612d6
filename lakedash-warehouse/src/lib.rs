//! lakedash-warehouse: SQL warehouse client and dashboard queries
//!
//! Runs aggregation queries against a managed SQL warehouse over its
//! statement execution REST API. Every call authenticates with a freshly
//! obtained bearer token from the shared [`TokenProvider`] capability.

mod queries;
mod statement;

pub use queries::{
    fares_by_zip, top_destinations, DestinationSummary, FareSummary, DEFAULT_DESTINATION_LIMIT,
    DEFAULT_TRIPS_TABLE,
};

use std::sync::Arc;
use std::time::Duration;

use lakedash_core::TokenProvider;
use thiserror::Error;
use tracing::debug;

use crate::statement::{StatementResponse, SubmitStatementRequest};

const STATEMENT_WAIT_TIMEOUT: &str = "30s";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 120;

pub type Result<T> = std::result::Result<T, WarehouseError>;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("warehouse configuration error: {0}")]
    Configuration(String),

    #[error("failed to obtain warehouse access token: {0}")]
    Token(#[source] anyhow::Error),

    #[error("warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("statement ended in state {state}: {message}")]
    Statement { state: String, message: String },

    #[error("statement {statement_id} did not finish within the polling window")]
    StatementTimeout { statement_id: String },

    #[error("malformed warehouse response: {0}")]
    MalformedResponse(String),

    #[error("invalid table identifier {0:?}")]
    InvalidTable(String),
}

/// Where the warehouse lives: workspace host plus the warehouse HTTP path
/// (e.g. `/sql/1.0/warehouses/abc123`).
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub host: String,
    pub http_path: String,
}

/// REST client for the SQL warehouse.
pub struct WarehouseClient {
    http: reqwest::Client,
    host: String,
    warehouse_id: String,
    credentials: Arc<dyn TokenProvider>,
}

impl WarehouseClient {
    pub fn new(config: WarehouseConfig, credentials: Arc<dyn TokenProvider>) -> Result<Self> {
        let host = config
            .host
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();
        if host.is_empty() {
            return Err(WarehouseError::Configuration(
                "workspace host is empty".to_string(),
            ));
        }
        let warehouse_id = warehouse_id_from_http_path(&config.http_path)?;
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            host,
            warehouse_id,
            credentials,
        })
    }

    /// Warehouse id extracted from the configured HTTP path.
    pub fn warehouse_id(&self) -> &str {
        &self.warehouse_id
    }

    /// Submit a statement and wait for its rows. The server is given 30s to
    /// answer synchronously; after that the statement is polled until it
    /// reaches a terminal state or the polling allowance runs out.
    pub async fn execute(&self, statement: &str) -> Result<Vec<Vec<Option<String>>>> {
        let token = self
            .credentials
            .obtain_token()
            .await
            .map_err(WarehouseError::Token)?;

        let submit_url = format!("https://{}/api/2.0/sql/statements", self.host);
        let request = SubmitStatementRequest {
            warehouse_id: &self.warehouse_id,
            statement,
            wait_timeout: STATEMENT_WAIT_TIMEOUT,
            on_wait_timeout: "CONTINUE",
            format: "JSON_ARRAY",
            disposition: "INLINE",
        };

        debug!(warehouse_id = %self.warehouse_id, "submitting statement");
        let mut response: StatementResponse = self
            .http
            .post(&submit_url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut polls = 0u32;
        loop {
            let state = std::mem::take(&mut response.status.state);
            match state.as_str() {
                "SUCCEEDED" => {
                    let rows = response
                        .result
                        .and_then(|result| result.data_array)
                        .unwrap_or_default();
                    debug!(rows = rows.len(), "statement finished");
                    return Ok(rows);
                }
                "FAILED" | "CANCELED" | "CLOSED" => {
                    let message = response
                        .status
                        .error
                        .map(|detail| {
                            let message = detail
                                .message
                                .unwrap_or_else(|| "no error detail".to_string());
                            match detail.error_code {
                                Some(code) => format!("{code}: {message}"),
                                None => message,
                            }
                        })
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(WarehouseError::Statement { state, message });
                }
                "PENDING" | "RUNNING" => {
                    polls += 1;
                    if polls > MAX_POLLS {
                        return Err(WarehouseError::StatementTimeout {
                            statement_id: response.statement_id,
                        });
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;

                    let poll_url = format!(
                        "https://{}/api/2.0/sql/statements/{}",
                        self.host, response.statement_id
                    );
                    response = self
                        .http
                        .get(&poll_url)
                        .bearer_auth(&token)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?;
                }
                _ => {
                    return Err(WarehouseError::MalformedResponse(format!(
                        "unknown statement state {state:?}"
                    )));
                }
            }
        }
    }
}

/// The warehouse id is the last path segment of an HTTP path like
/// `/sql/1.0/warehouses/abc123` (or the legacy `/sql/1.0/endpoints/abc123`).
fn warehouse_id_from_http_path(path: &str) -> Result<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.last() {
        Some(&id) if id != "warehouses" && id != "endpoints" => Ok(id.to_string()),
        _ => Err(WarehouseError::Configuration(format!(
            "cannot determine warehouse id from http path {path:?}"
        ))),
    }
}
