//! Statement execution API request/response types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct SubmitStatementRequest<'a> {
    pub warehouse_id: &'a str,
    pub statement: &'a str,
    pub wait_timeout: &'a str,
    pub on_wait_timeout: &'a str,
    pub format: &'a str,
    pub disposition: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub result: Option<StatementResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementStatus {
    pub state: String,
    #[serde(default)]
    pub error: Option<StatementErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementErrorDetail {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementResult {
    #[serde(default)]
    pub data_array: Option<Vec<Vec<Option<String>>>>,
}
