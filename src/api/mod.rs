//! Transport-agnostic request handlers
//!
//! These functions implement the read, status and control endpoints on top
//! of the `JobController`. An HTTP layer only has to map `ApiError` to a
//! status code and serialize the returned values.

use crate::catalog::CatalogSnapshot;
use crate::job::{JobController, JobStatus};
use crate::ScoutError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body accepted by the control endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlRequest {
    Force,
    Resume {
        #[serde(rename = "fromId")]
        from_id: i64,
    },
}

/// Answer of the control endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlResponse {
    /// False when a run was already in progress
    pub success: bool,
}

/// Body returned with a non-success status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Internal(#[from] ScoutError),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAction(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Parses a control body; anything but a known action is rejected
pub fn parse_control(body: &str) -> Result<ControlRequest, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::InvalidAction(e.to_string()))
}

/// Control endpoint: `{"action":"force"}` or `{"action":"resume","fromId":N}`
pub async fn handle_control(
    controller: &JobController,
    body: &str,
) -> Result<ControlResponse, ApiError> {
    let success = match parse_control(body)? {
        ControlRequest::Force => controller.force_start().await?,
        ControlRequest::Resume { from_id } => controller.resume(from_id).await?,
    };
    Ok(ControlResponse { success })
}

/// Status endpoint
pub async fn handle_status(controller: &JobController) -> Result<JobStatus, ApiError> {
    Ok(controller.status().await?)
}

/// Read endpoint
///
/// Returns the stored snapshot. When nothing is stored yet a run is started
/// and a bootstrap snapshot is returned.
pub async fn handle_read(controller: &JobController) -> Result<CatalogSnapshot, ApiError> {
    if let Some(snapshot) = controller.snapshot().await? {
        return Ok(snapshot);
    }

    if let Err(e) = controller.force_start().await {
        tracing::error!("Could not start exploration on first read: {}", e);
    }
    Ok(CatalogSnapshot::bootstrap())
}
