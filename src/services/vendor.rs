//! Remote-control requests addressed to the `record-rename` vendor.
//!
//! Requests and responses are JSON objects. `set_filename` stores a one-shot
//! pattern used by the next rename decision:
//!
//! ```json
//! { "filename": "%TITLE Highlights", "force": true }
//! ```

use crate::metrics::Metrics;
use crate::state::StateManager;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Vendor name remote controllers address
pub const VENDOR_NAME: &str = "record-rename";

/// Request storing the next filename pattern
pub const SET_FILENAME: &str = "set_filename";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VendorError {
    #[error("'filename' not set")]
    FilenameNotSet,

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error("invalid request data: {0}")]
    InvalidData(String),
}

/// Payload of `set_filename`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetFilenameRequest {
    #[serde(default)]
    pub filename: Option<String>,

    /// Skip the prompt when the formatted name is free
    #[serde(default, deserialize_with = "lenient_bool")]
    pub force: bool,
}

/// Anything other than a JSON boolean reads as `false`
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(false))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VendorResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &VendorError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<(), VendorError>> for VendorResponse {
    fn from(result: Result<(), VendorError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(&e),
        }
    }
}

/// Validate and store a `set_filename` pattern. Nothing changes on error.
pub fn handle_set_filename(
    state: &StateManager,
    request: SetFilenameRequest,
) -> Result<(), VendorError> {
    let filename = request
        .filename
        .filter(|f| !f.is_empty())
        .ok_or(VendorError::FilenameNotSet)?;

    tracing::info!(
        "Vendor set next filename to {:?} (force={})",
        filename,
        request.force
    );
    state.set_vendor_pattern(filename, request.force);
    Ok(())
}

/// Entry point for every vendor request
pub struct VendorHandler {
    state: StateManager,
    metrics: Arc<Metrics>,
}

impl VendorHandler {
    pub fn new(state: StateManager, metrics: Arc<Metrics>) -> Self {
        Self { state, metrics }
    }

    /// Handle `request` with JSON `data`, producing the JSON response
    pub fn dispatch(&self, request: &str, data: Value) -> Value {
        self.metrics.record_vendor_request();

        let response: VendorResponse = self.handle(request, data).into();
        if let Some(error) = &response.error {
            tracing::warn!("Vendor request {} failed: {}", request, error);
        }

        serde_json::to_value(&response).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize vendor response: {}", e);
            Value::Null
        })
    }

    fn handle(&self, request: &str, data: Value) -> Result<(), VendorError> {
        match request {
            SET_FILENAME => {
                let payload = if data.is_null() {
                    SetFilenameRequest::default()
                } else {
                    serde_json::from_value::<SetFilenameRequest>(data)
                        .map_err(|e| VendorError::InvalidData(e.to_string()))?
                };
                handle_set_filename(&self.state, payload)
            }
            other => Err(VendorError::UnknownRequest(other.to_string())),
        }
    }
}
