//! Error types and handling module.
//!
//! Defines the failure taxonomy shared by the validators, the DeBank client
//! and the tool handlers, plus the conversion into MCP protocol errors.

use rmcp::ErrorData as McpError;
use serde_json::json;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors (fatal at startup).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input failed validation.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The access key was rejected (HTTP 401).
    #[error("Authentication failed: the DeBank access key was rejected")]
    Authentication,

    /// Quota, capacity or plan limit (HTTP 403).
    #[error("Access forbidden: {0}")]
    Authorization(String),

    /// The upstream rejected the request (HTTP 400 or other 4xx).
    #[error("Bad request (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    /// Rate limit or transient server/network fault persisted after all retries.
    #[error("Request failed after {attempts} attempt(s): {cause}")]
    TransientFailure { attempts: u32, cause: String },

    /// The upstream response did not match the expected shape.
    #[error("Unexpected response schema: {0}")]
    Schema(String),

    /// HTTP transport could not be set up.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl AppError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation { field: field.into(), message: message.into() }
    }

    /// Stable identifier of the error kind, surfaced to the host runtime.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Validation { .. } => "validation_error",
            AppError::Authentication => "authentication_error",
            AppError::Authorization(_) => "authorization_error",
            AppError::BadRequest { .. } => "bad_request_error",
            AppError::TransientFailure { .. } => "transient_failure_error",
            AppError::Schema(_) => "schema_error",
            AppError::Transport(_) => "transport_error",
        }
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        let data = Some(json!({ "type": err.kind() }));
        match err {
            AppError::Validation { .. } | AppError::BadRequest { .. } => {
                McpError::invalid_params(err.to_string(), data)
            }
            AppError::Config(_) => McpError::invalid_request(err.to_string(), data),
            _ => McpError::internal_error(err.to_string(), data),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
