//! Typed error handling for the sales query service
//!
//! Errors are split by who caused them and whether the service can recover:
//!
//! - [`ValidationError`]: the client sent a descriptor that cannot be built
//!   (4xx, never retried, never touches a data source)
//! - [`DataSourceError`]: every configured data source is exhausted (5xx)
//! - [`RemoteQueryError`]: the remote store failed; normally recovered by
//!   falling back to the local snapshot and only surfaced if it escapes
//! - [`ConfigError`]: the process configuration cannot be read
//!
//! # Example
//!
//! ```rust,ignore
//! match service.search(&query).await {
//!     Ok(page) => println!("{} matches", page.total),
//!     Err(ServiceError::DataSource(DataSourceError::Unavailable { attempted, .. })) => {
//!         eprintln!("nothing to read from: {:?}", attempted);
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type of the service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Client-caused descriptor errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No data source could serve the request
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// Remote store failure that was not recovered by a fallback
    #[error(transparent)]
    Remote(#[from] RemoteQueryError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServiceError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::DataSource(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Remote(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(e) => e.error_code(),
            ServiceError::DataSource(_) => "DATA_SOURCE_UNAVAILABLE",
            ServiceError::Remote(_) => "REMOTE_QUERY_FAILURE",
            ServiceError::Config(_) => "CONFIG_ERROR",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller (rather than the service) caused this error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::Validation(e) => Some(serde_json::json!({ "field": e.field() })),
            ServiceError::DataSource(DataSourceError::Unavailable { attempted, .. }) => {
                Some(serde_json::json!({ "attempted": attempted }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised while building a query descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `sort_by` is not one of the sortable columns
    #[error("sort_by must be one of: date, quantity, customer_name (got '{value}')")]
    InvalidSortField { value: String },

    /// `order` is not `asc` or `desc`
    #[error("order must be 'asc' or 'desc' (got '{value}')")]
    InvalidSortOrder { value: String },

    /// A numeric parameter is outside its allowed range
    #[error("'{field}' is out of range ({value}): {message}")]
    OutOfRange {
        field: String,
        value: String,
        message: String,
    },

    /// A parameter could not be parsed at all
    #[error("'{field}' has an invalid value ({value}): {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

impl ValidationError {
    /// Name of the offending descriptor field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidSortField { .. } => "sort_by",
            ValidationError::InvalidSortOrder { .. } => "order",
            ValidationError::OutOfRange { field, .. } => field,
            ValidationError::InvalidValue { field, .. } => field,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidSortField { .. } => "INVALID_SORT_FIELD",
            ValidationError::InvalidSortOrder { .. } => "INVALID_SORT_ORDER",
            ValidationError::OutOfRange { .. } => "VALUE_OUT_OF_RANGE",
            ValidationError::InvalidValue { .. } => "INVALID_VALUE",
        }
    }

    pub(crate) fn out_of_range(field: &str, value: impl ToString, message: &str) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_value(field: &str, value: impl ToString, message: &str) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Data Source Errors
// =============================================================================

/// Errors meaning no data could be read at all
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Every configured source failed or none is configured
    #[error("Dataset unavailable: {message}")]
    Unavailable {
        /// Locations or backends that were tried, in order
        attempted: Vec<String>,
        message: String,
    },
}

impl DataSourceError {
    pub fn unavailable(attempted: Vec<String>, message: impl Into<String>) -> Self {
        DataSourceError::Unavailable {
            attempted,
            message: message.into(),
        }
    }

    /// Prepend an attempt that happened before this one
    pub fn after(self, attempt: String) -> Self {
        match self {
            DataSourceError::Unavailable {
                mut attempted,
                message,
            } => {
                attempted.insert(0, attempt);
                DataSourceError::Unavailable { attempted, message }
            }
        }
    }
}

// =============================================================================
// Remote Store Errors
// =============================================================================

/// Errors raised by the remote store client
#[derive(Debug, Error)]
pub enum RemoteQueryError {
    /// The request never produced a response (network, DNS, timeout)
    #[error("remote store transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// The store answered with a non-success status
    #[error("remote store returned {status} during {operation}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    /// The response body or headers did not have the expected shape
    #[error("malformed remote response during {operation}: {message}")]
    MalformedResponse { operation: String, message: String },

    /// No remote store is configured for this process
    #[error("remote store is not configured")]
    NotConfigured,
}

impl RemoteQueryError {
    pub fn malformed(operation: &str, message: impl ToString) -> Self {
        RemoteQueryError::MalformedResponse {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn transport(operation: &str, message: impl ToString) -> Self {
        RemoteQueryError::Transport {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config file '{path}': {message}")]
    Unreadable { path: String, message: String },

    /// Configuration could not be parsed
    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    /// A value is present but unusable
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
