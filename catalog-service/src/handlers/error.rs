//! API error types for handler operations
//!
//! Structured errors for REST handlers, with HTTP status mapping via
//! `IntoResponse`. Client errors (4xx) answer with `status: "fail"`, server
//! errors with `status: "error"`.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("Brand", "65f1c2a9e4b0a1b2c3d4e5f6");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.message, "No Brand found for this id 65f1c2a9e4b0a1b2c3d4e5f6");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{FieldViolation, StoreError, StoreErrorKind, StoreOperation};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing entities
    List,
    /// Getting a single entity by ID
    Get,
    /// Creating a new entity
    Create,
    /// Updating an existing entity
    Update,
    /// Deleting an entity
    Delete,
    /// Resolving the route itself
    Route,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Route => write!(f, "route"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Entity or route was not found
    NotFound,
    /// A unique value is already taken
    AlreadyExists,
    /// Request or document validation failed
    ValidationFailed,
    /// Invalid request format or parameters
    BadRequest,
    /// The list query could not be interpreted
    MalformedQuery,
    /// Internal server error
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::MalformedQuery => write!(f, "malformed_query"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::ValidationFailed | Self::BadRequest | Self::MalformedQuery => StatusCode::BAD_REQUEST,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }
}

/// One invalid request field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Why the field was rejected
    pub message: String,
    /// The rejected value, when it came from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldError {
    /// Create a field error without a value
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the rejected value
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

impl From<FieldViolation> for FieldError {
    fn from(violation: FieldViolation) -> Self {
        Self::new(violation.field, violation.message)
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "Product")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
    /// Per-field failures
    pub errors: Vec<FieldError>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            errors: Vec::new(),
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();
        Self::new(
            ApiOperation::Get,
            ApiErrorKind::NotFound,
            format!("No {entity_type} found for this id {entity_id}"),
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create an error for a path no route serves
    pub fn route_not_found(uri: impl fmt::Display) -> Self {
        Self::new(
            ApiOperation::Route,
            ApiErrorKind::NotFound,
            format!("Can't find this route: {uri}"),
        )
    }

    /// Create a validation failed error from per-field failures
    pub fn validation_failed(operation: ApiOperation, errors: Vec<FieldError>) -> Self {
        let summary = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            errors,
            ..Self::new(operation, ApiErrorKind::ValidationFailed, summary)
        }
    }

    /// Create a bad request error
    pub fn bad_request(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::BadRequest, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::InternalError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// `"fail"` for client errors, `"error"` otherwise
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.kind.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{entity_type}: {entity_id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorResponse {
    status: String,
    code: String,
    message: String,
    operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                fields = self.errors.len(),
                "API error: {}", self.message
            );
        }

        let response = ApiErrorResponse {
            status: self.status_label().to_string(),
            code: self.kind.error_code(),
            message: self.message,
            operation: self.operation.to_string(),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            errors: self.errors,
        };

        (status, Json(response)).into_response()
    }
}

/// Convert StoreOperation to ApiOperation
fn store_operation_to_api_operation(op: StoreOperation) -> ApiOperation {
    match op {
        StoreOperation::Find | StoreOperation::Count => ApiOperation::List,
        StoreOperation::FindById => ApiOperation::Get,
        StoreOperation::Create => ApiOperation::Create,
        StoreOperation::Update => ApiOperation::Update,
        StoreOperation::Delete | StoreOperation::DeleteMany => ApiOperation::Delete,
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let operation = store_operation_to_api_operation(err.operation);

        let kind = match err.kind {
            StoreErrorKind::NotFound => ApiErrorKind::NotFound,
            StoreErrorKind::AlreadyExists => ApiErrorKind::AlreadyExists,
            StoreErrorKind::ValidationFailed => ApiErrorKind::ValidationFailed,
            StoreErrorKind::InvalidId => ApiErrorKind::BadRequest,
            StoreErrorKind::MalformedQuery => ApiErrorKind::MalformedQuery,
            StoreErrorKind::Other => ApiErrorKind::InternalError,
        };

        // Internal details stay in the logs
        let message = match kind {
            ApiErrorKind::InternalError => {
                tracing::error!(error = %err, "store failure");
                "An internal error occurred".to_string()
            }
            _ => err.message,
        };

        Self {
            operation,
            kind,
            message,
            entity_type: err.entity_type,
            entity_id: err.entity_id,
            errors: err.violations.into_iter().map(FieldError::from).collect(),
        }
    }
}
