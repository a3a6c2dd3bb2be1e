//! Store error types
//!
//! Structured errors for document-store operations. Every error records which
//! operation failed, the category of failure and, where known, the collection
//! and document involved.
//!
//! ```rust
//! use catalog_service::store::{StoreError, StoreErrorKind};
//!
//! let error = StoreError::already_exists("Category", "name", "Phones");
//! assert_eq!(error.kind, StoreErrorKind::AlreadyExists);
//! assert_eq!(error.entity_id.as_deref(), Some("Phones"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operation being performed when the store error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Running a find query
    Find,
    /// Counting documents
    Count,
    /// Looking a document up by id
    FindById,
    /// Inserting a document
    Create,
    /// Find-by-id-and-update
    Update,
    /// Find-by-id-and-delete
    Delete,
    /// Removing every document that matches a filter
    DeleteMany,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find => write!(f, "find"),
            Self::Count => write!(f, "count_documents"),
            Self::FindById => write!(f, "find_by_id"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "find_by_id_and_update"),
            Self::Delete => write!(f, "find_by_id_and_delete"),
            Self::DeleteMany => write!(f, "delete_many"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Document was not found
    NotFound,
    /// A unique field already holds the value
    AlreadyExists,
    /// Schema validation rejected the document
    ValidationFailed,
    /// The identifier is not a valid object id
    InvalidId,
    /// The query descriptor could not be interpreted
    MalformedQuery,
    /// Other unclassified error
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::InvalidId => write!(f, "invalid_id"),
            Self::MalformedQuery => write!(f, "malformed_query"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Name of the offending field
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldViolation {
    /// Create a new field violation
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The collection involved (e.g. "Product")
    pub entity_type: Option<String>,
    /// The id or unique value involved
    pub entity_id: Option<String>,
    /// Per-field validation failures
    pub violations: Vec<FieldViolation>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(operation: StoreOperation, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
            violations: Vec::new(),
        }
    }

    /// Create a duplicate-key error
    pub fn already_exists(
        entity_type: impl Into<String>,
        field: &str,
        value: impl Into<String>,
    ) -> Self {
        let value = value.into();
        Self::new(
            StoreOperation::Create,
            StoreErrorKind::AlreadyExists,
            format!("Duplicate value for unique field '{field}': {value}"),
        )
        .with_entity(entity_type, value)
    }

    /// Create a schema validation error from the collected violations
    pub fn validation_failed(entity_type: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        let entity_type = entity_type.into();
        let summary = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            operation: StoreOperation::Create,
            kind: StoreErrorKind::ValidationFailed,
            message: format!("{entity_type} validation failed: {summary}"),
            entity_type: Some(entity_type),
            entity_id: None,
            violations,
        }
    }

    /// Create an invalid-id error
    pub fn invalid_id(operation: StoreOperation, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            entity_id: Some(id.clone()),
            ..Self::new(
                operation,
                StoreErrorKind::InvalidId,
                format!("Invalid object id: {id}"),
            )
        }
    }

    /// Create a malformed-query error
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::new(StoreOperation::Find, StoreErrorKind::MalformedQuery, message)
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
    pub fn with_operation(mut self, operation: StoreOperation) -> Self {
        self.operation = operation;
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{entity_type}: {entity_id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_operation_display() {
        assert_eq!(StoreOperation::Find.to_string(), "find");
        assert_eq!(StoreOperation::Count.to_string(), "count_documents");
        assert_eq!(StoreOperation::Update.to_string(), "find_by_id_and_update");
        assert_eq!(StoreOperation::Delete.to_string(), "find_by_id_and_delete");
    }

    #[test]
    fn test_invalid_id_carries_entity() {
        let error = StoreError::invalid_id(StoreOperation::FindById, "abc").with_entity("Brand", "abc");
        assert_eq!(error.kind, StoreErrorKind::InvalidId);
        assert_eq!(error.entity_type.as_deref(), Some("Brand"));
        assert_eq!(
            error.to_string(),
            "Store invalid_id error during find_by_id: Invalid object id: abc [Brand: abc]"
        );
    }

    #[test]
    fn test_validation_failed_summarises_violations() {
        let error = StoreError::validation_failed(
            "Category",
            vec![
                FieldViolation::new("name", "is required"),
                FieldViolation::new("slug", "must be lowercase"),
            ],
        );
        assert_eq!(error.kind, StoreErrorKind::ValidationFailed);
        assert_eq!(error.violations.len(), 2);
        assert!(error.message.contains("name: is required"));
    }

    #[test]
    fn test_already_exists_message() {
        let error = StoreError::already_exists("Category", "name", "Phones");
        assert_eq!(error.kind, StoreErrorKind::AlreadyExists);
        assert_eq!(error.entity_id.as_deref(), Some("Phones"));
        assert!(error.message.contains("'name'"));
    }

    #[test]
    fn test_with_operation() {
        let error = StoreError::invalid_id(StoreOperation::FindById, "x").with_operation(StoreOperation::Delete);
        assert_eq!(error.operation, StoreOperation::Delete);
    }
}
