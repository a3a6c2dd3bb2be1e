//! Response types for REST handlers
//!
//! Every success body carries a human-readable `message`:
//!
//! | Operation | Status | Body |
//! |-----------|--------|------|
//! | create    | 201    | `{message: "Successfully created", data}` |
//! | get one   | 200    | `{message: "Success", data}` |
//! | update    | 200    | `{message: "Updated Successfully", data}` |
//! | delete    | 200    | `{message: "Deleted successfully"}` |
//! | list      | 200    | `{message: "success", paginationResult, result, data}` |
//!
//! # Example
//!
//! ```rust
//! use catalog_service::handlers::ItemResponse;
//!
//! let response = ItemResponse::created("phones");
//! assert_eq!(response.message, "Successfully created");
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::query::PaginationResult;

/// Single item response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse<T> {
    /// Outcome message
    pub message: &'static str,
    /// The response data
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ItemResponse<T> {
    /// 201 response for a newly created entity
    pub fn created(data: T) -> Self {
        Self {
            message: "Successfully created",
            data,
            status: StatusCode::CREATED,
        }
    }

    /// 200 response for a fetched entity
    pub fn found(data: T) -> Self {
        Self {
            message: "Success",
            data,
            status: StatusCode::OK,
        }
    }

    /// 200 response for an updated entity
    pub fn updated(data: T) -> Self {
        Self {
            message: "Updated Successfully",
            data,
            status: StatusCode::OK,
        }
    }

    /// HTTP status the response is sent with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Body-less confirmation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Outcome message
    pub message: &'static str,
}

impl MessageResponse {
    /// Confirmation of a delete
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            message: "Deleted successfully",
        }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Outcome message
    pub message: &'static str,
    /// Page metadata
    pub pagination_result: PaginationResult,
    /// Number of items on this page
    pub result: usize,
    /// The items
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Create a list response; `result` is the length of `data`
    pub fn new(data: Vec<T>, pagination_result: PaginationResult) -> Self {
        Self {
            message: "success",
            pagination_result,
            result: data.len(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
