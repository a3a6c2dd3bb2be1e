//! HTTP-facing building blocks for entity endpoints
//!
//! - [`EntityHandlers`]: the five CRUD operations over any store collection
//! - [`ApiError`]: structured failures with automatic HTTP status mapping
//! - [`ItemResponse`], [`ListResponse`], [`MessageResponse`]: success bodies
//! - [`Payload`]: JSON or multipart request bodies
//!
//! # Integration with Axum
//!
//! The response types implement `IntoResponse`, so entity routes return them
//! directly:
//!
//! ```rust,ignore
//! async fn get_brand(
//!     State(state): State<AppState>,
//!     Path(id): Path<String>,
//! ) -> Result<ItemResponse<Document>, ApiError> {
//!     validation::check_id(&id, "Brand")?;
//!     state.catalog().brands().get_one(&id).await
//! }
//! ```

mod error;
mod extract;
mod factory;
mod response;

pub use error::{ApiError, ApiErrorKind, ApiOperation, FieldError};
pub use extract::{Payload, UploadedFile};
pub use factory::EntityHandlers;
pub use response::{ItemResponse, ListResponse, MessageResponse};
