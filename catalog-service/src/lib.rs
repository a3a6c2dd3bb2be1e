//! # catalog-service
//!
//! REST backend for an e-commerce catalog: categories, subcategories, brands
//! and products, stored in a document collection and served over axum.
//!
//! ## Features
//!
//! - **Generic CRUD**: one handler factory drives every entity
//! - **List queries**: filtering with `gte`/`gt`/`lte`/`lt`/`in` operators,
//!   keyword search, multi-field sort, field projection and pagination
//! - **Validation**: per-entity request validators plus schema rules in the store
//! - **Image uploads**: multipart images for categories and brands
//! - **Middleware stack**: request tracking, panic recovery, body size limits,
//!   compression, CORS and timeouts
//! - **Health checks**: liveness and readiness probes
//! - **Graceful shutdown**: proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config);
//!
//!     // Build application state and router
//!     let app = build_router(AppState::new(config.clone()));
//!
//!     // Run server
//!     Server::new(config).serve(app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod query;
pub mod router;
pub mod seed;
pub mod server;
pub mod state;
pub mod store;
pub mod uploads;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{
        ApiError, ApiErrorKind, ApiOperation, EntityHandlers, FieldError, ItemResponse,
        ListResponse, MessageResponse, Payload,
    };
    pub use crate::health::{health, readiness};
    pub use crate::ids::{MakeTypedRequestId, ObjectId, RequestId};
    pub use crate::middleware::{
        request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
        REQUEST_ID_HEADER, SENSITIVE_HEADERS,
    };
    pub use crate::observability::init_tracing;
    pub use crate::query::{EntityKind, PaginationPolicy, PaginationResult, QueryParams};
    pub use crate::router::build_router;
    pub use crate::seed::{SeedReport, Seeder};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{Collection, Document, Filter, MemoryCollection, MemoryStore};
    pub use crate::uploads::ImageStore;

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, post, put},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
}
