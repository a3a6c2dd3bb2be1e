//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::AppState;
use crate::store::{Collection, Filter};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: BTreeMap<String, DependencyStatus>,

    /// Documents per collection
    pub collections: BTreeMap<String, u64>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// Counts every store collection and checks the upload directory can be
/// created. Returns 503 Service Unavailable if either fails.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let mut dependencies = BTreeMap::new();
    let mut collections = BTreeMap::new();
    let mut all_ready = true;

    let mut store_error = None;
    for name in state.store().collection_names() {
        let Some(collection) = state.store().get(&name) else {
            continue;
        };
        match collection.count_documents(&Filter::new()).await {
            Ok(count) => {
                collections.insert(name, count);
            }
            Err(e) => {
                tracing::error!(collection = %name, error = %e, "Store health check failed");
                store_error = Some(e.to_string());
            }
        }
    }
    all_ready &= store_error.is_none();
    dependencies.insert(
        "store".to_string(),
        DependencyStatus {
            healthy: store_error.is_none(),
            message: Some(store_error.unwrap_or_else(|| format!("{} collections", collections.len()))),
        },
    );

    let uploads = state.images().directory();
    let uploads_status = match tokio::fs::create_dir_all(uploads).await {
        Ok(()) => DependencyStatus {
            healthy: true,
            message: Some(uploads.display().to_string()),
        },
        Err(e) => {
            tracing::error!(directory = %uploads.display(), error = %e, "Upload directory unavailable");
            all_ready = false;
            DependencyStatus {
                healthy: false,
                message: Some(format!("{}: {e}", uploads.display())),
            }
        }
    };
    dependencies.insert("uploads".to_string(), uploads_status);

    let status = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadinessResponse {
        ready: all_ready,
        service: state.config().service.name.clone(),
        dependencies,
        collections,
    };

    (status, Json(response))
}
