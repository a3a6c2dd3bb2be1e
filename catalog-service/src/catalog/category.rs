//! Categories

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};

use crate::handlers::{ApiError, ApiOperation, ItemResponse, ListResponse, MessageResponse, Payload};
use crate::query::{EntityKind, QueryParams};
use crate::state::AppState;
use crate::store::{Document, Field, Filter, Schema};

use super::validation::{check_id, Checks, NameRules};
use super::{store_image, take_image};

const INVALID_ID: &str = "Invalid Category Id Format";

const NAME: NameRules = NameRules {
    required: "Category required",
    min: (3, "Too short category name"),
    max: (32, "Too long category name"),
};

/// Store schema for categories
pub fn schema() -> Schema {
    Schema::new(EntityKind::Category.as_str())
        .field(
            Field::string("name")
                .required("Category required")
                .unique()
                .min_length(3, "Too short category name")
                .max_length(32, "Too long category name"),
        )
        .field(Field::string("slug").lowercase())
        .field(Field::string("image"))
}

/// Check a create body and derive its slug
pub fn validate_create(mut body: Document) -> Result<Document, ApiError> {
    let mut checks = Checks::new();
    NAME.apply(&mut checks, &mut body, true);
    checks.finish(ApiOperation::Create)?;
    Ok(body)
}

/// Check an update body, re-deriving the slug when the name changes
pub fn validate_update(id: &str, mut body: Document) -> Result<Document, ApiError> {
    check_id(ApiOperation::Update, id, INVALID_ID)?;
    let mut checks = Checks::new();
    NAME.apply(&mut checks, &mut body, false);
    checks.finish(ApiOperation::Update)?;
    Ok(body)
}

/// `/categories` and `/categories/{id}`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<ListResponse<Document>, ApiError> {
    state.catalog().categories().get_all(params, Filter::new()).await
}

async fn create_category(
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let image = take_image(state.images(), &mut payload)?;
    let mut document = validate_create(payload.fields)?;
    store_image(state.images(), EntityKind::Category, image, &mut document).await?;
    state.catalog().categories().create_one(document).await
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Document>, ApiError> {
    check_id(ApiOperation::Get, &id, INVALID_ID)?;
    state.catalog().categories().get_one(&id).await
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let patch = validate_update(&id, payload.fields)?;
    state.catalog().categories().update_one(&id, patch).await
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    check_id(ApiOperation::Delete, &id, INVALID_ID)?;
    state.catalog().categories().delete_one(&id).await
}
