//! Brands

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

const INVALID_ID: &str = "Invalid Brand Id Format";

const NAME: NameRules = NameRules {
    required: "Brand required",
    min: (3, "Too short Brand name"),
    max: (32, "Too long Brand name"),
};

/// Store schema for brands
pub fn schema() -> Schema {
    Schema::new(EntityKind::Brand.as_str())
        .field(
            Field::string("name")
                .required("brand required")
                .unique()
                .min_length(3, "Too short Brand name")
                .max_length(32, "Too long Brand name"),
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

/// `/brands` and `/brands/{id}`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
}

async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<ListResponse<Document>, ApiError> {
    state.catalog().brands().get_all(params, Filter::new()).await
}

async fn create_brand(
    State(state): State<AppState>,
    mut payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let image = take_image(state.images(), &mut payload)?;
    let mut document = validate_create(payload.fields)?;
    store_image(state.images(), EntityKind::Brand, image, &mut document).await?;
    state.catalog().brands().create_one(document).await
}

async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Document>, ApiError> {
    check_id(ApiOperation::Get, &id, INVALID_ID)?;
    state.catalog().brands().get_one(&id).await
}

async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let patch = validate_update(&id, payload.fields)?;
    state.catalog().brands().update_one(&id, patch).await
}

async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    check_id(ApiOperation::Delete, &id, INVALID_ID)?;
    state.catalog().brands().delete_one(&id).await
}
