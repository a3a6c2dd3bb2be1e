//! Subcategories
//!
//! Besides the flat `/subcategories` routes, subcategories are reachable
//! below their parent: `GET /categories/{id}/subcategories` lists only that
//! category's children and `POST` to the same path fills `category` from
//! the path when the body leaves it out.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde_json::Value;

use crate::handlers::{ApiError, ApiOperation, ItemResponse, ListResponse, MessageResponse, Payload};
use crate::query::{EntityKind, QueryParams};
use crate::state::AppState;
use crate::store::{Document, Field, Filter, FilterCondition, Schema};

use super::validation::{check_id, Checks, NameRules};
use super::Catalog;

const INVALID_ID: &str = "Invalid SubCategory Id Format";

const NAME: NameRules = NameRules {
    required: "SubCategory required",
    min: (2, "Too short category name"),
    max: (32, "Too long category name"),
};

/// Store schema for subcategories
pub fn schema() -> Schema {
    Schema::new(EntityKind::SubCategory.as_str())
        .field(
            Field::string("name")
                .trim()
                .unique()
                .min_length(2, "Too short subcategory name")
                .max_length(32, "Too long subcategory name"),
        )
        .field(Field::string("slug").lowercase())
        .field(
            Field::reference("category", EntityKind::Category.as_str())
                .required("SubCategory must be belong to parent category"),
        )
}

/// Check a create body: name, slug and an existing parent category
pub async fn validate_create(catalog: &Catalog, mut body: Document) -> Result<Document, ApiError> {
    let mut checks = Checks::new();
    NAME.apply(&mut checks, &mut body, true);

    let category = checks.object_id(
        &body,
        "category",
        Some("Subcategory must belong to a category"),
        "Invalid ID format",
    );
    if let Some(id) = category {
        if !catalog.exists(EntityKind::Category, &id).await? {
            checks.fail(
                "category",
                format!("No category found for this id: {id}"),
                body.get("category"),
            );
        }
    }

    checks.finish(ApiOperation::Create)?;
    Ok(body)
}

/// Check an update body; a new parent category must exist
pub async fn validate_update(catalog: &Catalog, id: &str, mut body: Document) -> Result<Document, ApiError> {
    check_id(ApiOperation::Update, id, INVALID_ID)?;
    let mut checks = Checks::new();
    NAME.apply(&mut checks, &mut body, false);

    if let Some(category) = checks.object_id(&body, "category", None, "Invalid ID format") {
        if !catalog.exists(EntityKind::Category, &category).await? {
            checks.fail(
                "category",
                format!("No category for this id: {category}"),
                body.get("category"),
            );
        }
    }

    checks.finish(ApiOperation::Update)?;
    Ok(body)
}

/// Flat and category-nested subcategory routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subcategories", get(list_subcategories).post(create_subcategory))
        .route(
            "/subcategories/{id}",
            get(get_subcategory).put(update_subcategory).delete(delete_subcategory),
        )
        .route(
            "/categories/{id}/subcategories",
            get(list_category_subcategories).post(create_category_subcategory),
        )
}

async fn list_subcategories(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<ListResponse<Document>, ApiError> {
    state.catalog().subcategories().get_all(params, Filter::new()).await
}

async fn list_category_subcategories(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<ListResponse<Document>, ApiError> {
    let preset = Filter::new().and(FilterCondition::eq("category", category_id.to_lowercase()));
    state.catalog().subcategories().get_all(params, preset).await
}

async fn create_subcategory(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let document = validate_create(state.catalog(), payload.fields).await?;
    state.catalog().subcategories().create_one(document).await
}

async fn create_category_subcategory(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    mut payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let has_category = payload
        .fields
        .get("category")
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
    if !has_category {
        payload
            .fields
            .insert("category".to_string(), Value::String(category_id));
    }
    let document = validate_create(state.catalog(), payload.fields).await?;
    state.catalog().subcategories().create_one(document).await
}

async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Document>, ApiError> {
    check_id(ApiOperation::Get, &id, INVALID_ID)?;
    state.catalog().subcategories().get_one(&id).await
}

async fn update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let patch = validate_update(state.catalog(), &id, payload.fields).await?;
    state.catalog().subcategories().update_one(&id, patch).await
}

async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    check_id(ApiOperation::Delete, &id, INVALID_ID)?;
    state.catalog().subcategories().delete_one(&id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PaginationPolicy;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn body(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    async fn catalog_with_category() -> (Catalog, String) {
        let catalog = Catalog::new(&MemoryStore::new(), PaginationPolicy::default());
        let created = catalog
            .categories()
            .create_one(body(json!({"name": "Phones"})))
            .await
            .unwrap();
        let id = created.data["_id"].as_str().unwrap().to_string();
        (catalog, id)
    }

    #[tokio::test]
    async fn test_create_with_existing_category() {
        let (catalog, category) = catalog_with_category().await;
        let document = validate_create(&catalog, body(json!({"name": "Android", "category": category})))
            .await
            .unwrap();
        assert_eq!(document["slug"], "Android");
    }

    #[tokio::test]
    async fn test_create_category_rules() {
        let (catalog, _) = catalog_with_category().await;

        let err = validate_create(&catalog, body(json!({"name": "Android"}))).await.unwrap_err();
        assert_eq!(err.message, "Subcategory must belong to a category");

        let err = validate_create(&catalog, body(json!({"name": "Android", "category": "123"})))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid ID format");

        let missing = "65f1c2a9e4b0a1b2c3d4e5f6";
        let err = validate_create(&catalog, body(json!({"name": "Android", "category": missing})))
            .await
            .unwrap_err();
        assert_eq!(err.message, format!("No category found for this id: {missing}"));
    }

    #[tokio::test]
    async fn test_create_name_rules() {
        let (catalog, category) = catalog_with_category().await;
        let err = validate_create(&catalog, body(json!({"name": "A", "category": category})))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Too short category name");
    }

    #[tokio::test]
    async fn test_update_category_must_exist() {
        let (catalog, category) = catalog_with_category().await;
        let id = "65f1c2a9e4b0a1b2c3d4e5f6";

        assert!(validate_update(&catalog, id, body(json!({"category": category})))
            .await
            .is_ok());

        let err = validate_update(&catalog, id, body(json!({"category": id})))
            .await
            .unwrap_err();
        assert_eq!(err.message, format!("No category for this id: {id}"));
    }
}
