//! Products
//!
//! Product reads resolve `category` to `{_id, name}`. Creation checks that
//! the referenced category exists and that every listed subcategory exists
//! and belongs to it.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde_json::Value;

use crate::handlers::{ApiError, ApiOperation, ItemResponse, ListResponse, MessageResponse, Payload};
use crate::ids::ObjectId;
use crate::query::{EntityKind, QueryParams};
use crate::state::AppState;
use crate::store::{Collection, Document, Field, Filter, FilterCondition, FindQuery, Schema, ID_FIELD};

use super::validation::{check_id, slugify, text_of, Checks};
use super::Catalog;

const INVALID_ID: &str = "Invalid ID formate";

/// Store schema for products
pub fn schema() -> Schema {
    Schema::new(EntityKind::Product.as_str())
        .field(
            Field::string("title")
                .required("Title required")
                .unique()
                .trim()
                .min_length(2, "Too short Product title")
                .max_length(100, "Too long Product title"),
        )
        .field(Field::string("slug").required("Product slug required").lowercase())
        .field(
            Field::string("description")
                .required("Description Required")
                .min_length(40, "Too short Product description"),
        )
        .field(Field::number("quantity").required("Product quantity is required"))
        .field(Field::number("sold").default_value(0))
        .field(
            Field::number("price")
                .required("Product price required")
                .max(200_000.0, "too long Product price"),
        )
        .field(Field::number("priceAfterDiscount"))
        .field(Field::strings("colors"))
        .field(Field::string("imageCover").required("Product imageCover IS required"))
        .field(Field::strings("images"))
        .field(
            Field::reference("category", EntityKind::Category.as_str())
                .required("Product must be belong to a category"),
        )
        .field(Field::references("subcategories", EntityKind::SubCategory.as_str()))
        .field(Field::reference("brand", EntityKind::Brand.as_str()))
        .field(
            Field::number("ratingsAverage")
                .min(1.0, "rating must be above or equal 1.0")
                .max(5.0, "rating must be below or equal 5.0"),
        )
        .field(Field::number("ratingsQuantity").default_value(0))
}

/// Check a create body against the catalog and derive its slug
pub async fn validate_create(catalog: &Catalog, mut body: Document) -> Result<Document, ApiError> {
    let mut checks = Checks::new();

    if let Some(title) = checks.required_text(&body, "title", "Product required") {
        checks.length("title", &title, Some((3, "must be at least 3 chars")), None);
        body.insert("slug".to_string(), Value::String(slugify(&title)));
    }
    if let Some(description) = checks.required_text(&body, "description", "Product description is required") {
        checks.length("description", &description, None, Some((2000, "Too long description")));
    }

    checks.number(
        &body,
        "quantity",
        Some("Product quantity is required"),
        "Product quantity must be a number",
    );
    checks.number(&body, "sold", None, "Product quantity must be a number");

    let price = checks.number(
        &body,
        "price",
        Some("Product price is required"),
        "Product price must be a number",
    );
    if let Some(raw) = body.get("price") {
        checks.length("price", &text_of(raw), None, Some((32, "To long price")));
    }
    let discount = checks.number(
        &body,
        "priceAfterDiscount",
        None,
        "Product priceAfterDiscount must be a number",
    );
    if let (Some(price), Some(discount)) = (price, discount) {
        if discount >= price {
            checks.fail(
                "priceAfterDiscount",
                "priceAfterDiscount must be lower than price",
                body.get("priceAfterDiscount"),
            );
        }
    }

    checks.string_list(&body, "colors", "availableColors should be array of string");
    checks.required_text(&body, "imageCover", "Product imageCover is required");
    checks.string_list(&body, "images", "images should be array of string");

    let category = checks.object_id(
        &body,
        "category",
        Some("Product must be belong to a category"),
        INVALID_ID,
    );
    let subcategories = subcategory_ids(&mut checks, &body);
    checks.object_id(&body, "brand", None, INVALID_ID);

    if let Some(rating) = checks.number(&body, "ratingsAverage", None, "ratingsAverage must be a number") {
        if rating < 1.0 {
            checks.fail("ratingsAverage", "Rating must be above or equal 1.0", body.get("ratingsAverage"));
        }
        if rating > 5.0 {
            checks.fail("ratingsAverage", "Rating must be below or equal 5.0", body.get("ratingsAverage"));
        }
    }
    checks.number(&body, "ratingsQuantity", None, "ratingsQuantity must be a number");

    if let Some(id) = &category {
        if !catalog.exists(EntityKind::Category, id).await? {
            checks.fail("category", format!("No category for this id: {id}"), body.get("category"));
        }
    }
    if let Some(ids) = subcategories {
        check_subcategories(catalog, &mut checks, &body, &ids, category.as_deref()).await?;
    }

    checks.finish(ApiOperation::Create)?;
    Ok(body)
}

/// Check an update body, re-deriving the slug when the title changes
pub fn validate_update(id: &str, mut body: Document) -> Result<Document, ApiError> {
    check_id(ApiOperation::Update, id, INVALID_ID)?;
    let mut checks = Checks::new();
    if let Some(title) = checks.optional_text(&body, "title") {
        checks.length("title", &title, Some((3, "must be at least 3 chars")), None);
        body.insert("slug".to_string(), Value::String(slugify(&title)));
    }
    checks.finish(ApiOperation::Update)?;
    Ok(body)
}

fn subcategory_ids(checks: &mut Checks, body: &Document) -> Option<Vec<String>> {
    let ids = checks.string_list(body, "subcategories", "Subcategories should be an array")?;
    if ids.iter().all(|id| ObjectId::is_valid(id)) {
        Some(ids.into_iter().map(|id| id.to_lowercase()).collect())
    } else {
        checks.fail(
            "subcategories",
            "Invalid subcategory ID format",
            body.get("subcategories"),
        );
        None
    }
}

/// Every id must name a subcategory, and all of them must sit under `category`
async fn check_subcategories(
    catalog: &Catalog,
    checks: &mut Checks,
    body: &Document,
    ids: &[String],
    category: Option<&str>,
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }

    let query = FindQuery::new(Filter::new().and(FilterCondition::in_list(ID_FIELD, ids.to_vec())));
    let found = catalog.subcategories().collection().find(query).await?;
    if found.len() != ids.len() {
        checks.fail("subcategories", "Invalid subcategories IDs", body.get("subcategories"));
        return Ok(());
    }

    if let Some(category) = category {
        let foreign = found
            .iter()
            .any(|sub| sub.get("category").and_then(Value::as_str) != Some(category));
        if foreign {
            checks.fail(
                "subcategories",
                "Some subcategories do not belong to the specified category",
                body.get("subcategories"),
            );
        }
    }
    Ok(())
}

/// `/products` and `/products/{id}`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<ListResponse<Document>, ApiError> {
    state.catalog().products().get_all(params, Filter::new()).await
}

async fn create_product(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let document = validate_create(state.catalog(), payload.fields).await?;
    state.catalog().products().create_one(document).await
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse<Document>, ApiError> {
    check_id(ApiOperation::Get, &id, INVALID_ID)?;
    state.catalog().products().get_one(&id).await
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<ItemResponse<Document>, ApiError> {
    let patch = validate_update(&id, payload.fields)?;
    state.catalog().products().update_one(&id, patch).await
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MessageResponse, ApiError> {
    check_id(ApiOperation::Delete, &id, INVALID_ID)?;
    state.catalog().products().delete_one(&id).await
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

    struct Fixture {
        catalog: Catalog,
        phones: String,
        laptops: String,
        android: String,
        ultrabooks: String,
    }

    fn id_of(response: ItemResponse<Document>) -> String {
        response.data["_id"].as_str().unwrap().to_string()
    }

    async fn fixture() -> Fixture {
        let catalog = Catalog::new(&MemoryStore::new(), PaginationPolicy::default());
        let phones = id_of(catalog.categories().create_one(body(json!({"name": "Phones"}))).await.unwrap());
        let laptops = id_of(catalog.categories().create_one(body(json!({"name": "Laptops"}))).await.unwrap());
        let android = id_of(
            catalog
                .subcategories()
                .create_one(body(json!({"name": "Android", "category": phones})))
                .await
                .unwrap(),
        );
        let ultrabooks = id_of(
            catalog
                .subcategories()
                .create_one(body(json!({"name": "Ultrabooks", "category": laptops})))
                .await
                .unwrap(),
        );
        Fixture {
            catalog,
            phones,
            laptops,
            android,
            ultrabooks,
        }
    }

    fn product(category: &str) -> Document {
        body(json!({
            "title": "Galaxy S Phone",
            "description": "A flagship android phone with a large bright display and long battery",
            "quantity": 10,
            "price": 999,
            "imageCover": "cover.jpeg",
            "category": category,
        }))
    }

    fn messages(err: &ApiError) -> Vec<&str> {
        err.errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[tokio::test]
    async fn test_valid_product_passes_and_is_slugged() {
        let f = fixture().await;
        let mut input = product(&f.phones);
        input.insert("subcategories".into(), json!([f.android]));

        let document = validate_create(&f.catalog, input).await.unwrap();
        assert_eq!(document["slug"], "Galaxy-S-Phone");

        let created = f.catalog.products().create_one(document).await.unwrap();
        assert_eq!(created.data["slug"], "galaxy-s-phone");
        assert_eq!(created.data["sold"], json!(0));
    }

    #[tokio::test]
    async fn test_required_fields() {
        let f = fixture().await;
        let err = validate_create(&f.catalog, Document::new()).await.unwrap_err();
        let messages = messages(&err);
        assert!(messages.contains(&"Product required"));
        assert!(messages.contains(&"Product description is required"));
        assert!(messages.contains(&"Product quantity is required"));
        assert!(messages.contains(&"Product price is required"));
        assert!(messages.contains(&"Product imageCover is required"));
        assert!(messages.contains(&"Product must be belong to a category"));
    }

    #[tokio::test]
    async fn test_discount_must_be_lower_than_price() {
        let f = fixture().await;
        let mut input = product(&f.phones);
        input.insert("priceAfterDiscount".into(), json!(1200));

        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["priceAfterDiscount must be lower than price"]);
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let f = fixture().await;
        let mut input = product(&f.phones);
        input.insert("ratingsAverage".into(), json!(6));

        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Rating must be below or equal 5.0"]);
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let f = fixture().await;
        let missing = "65f1c2a9e4b0a1b2c3d4e5f6";
        let err = validate_create(&f.catalog, product(missing)).await.unwrap_err();
        assert_eq!(messages(&err), vec![format!("No category for this id: {missing}").as_str()]);
    }

    #[tokio::test]
    async fn test_subcategory_rules() {
        let f = fixture().await;

        let mut input = product(&f.phones);
        input.insert("subcategories".into(), json!("not-a-list"));
        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Subcategories should be an array"]);

        let mut input = product(&f.phones);
        input.insert("subcategories".into(), json!(["123"]));
        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Invalid subcategory ID format"]);

        let mut input = product(&f.phones);
        input.insert("subcategories".into(), json!([f.android, "65f1c2a9e4b0a1b2c3d4e5f6"]));
        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Invalid subcategories IDs"]);

        let mut input = product(&f.phones);
        input.insert("subcategories".into(), json!([f.android, f.ultrabooks]));
        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(
            messages(&err),
            vec!["Some subcategories do not belong to the specified category"]
        );

        let mut input = product(&f.laptops);
        input.insert("subcategories".into(), json!([f.ultrabooks]));
        assert!(validate_create(&f.catalog, input).await.is_ok());
    }

    #[tokio::test]
    async fn test_numeric_strings_accepted() {
        let f = fixture().await;
        let mut input = product(&f.phones);
        input.insert("price".into(), json!("999.50"));
        input.insert("quantity".into(), json!("3"));
        assert!(validate_create(&f.catalog, input).await.is_ok());

        let mut input = product(&f.phones);
        input.insert("quantity".into(), json!("lots"));
        let err = validate_create(&f.catalog, input).await.unwrap_err();
        assert_eq!(messages(&err), vec!["Product quantity must be a number"]);
    }

    #[tokio::test]
    async fn test_reads_populate_category_name() {
        let f = fixture().await;
        let document = validate_create(&f.catalog, product(&f.phones)).await.unwrap();
        let created = f.catalog.products().create_one(document).await.unwrap();
        let id = created.data["_id"].as_str().unwrap().to_string();

        let found = f.catalog.products().get_one(&id).await.unwrap();
        assert_eq!(found.data["category"], json!({"_id": f.phones, "name": "Phones"}));
    }

    #[test]
    fn test_update_title_reslugs() {
        let patch = validate_update("65f1c2a9e4b0a1b2c3d4e5f6", body(json!({"title": "New Phone"}))).unwrap();
        assert_eq!(patch["slug"], "New-Phone");

        let err = validate_update("bad", Document::new()).unwrap_err();
        assert_eq!(err.message, INVALID_ID);
    }
}
