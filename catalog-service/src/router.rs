//! Top-level router
//!
//! ```text
//! /health                     liveness
//! /ready                      readiness
//! /api/v1/categories[...]     category, nested subcategory routes
//! /api/v1/subcategories[...]
//! /api/v1/brands[...]
//! /api/v1/products[...]
//! ```
//!
//! Anything else answers 404 through [`ApiError::route_not_found`].

use axum::{http::Uri, routing::get, Router};

use crate::catalog;
use crate::handlers::ApiError;
use crate::health::{health, readiness};
use crate::state::AppState;

/// Prefix of every catalog route
pub const API_PREFIX: &str = "/api/v1";

/// Assemble the application router over `state`
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .nest(API_PREFIX, catalog::routes())
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const MISSING_ID: &str = "65f1c2a9e4b0a1b2c3d4e5f6";

    struct TestApp {
        router: Router,
        _uploads: tempfile::TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.uploads.directory = uploads.path().to_path_buf();
            Self {
                router: build_router(AppState::new(config)),
                _uploads: uploads,
            }
        }

        fn uploads(&self) -> &std::path::Path {
            self._uploads.path()
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response: Response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
        }

        async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(request).await
        }

        async fn create(&self, uri: &str, body: Value) -> String {
            let (status, body) = self.json(Method::POST, uri, body).await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["data"]["_id"].as_str().unwrap().to_string()
        }
    }

    fn product(title: &str, price: u32, category: &str) -> Value {
        json!({
            "title": title,
            "description": "Plenty of words so the description is comfortably over forty chars",
            "quantity": 4,
            "price": price,
            "imageCover": "cover.jpeg",
            "category": category,
        })
    }

    fn multipart(boundary: &str, parts: &[(&str, Option<(&str, &str)>, &str)]) -> Body {
        let mut body = String::new();
        for (name, file, value) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            match file {
                Some((file_name, content_type)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        Body::from(body)
    }

    #[tokio::test]
    async fn test_category_crud_roundtrip() {
        let app = TestApp::new();

        let (status, created) = app
            .json(Method::POST, "/api/v1/categories", json!({"name": "Home Appliances"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Successfully created");
        assert_eq!(created["data"]["slug"], "home-appliances");
        let id = created["data"]["_id"].as_str().unwrap().to_string();

        let (status, found) = app.get(&format!("/api/v1/categories/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["message"], "Success");
        assert_eq!(found["data"]["name"], "Home Appliances");

        let (status, updated) = app
            .json(Method::PUT, &format!("/api/v1/categories/{id}"), json!({"name": "Kitchen"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["message"], "Updated Successfully");
        assert_eq!(updated["data"]["slug"], "kitchen");

        let (status, deleted) = app.delete(&format!("/api/v1/categories/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, json!({"message": "Deleted successfully"}));

        let (status, missing) = app.get(&format!("/api/v1/categories/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["status"], "fail");
        assert_eq!(missing["message"], format!("No Category found for this id {id}"));
    }

    #[tokio::test]
    async fn test_invalid_and_missing_ids() {
        let app = TestApp::new();

        let (status, body) = app.get("/api/v1/brands/not-an-id").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["message"], "Invalid Brand Id Format");

        let (status, _) = app.delete(&format!("/api/v1/products/{MISSING_ID}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .json(Method::PUT, &format!("/api/v1/subcategories/{MISSING_ID}"), json!({"name": "New"}))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["operation"], "update");
    }

    #[tokio::test]
    async fn test_uppercase_ids_resolve() {
        let app = TestApp::new();
        let id = app.create("/api/v1/categories", json!({"name": "Phones"})).await;
        let upper = id.to_ascii_uppercase();

        let (status, found) = app.get(&format!("/api/v1/categories/{upper}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["data"]["_id"], id.as_str());

        let (status, _) = app.delete(&format!("/api/v1/categories/{upper}")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get(&format!("/api/v1/categories/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_validation_and_duplicates() {
        let app = TestApp::new();

        let (status, body) = app.json(Method::POST, "/api/v1/brands", json!({"name": "AB"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][0]["message"], "Too short Brand name");

        app.create("/api/v1/brands", json!({"name": "Acme"})).await;
        let (status, body) = app.json(Method::POST, "/api/v1/brands", json!({"name": "Acme"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_product_list_query_features() {
        let app = TestApp::new();
        let category = app.create("/api/v1/categories", json!({"name": "Phones"})).await;
        for (i, price) in [100, 250, 400, 550, 700, 850, 990].iter().enumerate() {
            app.create("/api/v1/products", product(&format!("Phone {i}"), *price, &category))
                .await;
        }

        let (status, body) = app
            .get("/api/v1/products?price[gte]=250&price[lte]=850&sort=price&fields=title,price&page=2&limit=2")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "success");
        assert_eq!(body["result"], 2);
        assert_eq!(body["paginationResult"]["currentPage"], 2);
        assert_eq!(body["paginationResult"]["limit"].as_u64(), None);
        assert_eq!(body["paginationResult"]["resultsPerPage"], 2);
        // total counts the unfiltered collection
        assert_eq!(body["paginationResult"]["totalPages"], 4);
        let prices: Vec<_> = body["data"].as_array().unwrap().iter().map(|d| d["price"].clone()).collect();
        assert_eq!(prices, vec![json!(550), json!(700)]);
        assert!(body["data"][0].get("description").is_none());

        let (_, body) = app.get("/api/v1/products?keyword=PHONE%203").await;
        assert_eq!(body["result"], 1);
        assert_eq!(body["data"][0]["title"], "Phone 3");
        assert_eq!(body["data"][0]["category"]["name"], "Phones");
    }

    #[tokio::test]
    async fn test_malformed_filter_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/v1/products?price%5Bgte=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_QUERY");

        let (status, body) = app.get("/api/v1/products?=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], 0);
    }

    #[tokio::test]
    async fn test_nested_subcategories() {
        let app = TestApp::new();
        let phones = app.create("/api/v1/categories", json!({"name": "Phones"})).await;
        let laptops = app.create("/api/v1/categories", json!({"name": "Laptops"})).await;

        app.create(&format!("/api/v1/categories/{phones}/subcategories"), json!({"name": "Android"}))
            .await;
        app.create(&format!("/api/v1/categories/{phones}/subcategories"), json!({"name": "iOS"}))
            .await;
        app.create("/api/v1/subcategories", json!({"name": "Ultrabooks", "category": laptops}))
            .await;

        let (status, body) = app.get(&format!("/api/v1/categories/{phones}/subcategories")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], 2);
        assert!(body["data"].as_array().unwrap().iter().all(|d| d["category"] == phones.as_str()));

        let (_, body) = app.get("/api/v1/subcategories").await;
        assert_eq!(body["result"], 3);

        let (status, body) = app
            .json(
                Method::POST,
                &format!("/api/v1/categories/{MISSING_ID}/subcategories"),
                json!({"name": "Orphan"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], format!("No category found for this id: {MISSING_ID}"));
    }

    #[tokio::test]
    async fn test_category_image_upload() {
        let app = TestApp::new();
        let boundary = "CATALOGBOUNDARY";
        let request = Request::post("/api/v1/categories")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(multipart(
                boundary,
                &[
                    ("name", None, "Cameras"),
                    ("image", Some(("cam.png", "image/png")), "PNGBYTES"),
                ],
            ))
            .unwrap();

        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let image = body["data"]["image"].as_str().unwrap();
        assert!(image.starts_with("category-"));
        assert!(app.uploads().join("categories").join(image).exists());
    }

    #[tokio::test]
    async fn test_non_image_upload_rejected() {
        let app = TestApp::new();
        let boundary = "CATALOGBOUNDARY";
        let request = Request::post("/api/v1/brands")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(multipart(
                boundary,
                &[
                    ("name", None, "Acme"),
                    ("image", Some(("notes.txt", "text/plain")), "hello"),
                ],
            ))
            .unwrap();

        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only Images allowed");

        let (_, list) = app.get("/api/v1/brands").await;
        assert_eq!(list["result"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/v1/orders").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Can't find this route: /api/v1/orders");
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.get("/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }
}
