//! The catalog: categories, subcategories, brands and products
//!
//! Each entity module owns its store schema, its request validators and its
//! axum routes. [`Catalog`] wires one [`EntityHandlers`] per entity onto a
//! shared [`MemoryStore`] so references between entities resolve.

pub mod brand;
pub mod category;
pub mod product;
pub mod subcategory;
pub mod validation;

use axum::Router;
use serde_json::Value;

use crate::handlers::{ApiError, EntityHandlers, Payload, UploadedFile};
use crate::query::{EntityKind, PaginationPolicy};
use crate::state::AppState;
use crate::store::{Collection, Document, MemoryCollection, MemoryStore, Populate, Schema};
use crate::uploads::ImageStore;

/// Handlers for every catalog entity
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: EntityHandlers<MemoryCollection>,
    subcategories: EntityHandlers<MemoryCollection>,
    brands: EntityHandlers<MemoryCollection>,
    products: EntityHandlers<MemoryCollection>,
}

impl Catalog {
    /// Register the catalog collections in `store`
    pub fn new(store: &MemoryStore, policy: PaginationPolicy) -> Self {
        let handlers = |schema: Schema, kind: EntityKind| {
            EntityHandlers::new(store.collection(schema), kind).with_policy(policy)
        };

        Self {
            categories: handlers(category::schema(), EntityKind::Category),
            subcategories: handlers(subcategory::schema(), EntityKind::SubCategory),
            brands: handlers(brand::schema(), EntityKind::Brand),
            products: handlers(product::schema(), EntityKind::Product)
                .with_populate(Populate::new("category", EntityKind::Category.as_str()).select(["name"])),
        }
    }

    /// Category handlers
    pub fn categories(&self) -> &EntityHandlers<MemoryCollection> {
        &self.categories
    }

    /// Subcategory handlers
    pub fn subcategories(&self) -> &EntityHandlers<MemoryCollection> {
        &self.subcategories
    }

    /// Brand handlers
    pub fn brands(&self) -> &EntityHandlers<MemoryCollection> {
        &self.brands
    }

    /// Product handlers
    pub fn products(&self) -> &EntityHandlers<MemoryCollection> {
        &self.products
    }

    /// Handlers for `kind`
    pub fn handlers(&self, kind: EntityKind) -> &EntityHandlers<MemoryCollection> {
        match kind {
            EntityKind::Category => &self.categories,
            EntityKind::SubCategory => &self.subcategories,
            EntityKind::Brand => &self.brands,
            EntityKind::Product => &self.products,
        }
    }

    /// Whether a `kind` document with `id` exists
    pub async fn exists(&self, kind: EntityKind, id: &str) -> Result<bool, ApiError> {
        let found = self.handlers(kind).collection().find_by_id(id, &[]).await?;
        Ok(found.is_some())
    }
}

/// All catalog routes, relative to the API prefix
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(category::routes())
        .merge(subcategory::routes())
        .merge(brand::routes())
        .merge(product::routes())
}

/// Split the `image` upload off a payload, rejecting non-image files early
fn take_image(images: &ImageStore, payload: &mut Payload) -> Result<Option<UploadedFile>, ApiError> {
    let Some(file) = payload.take_file("image") else {
        return Ok(None);
    };
    images.accept(&file)?;
    Ok(Some(file))
}

/// Persist an accepted upload and record its file name in `document`
async fn store_image(
    images: &ImageStore,
    kind: EntityKind,
    file: Option<UploadedFile>,
    document: &mut Document,
) -> Result<(), ApiError> {
    if let Some(file) = file {
        let name = images.save(kind, &file).await?;
        document.insert("image".to_string(), Value::String(name));
    }
    Ok(())
}
