//! Collection trait
//!
//! The contract every document-store adapter provides to the handler layer.
//! Methods use RPITIT (return position `impl Trait` in traits), so adapters
//! can be written with plain `async fn` and no boxing.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_service::store::{Collection, Filter, FilterCondition, FindQuery};
//!
//! async fn phones<C: Collection>(products: &C) -> StoreResult<Vec<Document>> {
//!     let filter = Filter::new().and(FilterCondition::eq("category", phones_id));
//!     products.find(FindQuery::new(filter).limit(10)).await
//! }
//! ```

use std::future::Future;

use super::document::Document;
use super::error::StoreResult;
use super::query::{Filter, FindQuery, Populate, UpdateOptions};

/// A handle to one document collection
///
/// Lookups by id return `Ok(None)` when no document matches; an id that is
/// not a valid object id is an `InvalidId` error.
pub trait Collection: Clone + Send + Sync + 'static {
    /// The collection (entity) name, e.g. `"Product"`
    fn name(&self) -> &str;

    /// Run a find query: filter, sort, skip/limit, projection, then populate
    fn find(&self, query: FindQuery) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;

    /// Count the documents matching `filter`
    fn count_documents(&self, filter: &Filter) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Look a document up by id, resolving the given relations
    fn find_by_id(
        &self,
        id: &str,
        populate: &[Populate],
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Insert a new document, returning it as stored
    fn create(&self, document: Document) -> impl Future<Output = StoreResult<Document>> + Send;

    /// Merge `patch` into the document with `id`
    ///
    /// Returns the document after the update when `options.return_new` is
    /// set, before it otherwise.
    fn find_by_id_and_update(
        &self,
        id: &str,
        patch: Document,
        options: UpdateOptions,
    ) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Remove the document with `id`, returning it
    fn find_by_id_and_delete(&self, id: &str) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Remove every document matching `filter`, returning how many were removed
    fn delete_many(&self, filter: &Filter) -> impl Future<Output = StoreResult<u64>> + Send;
}
