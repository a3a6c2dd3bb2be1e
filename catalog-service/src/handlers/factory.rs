//! Generic CRUD operations over any [`Collection`]
//!
//! [`EntityHandlers`] holds a collection handle plus the entity kind and
//! produces the five standard operations, so each catalog entity only
//! supplies its validators and routes.
//!
//! ```rust,ignore
//! let brands = EntityHandlers::new(store.collection(brand::schema()), EntityKind::Brand);
//!
//! let created = brands.create_one(payload).await?;
//! let page = brands.get_all(params, Filter::new()).await?;
//! ```

use crate::query::{EntityKind, PaginationPolicy, QueryFeatures, QueryParams};
use crate::store::{Collection, Document, Filter, FindQuery, Populate, UpdateOptions};

use super::error::{ApiError, ApiOperation};
use super::response::{ItemResponse, ListResponse, MessageResponse};

/// CRUD operations for one entity collection
#[derive(Debug, Clone)]
pub struct EntityHandlers<C> {
    collection: C,
    kind: EntityKind,
    policy: PaginationPolicy,
    populate: Vec<Populate>,
}

impl<C: Collection> EntityHandlers<C> {
    /// Handlers for `collection`, searched and labelled as `kind`
    pub fn new(collection: C, kind: EntityKind) -> Self {
        Self {
            collection,
            kind,
            policy: PaginationPolicy::default(),
            populate: Vec::new(),
        }
    }

    /// Pagination policy for `get_all`
    #[must_use]
    pub fn with_policy(mut self, policy: PaginationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a relation on every read
    #[must_use]
    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }

    /// The underlying collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// The entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Insert a validated payload
    pub async fn create_one(&self, payload: Document) -> Result<ItemResponse<Document>, ApiError> {
        let document = self.collection.create(payload).await?;
        tracing::info!(entity = %self.kind, id = ?crate::store::document_id(&document), "created");
        Ok(ItemResponse::created(document))
    }

    /// Fetch one document by id
    pub async fn get_one(&self, id: &str) -> Result<ItemResponse<Document>, ApiError> {
        self.collection
            .find_by_id(id, &self.populate)
            .await?
            .map(ItemResponse::found)
            .ok_or_else(|| ApiError::not_found(self.kind.as_str(), id))
    }

    /// Merge a validated patch into one document and return the result
    pub async fn update_one(&self, id: &str, patch: Document) -> Result<ItemResponse<Document>, ApiError> {
        let options = UpdateOptions {
            return_new: true,
            run_validators: true,
        };
        self.collection
            .find_by_id_and_update(id, patch, options)
            .await?
            .map(ItemResponse::updated)
            .ok_or_else(|| ApiError::not_found(self.kind.as_str(), id).with_operation(ApiOperation::Update))
    }

    /// Remove one document
    pub async fn delete_one(&self, id: &str) -> Result<MessageResponse, ApiError> {
        match self.collection.find_by_id_and_delete(id).await? {
            Some(_) => {
                tracing::info!(entity = %self.kind, id, "deleted");
                Ok(MessageResponse::deleted())
            }
            None => Err(ApiError::not_found(self.kind.as_str(), id).with_operation(ApiOperation::Delete)),
        }
    }

    /// List documents matching `preset` refined by the request's parameters
    ///
    /// The total used for pagination counts `preset` only.
    pub async fn get_all(
        &self,
        params: QueryParams,
        preset: Filter,
    ) -> Result<ListResponse<Document>, ApiError> {
        let total = self.collection.count_documents(&preset).await?;

        let (mut query, pagination) = QueryFeatures::new(FindQuery::new(preset), params)
            .with_policy(self.policy)
            .filter()?
            .search(self.kind)
            .sort()
            .limit_fields()
            .paginate(total)
            .into_parts();
        let pagination = pagination.ok_or_else(|| ApiError::internal("list query was not paginated"))?;
        query.populate.extend(self.populate.iter().cloned());

        tracing::debug!(entity = %self.kind, ?query, total, "list query");

        let documents = self.collection.find(query).await?;
        Ok(ListResponse::new(documents, pagination))
    }
}
