//! Process-local document store
//!
//! [`MemoryStore`] keeps every collection in memory behind a `tokio`
//! `RwLock`. Collections are registered by name in a shared registry, which
//! is what lets `populate` resolve references across collections.
//!
//! Writes hold the collection's write lock for the whole
//! validate-check-insert sequence, so unique checks and the write are atomic
//! with respect to other requests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use super::document::{
    document_id, Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD, VERSION_FIELD,
};
use super::error::{FieldViolation, StoreError, StoreOperation, StoreResult};
use super::eval::{project, sort_documents, CompiledFilter};
use super::query::{Filter, FindQuery, Populate, Projection, UpdateOptions};
use super::schema::Schema;
use super::traits::Collection;
use crate::ids::ObjectId;

/// Shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    collections: DashMap<String, Arc<CollectionState>>,
    clock: AtomicI64,
}

#[derive(Debug)]
struct CollectionState {
    schema: Schema,
    documents: RwLock<Vec<Document>>,
}

impl MemoryStore {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection for `schema`, or return the existing one with
    /// the same name
    pub fn collection(&self, schema: Schema) -> MemoryCollection {
        let name = schema.entity().to_string();
        let state = self
            .inner
            .collections
            .entry(name.clone())
            .or_insert_with(|| {
                Arc::new(CollectionState {
                    schema,
                    documents: RwLock::new(Vec::new()),
                })
            })
            .clone();

        MemoryCollection {
            name,
            store: self.clone(),
            state,
        }
    }

    /// Look up a registered collection
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MemoryCollection> {
        let state = self.inner.collections.get(name)?.clone();
        Some(MemoryCollection {
            name: name.to_string(),
            store: self.clone(),
            state,
        })
    }

    /// Names of the registered collections, sorted
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Next write timestamp; strictly increasing across the whole store
    fn next_timestamp(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut last = self.inner.clock.load(Ordering::Relaxed);
        let next = loop {
            let candidate = now.max(last + 1);
            match self
                .inner
                .clock
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => break candidate,
                Err(actual) => last = actual,
            }
        };

        DateTime::<Utc>::from_timestamp_millis(next)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Replace reference ids with the referenced documents
    async fn populate(&self, documents: &mut [Document], relations: &[Populate]) {
        for relation in relations {
            let Some(target) = self.get(&relation.from) else {
                tracing::warn!(
                    path = %relation.path,
                    collection = %relation.from,
                    "populate target collection is not registered"
                );
                continue;
            };
            let referenced = target.state.documents.read().await;
            let projection = if relation.select.is_empty() {
                Projection::All
            } else {
                Projection::Include(relation.select.clone())
            };
            let resolve = |id: &Value| -> Value {
                id.as_str()
                    .and_then(|id| referenced.iter().find(|d| document_id(d) == Some(id)))
                    .map_or(Value::Null, |d| Value::Object(project(d.clone(), &projection)))
            };

            for document in documents.iter_mut() {
                let Some(value) = document.get_mut(&relation.path) else {
                    continue;
                };
                let replacement = match &*value {
                    Value::Array(ids) => Value::Array(ids.iter().map(&resolve).collect()),
                    Value::Null => Value::Null,
                    id => resolve(id),
                };
                *value = replacement;
            }
        }
    }
}

/// Handle to one collection of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
    state: Arc<CollectionState>,
}

impl MemoryCollection {
    /// The collection's schema
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }

    /// Parse `id` into its stored (lowercase) form
    fn parse_id(&self, operation: StoreOperation, id: &str) -> StoreResult<String> {
        id.parse::<ObjectId>()
            .map(String::from)
            .map_err(|_| StoreError::invalid_id(operation, id).with_entity(&self.name, id))
    }

    fn validation_error(&self, operation: StoreOperation, violations: Vec<FieldViolation>) -> StoreError {
        StoreError::validation_failed(&self.name, violations).with_operation(operation)
    }

    /// Fail if a unique field of `candidate` collides with another document
    fn check_unique(
        &self,
        operation: StoreOperation,
        documents: &[Document],
        candidate: &Document,
        skip_id: Option<&str>,
    ) -> StoreResult<()> {
        for field in self.state.schema.unique_fields() {
            let Some(value) = candidate.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = documents
                .iter()
                .filter(|d| skip_id.is_none() || document_id(d) != skip_id)
                .any(|d| d.get(&field.name) == Some(value));
            if taken {
                let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                return Err(StoreError::already_exists(&self.name, &field.name, shown).with_operation(operation));
            }
        }
        Ok(())
    }
}

impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, query: FindQuery) -> StoreResult<Vec<Document>> {
        let filter = CompiledFilter::compile(&query.filter)?;

        let mut results: Vec<Document> = {
            let documents = self.state.documents.read().await;
            documents.iter().filter(|d| filter.matches(d)).cloned().collect()
        };
        let matched = results.len();

        sort_documents(&mut results, &query.sort);

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        let mut results: Vec<Document> = results
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| project(d, &query.projection))
            .collect();

        self.store.populate(&mut results, &query.populate).await;

        tracing::debug!(
            collection = %self.name,
            matched,
            returned = results.len(),
            skip = query.skip,
            limit = ?query.limit,
            "find"
        );

        Ok(results)
    }

    async fn count_documents(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = CompiledFilter::compile(filter).map_err(|e| e.with_operation(StoreOperation::Count))?;
        let documents = self.state.documents.read().await;
        let count = documents.iter().filter(|d| filter.matches(d)).count();
        Ok(count as u64)
    }

    async fn find_by_id(&self, id: &str, populate: &[Populate]) -> StoreResult<Option<Document>> {
        let id = self.parse_id(StoreOperation::FindById, id)?;
        let id = id.as_str();
        let found = {
            let documents = self.state.documents.read().await;
            documents.iter().find(|d| document_id(d) == Some(id)).cloned()
        };

        let Some(document) = found else {
            return Ok(None);
        };
        let mut results = [document];
        self.store.populate(&mut results, populate).await;
        let [document] = results;
        Ok(Some(document))
    }

    async fn create(&self, document: Document) -> StoreResult<Document> {
        let schema = &self.state.schema;
        let mut document = schema
            .cast(document)
            .map_err(|v| self.validation_error(StoreOperation::Create, v))?;
        schema.apply_defaults(&mut document);
        schema
            .validate(&document)
            .map_err(|v| self.validation_error(StoreOperation::Create, v))?;

        let mut documents = self.state.documents.write().await;
        self.check_unique(StoreOperation::Create, &documents, &document, None)?;

        let id = ObjectId::new();
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        if schema.has_timestamps() {
            let now = self.store.next_timestamp();
            document.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
            document.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));
        }
        document.insert(VERSION_FIELD.to_string(), Value::from(0));

        documents.push(document.clone());
        tracing::debug!(collection = %self.name, id = %id, "document created");
        Ok(document)
    }

    async fn find_by_id_and_update(
        &self,
        id: &str,
        patch: Document,
        options: UpdateOptions,
    ) -> StoreResult<Option<Document>> {
        let id = self.parse_id(StoreOperation::Update, id)?;
        let id = id.as_str();
        let schema = &self.state.schema;
        let patch = schema
            .cast(patch)
            .map_err(|v| self.validation_error(StoreOperation::Update, v))?;

        let mut documents = self.state.documents.write().await;
        let Some(index) = documents.iter().position(|d| document_id(d) == Some(id)) else {
            return Ok(None);
        };

        let before = documents[index].clone();
        let mut after = before.clone();
        after.extend(patch);

        if options.run_validators {
            schema
                .validate(&after)
                .map_err(|v| self.validation_error(StoreOperation::Update, v))?;
        }
        self.check_unique(StoreOperation::Update, &documents, &after, Some(id))?;

        if schema.has_timestamps() {
            after.insert(
                UPDATED_AT_FIELD.to_string(),
                Value::String(self.store.next_timestamp()),
            );
        }
        documents[index] = after.clone();
        tracing::debug!(collection = %self.name, id, "document updated");

        Ok(Some(if options.return_new { after } else { before }))
    }

    async fn find_by_id_and_delete(&self, id: &str) -> StoreResult<Option<Document>> {
        let id = self.parse_id(StoreOperation::Delete, id)?;
        let id = id.as_str();
        let mut documents = self.state.documents.write().await;
        let removed = documents
            .iter()
            .position(|d| document_id(d) == Some(id))
            .map(|index| documents.remove(index));
        if removed.is_some() {
            tracing::debug!(collection = %self.name, id, "document deleted");
        }
        Ok(removed)
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = CompiledFilter::compile(filter).map_err(|e| e.with_operation(StoreOperation::DeleteMany))?;
        let mut documents = self.state.documents.write().await;
        let before = documents.len();
        documents.retain(|d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }
}
