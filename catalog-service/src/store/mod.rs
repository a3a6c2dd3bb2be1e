//! Document store abstraction
//!
//! The handler layer talks to collections through the [`Collection`] trait
//! and describes list requests with [`FindQuery`]. [`MemoryStore`] is the
//! adapter the service runs on.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_service::store::{Collection, Field, MemoryStore, Schema};
//!
//! let store = MemoryStore::new();
//! let brands = store.collection(Schema::new("Brand").field(Field::string("name").unique()));
//! let created = brands.create(document).await?;
//! ```

mod document;
mod error;
mod eval;
mod memory;
mod query;
mod schema;
mod traits;

pub use document::{
    document_id, get_path, into_document, Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
    VERSION_FIELD,
};
pub use error::{FieldViolation, StoreError, StoreErrorKind, StoreOperation, StoreResult};
pub use memory::{MemoryCollection, MemoryStore};
pub use query::{
    Filter, FilterCondition, FilterOperator, FilterValue, FindQuery, Populate, Predicate,
    Projection, SortDirection, SortKey, UpdateOptions,
};
pub use schema::{number_value, Field, FieldType, Rule, Schema};
pub use traits::Collection;
