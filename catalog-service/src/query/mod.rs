//! List-query engine
//!
//! Turns raw query-string parameters into a store [`FindQuery`] (filter,
//! keyword search, sort, projection, page window) and computes pagination
//! metadata.
//!
//! [`FindQuery`]: crate::store::FindQuery

mod features;
mod kind;
mod pagination;
mod params;

pub use features::QueryFeatures;
pub use kind::EntityKind;
pub use pagination::{PageWindow, PaginationPolicy, PaginationResult, DEFAULT_LIMIT};
pub use params::{QueryParams, RESERVED_KEYS};
