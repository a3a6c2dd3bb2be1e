//! List-query pipeline
//!
//! [`QueryFeatures`] turns the raw parameters of a list request into a
//! [`FindQuery`] and its [`PaginationResult`]. Each stage consumes the
//! builder and hands it back, so the stages run in the order they are
//! chained:
//!
//! ```rust
//! use catalog_service::query::{EntityKind, QueryFeatures, QueryParams};
//! use catalog_service::store::FindQuery;
//!
//! let params = QueryParams::from_pairs([("page", "2"), ("limit", "5"), ("keyword", "phone")]);
//! let (query, pagination) = QueryFeatures::new(FindQuery::default(), params)
//!     .filter()
//!     .unwrap()
//!     .search(EntityKind::Product)
//!     .sort()
//!     .limit_fields()
//!     .paginate(12)
//!     .into_parts();
//!
//! assert_eq!(query.skip, 5);
//! assert_eq!(query.limit, Some(5));
//! assert_eq!(pagination.unwrap().total_pages, 3);
//! ```

use crate::store::{FindQuery, Predicate, Projection, SortKey, StoreResult, CREATED_AT_FIELD};

use super::kind::EntityKind;
use super::pagination::{PageWindow, PaginationPolicy, PaginationResult};
use super::params::QueryParams;

/// Builder for one list request's query
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    query: FindQuery,
    params: QueryParams,
    policy: PaginationPolicy,
    pagination: Option<PaginationResult>,
}

impl QueryFeatures {
    /// Start from `base` (which may already carry a preset filter)
    #[must_use]
    pub fn new(base: FindQuery, params: QueryParams) -> Self {
        Self {
            query: base,
            params,
            policy: PaginationPolicy::default(),
            pagination: None,
        }
    }

    /// Use a non-default pagination policy
    #[must_use]
    pub fn with_policy(mut self, policy: PaginationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a condition for every non-reserved parameter
    pub fn filter(mut self) -> StoreResult<Self> {
        let filter = self.params.filter()?;
        self.query.filter = std::mem::take(&mut self.query.filter).merge(filter);
        Ok(self)
    }

    /// Add a case-insensitive keyword match over the kind's search fields
    #[must_use]
    pub fn search(mut self, kind: EntityKind) -> Self {
        if let Some(keyword) = self.params.get("keyword").filter(|k| !k.is_empty()) {
            let predicate = Predicate::Contains {
                fields: kind.search_fields().iter().map(|f| (*f).to_string()).collect(),
                needle: keyword.to_string(),
            };
            self.query = self.query.and(predicate);
        }
        self
    }

    /// Order by the comma-separated `sort` keys, newest first by default
    #[must_use]
    pub fn sort(mut self) -> Self {
        let keys: Vec<SortKey> = self
            .params
            .get("sort")
            .map(|raw| raw.split(',').filter_map(SortKey::parse).collect())
            .unwrap_or_default();

        self.query.sort = if keys.is_empty() {
            vec![SortKey::desc(CREATED_AT_FIELD)]
        } else {
            keys
        };
        self
    }

    /// Restrict returned fields to the comma-separated `fields` list
    ///
    /// A list made only of `-field` entries excludes those fields instead.
    /// Without `fields`, only the internal version field is hidden.
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        let requested: Vec<&str> = self
            .params
            .get("fields")
            .map(|raw| raw.split(',').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default();

        let (excluded, included): (Vec<&str>, Vec<&str>) =
            requested.into_iter().partition(|f| f.starts_with('-'));

        self.query.projection = if !included.is_empty() {
            Projection::include(included)
        } else if !excluded.is_empty() {
            Projection::exclude(excluded.into_iter().map(|f| &f[1..]))
        } else {
            Projection::without_version()
        };
        self
    }

    /// Apply the page window and compute metadata against `total`
    #[must_use]
    pub fn paginate(mut self, total: u64) -> Self {
        let window = PageWindow::from_params(self.params.get("page"), self.params.get("limit"), &self.policy);
        self.query.skip = window.skip();
        self.query.limit = Some(window.limit);
        self.pagination = Some(window.metadata(total, &self.policy));
        self
    }

    /// The query as built so far
    #[must_use]
    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Finish, returning the query and the metadata (if paginated)
    #[must_use]
    pub fn into_parts(self) -> (FindQuery, Option<PaginationResult>) {
        (self.query, self.pagination)
    }
}
