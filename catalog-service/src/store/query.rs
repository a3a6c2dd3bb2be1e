//! Query descriptor types
//!
//! A [`FindQuery`] is the store-facing description of a list request: a
//! conjunctive [`Filter`], ordered [`SortKey`]s, a [`Projection`], a
//! skip/limit window and the relations to [`Populate`].
//!
//! ```rust
//! use catalog_service::store::{FilterCondition, FindQuery, Filter, Projection, SortKey};
//!
//! let query = FindQuery::new(Filter::new().and(FilterCondition::gte("price", 100_i64)))
//!     .sort_by(vec![SortKey::parse("-createdAt").unwrap()])
//!     .select(Projection::include(["title", "price"]))
//!     .skip(5)
//!     .limit(5);
//!
//! assert_eq!(query.filter.len(), 1);
//! assert_eq!(query.skip, 5);
//! assert_eq!(query.limit, Some(5));
//! ```

use std::fmt;

use serde_json::Value;

use super::document::{ID_FIELD, VERSION_FIELD};

/// Comparison operators a filter condition may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Exact match
    Equal,
    /// Strictly greater than
    GreaterThan,
    /// Greater than or equal to
    GreaterThanOrEqual,
    /// Strictly less than
    LessThan,
    /// Less than or equal to
    LessThanOrEqual,
    /// Value is one of a list
    In,
}

impl FilterOperator {
    /// Parse the operator sub-key used in query strings (`price[gte]`)
    #[must_use]
    pub fn from_query_key(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(Self::GreaterThan),
            "gte" => Some(Self::GreaterThanOrEqual),
            "lt" => Some(Self::LessThan),
            "lte" => Some(Self::LessThanOrEqual),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// The document-store spelling of the operator
    #[must_use]
    pub const fn as_store_operator(&self) -> &'static str {
        match self {
            Self::Equal => "$eq",
            Self::GreaterThan => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThan => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::In => "$in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_store_operator())
    }
}

/// Right-hand side of a filter condition
///
/// Values that arrive through a query string are text; they are coerced to
/// the type of the stored value when the condition is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Untyped text from a query string or path parameter
    Text(String),
    /// A list of untyped values (for `In`)
    List(Vec<String>),
    /// An already-typed JSON value
    Json(Value),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Json(Value::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Json(Value::from(n))
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Json(Value::Bool(b))
    }
}

/// A single `(field, operator, value)` condition
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Field path, dotted for nested fields
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value)
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value)
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value)
    }

    /// `field in values`
    pub fn in_list(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::List(values))
    }
}

/// One conjunct of a [`Filter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A field comparison
    Condition(FilterCondition),
    /// Case-insensitive substring match against any of the fields
    Contains {
        /// Fields searched; a document matches if any of them matches
        fields: Vec<String>,
        /// Literal text to look for
        needle: String,
    },
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

/// Conjunction of predicates; the empty filter matches every document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// The match-everything filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate to the conjunction
    #[must_use]
    pub fn and(mut self, predicate: impl Into<Predicate>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    /// Merge another filter's predicates into this one
    #[must_use]
    pub fn merge(mut self, other: Filter) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    /// The predicates in insertion order
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Number of predicates
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether the filter matches everything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (A-Z, 0-9, oldest first)
    #[default]
    Ascending,
    /// Descending (Z-A, 9-0, newest first)
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field path to sort on
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending key
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending key
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse `"price"` or `"-createdAt"`. Blank input yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(field) if !field.trim().is_empty() => Some(Self::desc(field.trim())),
            Some(_) => None,
            None if raw.is_empty() => None,
            None => Some(Self::asc(raw.strip_prefix('+').unwrap_or(raw))),
        }
    }
}

/// Shape of the returned documents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Return every field
    #[default]
    All,
    /// Return only these fields (the id is always kept)
    Include(Vec<String>),
    /// Return everything except these fields
    Exclude(Vec<String>),
}

impl Projection {
    /// Inclusion projection
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Exclusion projection
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Everything except the internal version field
    #[must_use]
    pub fn without_version() -> Self {
        Self::exclude([VERSION_FIELD])
    }

    /// Whether a top-level field survives this projection
    #[must_use]
    pub fn keeps(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(fields) => field == ID_FIELD || fields.iter().any(|f| f == field),
            Self::Exclude(fields) => !fields.iter().any(|f| f == field),
        }
    }
}

/// Replace a reference field with (part of) the referenced document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Populate {
    /// Field holding the reference id (or a list of ids)
    pub path: String,
    /// Name of the referenced collection
    pub from: String,
    /// Fields copied from the referenced document; empty copies all
    pub select: Vec<String>,
}

impl Populate {
    /// Populate `path` from collection `from`
    pub fn new(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            select: Vec::new(),
        }
    }

    /// Restrict the copied fields
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Complete find request against one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// Conjunctive filter
    pub filter: Filter,
    /// Sort keys, most significant first
    pub sort: Vec<SortKey>,
    /// Returned document shape
    pub projection: Projection,
    /// Documents to skip
    pub skip: u64,
    /// Maximum documents to return
    pub limit: Option<u64>,
    /// Relations resolved after the window is applied
    pub populate: Vec<Populate>,
}

impl FindQuery {
    /// A query over `filter` with no ordering, projection or window
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Refine the filter with another predicate
    #[must_use]
    pub fn and(mut self, predicate: impl Into<Predicate>) -> Self {
        self.filter = self.filter.and(predicate);
        self
    }

    /// Replace the sort keys
    #[must_use]
    pub fn sort_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sort = keys;
        self
    }

    /// Replace the projection
    #[must_use]
    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Set the number of documents to skip
    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the maximum number of documents returned
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add a relation to populate
    #[must_use]
    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate.push(populate);
        self
    }
}

/// Options for find-by-id-and-update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Return the document after the update instead of before
    pub return_new: bool,
    /// Re-run schema validators on the merged document
    pub run_validators: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_new: true,
            run_validators: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_from_query_key() {
        assert_eq!(FilterOperator::from_query_key("gt"), Some(FilterOperator::GreaterThan));
        assert_eq!(
            FilterOperator::from_query_key("gte"),
            Some(FilterOperator::GreaterThanOrEqual)
        );
        assert_eq!(FilterOperator::from_query_key("lt"), Some(FilterOperator::LessThan));
        assert_eq!(
            FilterOperator::from_query_key("lte"),
            Some(FilterOperator::LessThanOrEqual)
        );
        assert_eq!(FilterOperator::from_query_key("in"), Some(FilterOperator::In));
        assert_eq!(FilterOperator::from_query_key("regex"), None);
        assert_eq!(FilterOperator::from_query_key("GTE"), None);
    }

    #[test]
    fn test_operator_store_spelling() {
        assert_eq!(FilterOperator::GreaterThanOrEqual.to_string(), "$gte");
        assert_eq!(FilterOperator::In.as_store_operator(), "$in");
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("price"), Some(SortKey::asc("price")));
        assert_eq!(SortKey::parse("-createdAt"), Some(SortKey::desc("createdAt")));
        assert_eq!(SortKey::parse(" title "), Some(SortKey::asc("title")));
        assert_eq!(SortKey::parse(""), None);
        assert_eq!(SortKey::parse("-"), None);
    }

    #[test]
    fn test_projection_keeps() {
        let include = Projection::include(["title", "price"]);
        assert!(include.keeps("title"));
        assert!(include.keeps(ID_FIELD));
        assert!(!include.keeps("description"));

        let exclude = Projection::without_version();
        assert!(exclude.keeps("title"));
        assert!(!exclude.keeps(VERSION_FIELD));

        assert!(Projection::All.keeps(VERSION_FIELD));
    }

    #[test]
    fn test_filter_builder() {
        let filter = Filter::new()
            .and(FilterCondition::eq("category", "abc"))
            .and(Predicate::Contains {
                fields: vec!["name".to_string()],
                needle: "pho".to_string(),
            });
        assert_eq!(filter.len(), 2);
        assert!(!filter.is_empty());
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_filter_merge_keeps_order() {
        let preset = Filter::new().and(FilterCondition::eq("category", "abc"));
        let merged = preset.merge(Filter::new().and(FilterCondition::gt("price", 5_i64)));
        assert_eq!(merged.len(), 2);
        assert!(matches!(
            &merged.predicates()[0],
            Predicate::Condition(c) if c.field == "category"
        ));
    }

    #[test]
    fn test_update_options_default() {
        let options = UpdateOptions::default();
        assert!(options.return_new);
        assert!(options.run_validators);
    }
}
