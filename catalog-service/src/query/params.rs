//! Raw list-request parameters
//!
//! [`QueryParams`] keeps the query string as ordered `(key, value)` pairs so
//! repeated keys survive. Filter keys are parsed structurally into
//! `(field, operator, value)` conditions:
//!
//! | Key            | Condition                    |
//! |----------------|------------------------------|
//! | `price=10`     | `price == 10`                |
//! | `price[gte]=10`| `price >= 10`                |
//! | `colors[in]=a,b` | `colors in [a, b]`         |
//! | `colors=a&colors=b` | `colors in [a, b]`      |
//! | `dims[width]=3`| `dims.width == 3`            |
//!
//! ```rust
//! use catalog_service::query::QueryParams;
//!
//! let params = QueryParams::from_pairs([("page", "2"), ("price[gte]", "100"), ("sort", "-price")]);
//! let filter = params.filter().unwrap();
//! assert_eq!(filter.len(), 1);
//! assert_eq!(params.get("page"), Some("2"));
//! ```

use serde::Deserialize;

use crate::store::{Filter, FilterCondition, FilterOperator, StoreError, StoreResult};

/// Keys that control the list operation and never become filters
pub const RESERVED_KEYS: [&str; 6] = ["page", "limit", "skip", "fields", "sort", "keyword"];

/// Ordered query-string pairs of one list request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

/// A filter key split into its field path and optional operator
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterKey {
    field: String,
    operator: Option<String>,
}

impl QueryParams {
    /// Build from any sequence of pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameters were given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Interpret every non-reserved key as a filter condition
    ///
    /// Fails with a malformed-query error when a key cannot be parsed
    /// (unbalanced or nested brackets, empty field name).
    pub fn filter(&self) -> StoreResult<Filter> {
        let mut equalities: Vec<(String, Vec<String>)> = Vec::new();
        let mut lists: Vec<(String, Vec<String>)> = Vec::new();
        let mut filter = Filter::new();

        for (raw_key, value) in &self.pairs {
            // `?=x` carries no field; drop it like an absent parameter
            if raw_key.trim().is_empty() {
                continue;
            }
            let key = parse_key(raw_key)?;
            if RESERVED_KEYS.contains(&key.field.as_str()) {
                continue;
            }

            match key.operator.as_deref() {
                None => push_grouped(&mut equalities, key.field, value.clone()),
                Some("") => push_grouped(&mut lists, key.field, value.clone()),
                Some(op) => match FilterOperator::from_query_key(op) {
                    Some(FilterOperator::In) => {
                        let values = value
                            .split(',')
                            .map(str::trim)
                            .filter(|v| !v.is_empty())
                            .map(str::to_string);
                        for v in values {
                            push_grouped(&mut lists, key.field.clone(), v);
                        }
                    }
                    Some(operator) => {
                        filter = filter.and(FilterCondition::new(key.field, operator, value.as_str()));
                    }
                    None => push_grouped(&mut equalities, format!("{}.{op}", key.field), value.clone()),
                },
            }
        }

        for (field, mut values) in equalities {
            filter = if values.len() == 1 {
                filter.and(FilterCondition::eq(field, values.remove(0)))
            } else {
                filter.and(FilterCondition::in_list(field, values))
            };
        }
        for (field, values) in lists {
            filter = filter.and(FilterCondition::in_list(field, values));
        }

        Ok(filter)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

fn push_grouped(groups: &mut Vec<(String, Vec<String>)>, field: String, value: String) {
    match groups.iter_mut().find(|(f, _)| *f == field) {
        Some((_, values)) => values.push(value),
        None => groups.push((field, vec![value])),
    }
}

/// Split `field` or `field[op]`
fn parse_key(raw: &str) -> StoreResult<FilterKey> {
    let malformed = || StoreError::malformed_query(format!("Malformed query key: '{raw}'"));

    let Some(open) = raw.find('[') else {
        if raw.contains(']') {
            return Err(malformed());
        }
        return Ok(FilterKey {
            field: raw.to_string(),
            operator: None,
        });
    };

    let field = &raw[..open];
    let inner = raw[open + 1..].strip_suffix(']').ok_or_else(malformed)?;
    if field.trim().is_empty() || field.contains(']') || inner.contains(['[', ']']) {
        return Err(malformed());
    }

    Ok(FilterKey {
        field: field.to_string(),
        operator: Some(inner.to_string()),
    })
}
