//! In-process evaluation of query descriptors
//!
//! Used by the memory adapter to apply a [`Filter`], order documents by
//! [`SortKey`]s and shape them with a [`Projection`].
//!
//! Text values coming from query strings are coerced to the type of the
//! stored value they are compared with, so `price[gte]=100` compares
//! numerically against a numeric `price` and `featured=true` matches a
//! boolean field. Array-valued fields match when any element matches.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::document::{get_path, Document};
use super::error::{StoreError, StoreResult};
use super::query::{Filter, FilterCondition, FilterOperator, FilterValue, Predicate, Projection, SortDirection, SortKey};

/// A filter prepared for repeated evaluation
#[derive(Debug)]
pub struct CompiledFilter {
    predicates: Vec<CompiledPredicate>,
}

#[derive(Debug)]
enum CompiledPredicate {
    Condition(FilterCondition),
    Contains { fields: Vec<String>, matcher: Regex },
}

impl CompiledFilter {
    /// Compile a filter; fails only if a search pattern cannot be built
    pub fn compile(filter: &Filter) -> StoreResult<Self> {
        let predicates = filter
            .predicates()
            .iter()
            .map(|predicate| match predicate {
                Predicate::Condition(condition) => Ok(CompiledPredicate::Condition(condition.clone())),
                Predicate::Contains { fields, needle } => {
                    let matcher = RegexBuilder::new(&regex::escape(needle))
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| StoreError::malformed_query(format!("Invalid search keyword: {e}")))?;
                    Ok(CompiledPredicate::Contains {
                        fields: fields.clone(),
                        matcher,
                    })
                }
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self { predicates })
    }

    /// Whether `document` satisfies every predicate
    pub fn matches(&self, document: &Document) -> bool {
        self.predicates.iter().all(|predicate| match predicate {
            CompiledPredicate::Condition(condition) => condition_matches(condition, document),
            CompiledPredicate::Contains { fields, matcher } => fields.iter().any(|field| {
                get_path(document, field).is_some_and(|value| contains_match(value, matcher))
            }),
        })
    }
}

fn contains_match(value: &Value, matcher: &Regex) -> bool {
    match value {
        Value::String(s) => matcher.is_match(s),
        Value::Array(items) => items.iter().any(|item| contains_match(item, matcher)),
        _ => false,
    }
}

fn condition_matches(condition: &FilterCondition, document: &Document) -> bool {
    let stored = get_path(document, &condition.field);

    match (&condition.operator, &condition.value) {
        (FilterOperator::In, FilterValue::List(candidates)) => candidates
            .iter()
            .any(|candidate| any_element(stored, |v| compare_text(v, candidate) == Some(Ordering::Equal))),
        (FilterOperator::In, FilterValue::Json(Value::Array(candidates))) => candidates
            .iter()
            .any(|candidate| any_element(stored, |v| compare_json(v, candidate) == Some(Ordering::Equal))),
        (FilterOperator::In, FilterValue::Text(candidate)) => {
            any_element(stored, |v| compare_text(v, candidate) == Some(Ordering::Equal))
        }
        (FilterOperator::In, FilterValue::Json(candidate)) => {
            any_element(stored, |v| compare_json(v, candidate) == Some(Ordering::Equal))
        }
        (FilterOperator::Equal, FilterValue::Json(Value::Null)) => stored.map_or(true, Value::is_null),
        (FilterOperator::Equal, FilterValue::Json(expected)) => {
            stored == Some(expected) || any_element(stored, |v| compare_json(v, expected) == Some(Ordering::Equal))
        }
        (operator, FilterValue::Text(text)) => {
            any_element(stored, |v| compare_text(v, text).is_some_and(|ord| accepts(*operator, ord)))
        }
        (operator, FilterValue::Json(expected)) => {
            any_element(stored, |v| compare_json(v, expected).is_some_and(|ord| accepts(*operator, ord)))
        }
        (operator, FilterValue::List(values)) => values
            .iter()
            .any(|text| any_element(stored, |v| compare_text(v, text).is_some_and(|ord| accepts(*operator, ord)))),
    }
}

/// Apply `test` to a scalar, or to each element of an array
fn any_element(stored: Option<&Value>, test: impl Fn(&Value) -> bool) -> bool {
    match stored {
        None => false,
        Some(Value::Array(items)) => items.iter().any(&test),
        Some(value) => test(value),
    }
}

fn accepts(operator: FilterOperator, ordering: Ordering) -> bool {
    match operator {
        FilterOperator::Equal | FilterOperator::In => ordering == Ordering::Equal,
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
    }
}

/// Compare a stored value with query text, coercing the text to the stored type
fn compare_text(stored: &Value, text: &str) -> Option<Ordering> {
    match stored {
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            let rhs = text.trim().parse::<f64>().ok()?;
            lhs.partial_cmp(&rhs)
        }
        Value::Bool(b) => {
            let rhs = match text {
                "true" => true,
                "false" => false,
                _ => return None,
            };
            Some(b.cmp(&rhs))
        }
        Value::String(s) => Some(s.as_str().cmp(text)),
        Value::Null => (text == "null").then_some(Ordering::Equal),
        Value::Object(_) | Value::Array(_) => None,
    }
}

/// Compare two typed values; values of different types are incomparable
fn compare_json(stored: &Value, expected: &Value) -> Option<Ordering> {
    match (stored, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// Position of a value's type in the cross-type sort order
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order over optional values used for sorting
pub fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Object(_) | Value::Array(_))), Some(y)) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

/// Stable multi-key sort
pub fn sort_documents(documents: &mut [Document], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = compare_for_sort(get_path(a, &key.field), get_path(b, &key.field));
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Shape a document according to `projection`
pub fn project(document: Document, projection: &Projection) -> Document {
    match projection {
        Projection::All => document,
        _ => document
            .into_iter()
            .filter(|(field, _)| projection.keeps(field))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::into_document;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    fn matches(filter: Filter, document: &Document) -> bool {
        CompiledFilter::compile(&filter).unwrap().matches(document)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches(Filter::new(), &doc(json!({"name": "x"}))));
    }

    #[test]
    fn test_text_is_coerced_to_number() {
        let product = doc(json!({"price": 150}));
        assert!(matches(Filter::new().and(FilterCondition::gte("price", "100")), &product));
        assert!(matches(Filter::new().and(FilterCondition::eq("price", "150")), &product));
        assert!(!matches(Filter::new().and(FilterCondition::lt("price", "100")), &product));
        assert!(!matches(Filter::new().and(FilterCondition::gt("price", "abc")), &product));
    }

    #[test]
    fn test_text_is_coerced_to_bool() {
        let product = doc(json!({"featured": true}));
        assert!(matches(Filter::new().and(FilterCondition::eq("featured", "true")), &product));
        assert!(!matches(Filter::new().and(FilterCondition::eq("featured", "false")), &product));
    }

    #[test]
    fn test_missing_field_never_matches_comparison() {
        let product = doc(json!({"title": "Phone"}));
        assert!(!matches(Filter::new().and(FilterCondition::gte("price", "1")), &product));
        assert!(!matches(Filter::new().and(FilterCondition::eq("price", "1")), &product));
    }

    #[test]
    fn test_array_field_matches_any_element() {
        let product = doc(json!({"colors": ["red", "blue"]}));
        assert!(matches(Filter::new().and(FilterCondition::eq("colors", "blue")), &product));
        assert!(!matches(Filter::new().and(FilterCondition::eq("colors", "green")), &product));
    }

    #[test]
    fn test_in_list() {
        let product = doc(json!({"quantity": 3}));
        let hit = FilterCondition::in_list("quantity", vec!["1".into(), "3".into()]);
        let miss = FilterCondition::in_list("quantity", vec!["4".into()]);
        assert!(matches(Filter::new().and(hit), &product));
        assert!(!matches(Filter::new().and(miss), &product));
    }

    #[test]
    fn test_contains_is_case_insensitive_and_literal() {
        let product = doc(json!({"title": "iPhone 15 (Pro)", "description": "A phone"}));
        let search = |needle: &str| {
            Filter::new().and(Predicate::Contains {
                fields: vec!["title".into(), "description".into()],
                needle: needle.into(),
            })
        };
        assert!(matches(search("IPHONE"), &product));
        assert!(matches(search("(pro)"), &product));
        assert!(!matches(search("p.o"), &product));
    }

    #[test]
    fn test_conjunction() {
        let product = doc(json!({"price": 150, "category": "abc"}));
        let filter = Filter::new()
            .and(FilterCondition::gte("price", "100"))
            .and(FilterCondition::eq("category", "xyz"));
        assert!(!matches(filter, &product));
    }

    #[test]
    fn test_sort_multi_key_is_stable() {
        let mut docs = vec![
            doc(json!({"n": 1, "price": 20, "createdAt": "2024-01-01"})),
            doc(json!({"n": 2, "price": 10, "createdAt": "2024-01-02"})),
            doc(json!({"n": 3, "price": 20, "createdAt": "2024-01-03"})),
            doc(json!({"n": 4, "price": 10, "createdAt": "2024-01-02"})),
        ];
        sort_documents(&mut docs, &[SortKey::asc("price"), SortKey::desc("createdAt")]);
        let order: Vec<_> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_sort_type_order() {
        assert_eq!(compare_for_sort(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_for_sort(Some(&json!(99)), Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_for_sort(Some(&json!([1])), Some(&json!(true))), Ordering::Less);
    }

    #[test]
    fn test_project_include_keeps_id() {
        let d = doc(json!({"_id": "1", "title": "t", "price": 3, "__v": 0}));
        let shaped = project(d, &Projection::include(["title"]));
        assert_eq!(shaped.len(), 2);
        assert!(shaped.contains_key("_id"));
        assert!(shaped.contains_key("title"));
    }

    #[test]
    fn test_project_exclude_version() {
        let d = doc(json!({"_id": "1", "title": "t", "__v": 0}));
        let shaped = project(d, &Projection::without_version());
        assert!(!shaped.contains_key("__v"));
        assert_eq!(shaped.len(), 2);
    }
}
