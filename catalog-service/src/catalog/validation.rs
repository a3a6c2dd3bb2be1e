//! Request validation shared by the catalog entities
//!
//! Validators run before a document reaches the store. They collect every
//! failing field into one [`ApiError`] so a client sees all problems at
//! once, and they fill in derived fields such as `slug`.

use serde_json::Value;

use crate::handlers::{ApiError, ApiOperation, FieldError};
use crate::ids::ObjectId;
use crate::store::Document;

/// URL-safe form of a display name
///
/// Whitespace runs become a single `-`; characters other than letters,
/// digits and `-_.~` are dropped. Case is left alone, the schemas lowercase.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')) {
            continue;
        }
        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push(c);
    }
    slug
}

/// Reject a path id that is not a 24-character hex object id
pub fn check_id(operation: ApiOperation, id: &str, message: &str) -> Result<(), ApiError> {
    if ObjectId::is_valid(id) {
        Ok(())
    } else {
        Err(ApiError::validation_failed(
            operation,
            vec![FieldError::new("id", message).with_value(Value::String(id.to_string()))],
        ))
    }
}

/// Numeric reading of a body value: JSON numbers or numeric strings
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.is_empty() && s.trim() == s => {
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Text form of a body value
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accumulates field failures for one request body
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    /// No failures yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn fail(&mut self, field: &str, message: impl Into<String>, value: Option<&Value>) {
        let error = FieldError::new(field, message);
        self.errors.push(match value {
            Some(v) => error.with_value(v.clone()),
            None => error,
        });
    }

    /// Whether `field` has failed already
    pub fn has_failed(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Text of `field`, recording `message` when it is absent or blank
    pub fn required_text(&mut self, body: &Document, field: &str, message: &str) -> Option<String> {
        if is_blank(body.get(field)) {
            self.fail(field, message, None);
            return None;
        }
        body.get(field).map(text_of)
    }

    /// Text of `field` when present; `None` when absent
    pub fn optional_text(&self, body: &Document, field: &str) -> Option<String> {
        if is_blank(body.get(field)) {
            return None;
        }
        body.get(field).map(text_of)
    }

    /// Character length bounds for an already extracted value
    pub fn length(
        &mut self,
        field: &str,
        text: &str,
        min: Option<(usize, &str)>,
        max: Option<(usize, &str)>,
    ) {
        let length = text.chars().count();
        let value = Value::String(text.to_string());
        if let Some((limit, message)) = min {
            if length < limit {
                self.fail(field, message, Some(&value));
            }
        }
        if let Some((limit, message)) = max {
            if length > limit {
                self.fail(field, message, Some(&value));
            }
        }
    }

    /// Number in `field`; `required` is the message for an absent value
    pub fn number(
        &mut self,
        body: &Document,
        field: &str,
        required: Option<&str>,
        not_numeric: &str,
    ) -> Option<f64> {
        let value = body.get(field);
        if is_blank(value) {
            if let Some(message) = required {
                self.fail(field, message, None);
            }
            return None;
        }
        let value = value?;
        let number = as_number(value);
        if number.is_none() {
            self.fail(field, not_numeric, Some(value));
        }
        number
    }

    /// Object id in `field`; `required` is the message for an absent value
    pub fn object_id(
        &mut self,
        body: &Document,
        field: &str,
        required: Option<&str>,
        malformed: &str,
    ) -> Option<String> {
        let value = body.get(field);
        if is_blank(value) {
            if let Some(message) = required {
                self.fail(field, message, None);
            }
            return None;
        }
        let value = value?;
        match value.as_str().filter(|s| ObjectId::is_valid(s)) {
            Some(id) => Some(id.to_lowercase()),
            None => {
                self.fail(field, malformed, Some(value));
                None
            }
        }
    }

    /// Strings in `field` when it is an array of strings
    pub fn string_list(&mut self, body: &Document, field: &str, message: &str) -> Option<Vec<String>> {
        let value = body.get(field)?;
        let items = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });
        if items.is_none() {
            self.fail(field, message, Some(value));
        }
        items
    }

    /// Finish validation, failing with every recorded error
    pub fn finish(self, operation: ApiOperation) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_failed(operation, self.errors))
        }
    }
}

/// Rules for the `name` of categories, subcategories and brands
#[derive(Debug, Clone, Copy)]
pub struct NameRules {
    /// Message for a missing name
    pub required: &'static str,
    /// Minimum length and its message
    pub min: (usize, &'static str),
    /// Maximum length and its message
    pub max: (usize, &'static str),
}

impl NameRules {
    /// Check `name` and derive `slug` from it
    ///
    /// A missing name fails only when `required`; otherwise the body is left
    /// untouched.
    pub fn apply(&self, checks: &mut Checks, body: &mut Document, required: bool) {
        let name = if required {
            checks.required_text(body, "name", self.required)
        } else {
            checks.optional_text(body, "name")
        };
        let Some(name) = name else {
            return;
        };
        checks.length("name", &name, Some(self.min), Some(self.max));
        body.insert("slug".to_string(), Value::String(slugify(&name)));
    }
}
