//! Collection schemas
//!
//! A [`Schema`] is the store-level contract for one collection: which fields
//! exist, their types, the transforms applied on write and the validators
//! that must hold. Schemas are strict: fields that are not declared are
//! dropped before a document is stored.
//!
//! ```rust
//! use catalog_service::store::{Field, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new("Category")
//!     .field(Field::string("name").required("Category required").unique().min_length(3, "Too short"))
//!     .field(Field::string("slug").lowercase());
//!
//! let input = json!({"name": "Phones", "slug": "PHONES", "color": "red"});
//! let doc = schema.cast(input.as_object().unwrap().clone()).unwrap();
//! assert_eq!(doc["slug"], "phones");
//! assert!(!doc.contains_key("color"));
//! ```

use serde_json::{Number, Value};

use super::document::{Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD, VERSION_FIELD};
use super::error::FieldViolation;
use crate::ids::ObjectId;

/// Storage type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// Integer or floating point number
    Number,
    /// `true` / `false`
    Boolean,
    /// Reference to another document
    ObjectId,
    /// List of strings
    StringList,
    /// List of references
    ObjectIdList,
}

/// A bound together with the message reported when it is violated
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<T> {
    /// The limit
    pub limit: T,
    /// Message reported on violation
    pub message: String,
}

/// Declaration of one schema field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Storage type
    pub field_type: FieldType,
    /// Message reported when the field is missing; `None` if optional
    pub required: Option<String>,
    /// Whether values must be unique across the collection
    pub unique: bool,
    /// Trim surrounding whitespace on write
    pub trim: bool,
    /// Lowercase on write
    pub lowercase: bool,
    /// Minimum string length in characters
    pub min_length: Option<Rule<usize>>,
    /// Maximum string length in characters
    pub max_length: Option<Rule<usize>>,
    /// Minimum numeric value
    pub min: Option<Rule<f64>>,
    /// Maximum numeric value
    pub max: Option<Rule<f64>>,
    /// Value used when the field is absent on create
    pub default: Option<Value>,
    /// Collection the field references
    pub reference: Option<String>,
}

impl Field {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: None,
            unique: false,
            trim: false,
            lowercase: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            default: None,
            reference: None,
        }
    }

    /// A text field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// A numeric field
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// A boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// A reference to a document in `collection`
    pub fn reference(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            reference: Some(collection.into()),
            ..Self::new(name, FieldType::ObjectId)
        }
    }

    /// A list of references to documents in `collection`
    pub fn references(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            reference: Some(collection.into()),
            ..Self::new(name, FieldType::ObjectIdList)
        }
    }

    /// A list of strings
    pub fn strings(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::StringList)
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    /// Mark the field as unique
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Trim whitespace on write
    #[must_use]
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Lowercase on write
    #[must_use]
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Minimum length
    #[must_use]
    pub fn min_length(mut self, limit: usize, message: impl Into<String>) -> Self {
        self.min_length = Some(Rule {
            limit,
            message: message.into(),
        });
        self
    }

    /// Maximum length
    #[must_use]
    pub fn max_length(mut self, limit: usize, message: impl Into<String>) -> Self {
        self.max_length = Some(Rule {
            limit,
            message: message.into(),
        });
        self
    }

    /// Minimum value
    #[must_use]
    pub fn min(mut self, limit: f64, message: impl Into<String>) -> Self {
        self.min = Some(Rule {
            limit,
            message: message.into(),
        });
        self
    }

    /// Maximum value
    #[must_use]
    pub fn max(mut self, limit: f64, message: impl Into<String>) -> Self {
        self.max = Some(Rule {
            limit,
            message: message.into(),
        });
        self
    }

    /// Default value on create
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn cast(&self, value: Value) -> Result<Value, FieldViolation> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let cast = match self.field_type {
            FieldType::String => cast_string(value).map(|s| Value::String(self.transform(s))),
            FieldType::Number => cast_number(value),
            FieldType::Boolean => cast_bool(value),
            FieldType::ObjectId => cast_object_id(value),
            FieldType::StringList => cast_list(value, |item| {
                cast_string(item).map(|s| Value::String(self.transform(s)))
            }),
            FieldType::ObjectIdList => cast_list(value, cast_object_id),
        };

        cast.map_err(|raw| {
            FieldViolation::new(
                &self.name,
                format!("Cast to {:?} failed for value {raw}", self.field_type),
            )
        })
    }

    fn transform(&self, mut s: String) -> String {
        if self.trim {
            s = s.trim().to_string();
        }
        if self.lowercase {
            s = s.to_lowercase();
        }
        s
    }

    fn validate(&self, value: Option<&Value>, violations: &mut Vec<FieldViolation>) {
        let present = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };

        let Some(value) = present else {
            if let Some(message) = &self.required {
                violations.push(FieldViolation::new(&self.name, message));
            }
            return;
        };

        if let Value::String(s) = value {
            let length = s.chars().count();
            if let Some(rule) = self.min_length.as_ref().filter(|rule| length < rule.limit) {
                violations.push(FieldViolation::new(&self.name, &rule.message));
            }
            if let Some(rule) = self.max_length.as_ref().filter(|rule| length > rule.limit) {
                violations.push(FieldViolation::new(&self.name, &rule.message));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(rule) = self.min.as_ref().filter(|rule| n < rule.limit) {
                violations.push(FieldViolation::new(&self.name, &rule.message));
            }
            if let Some(rule) = self.max.as_ref().filter(|rule| n > rule.limit) {
                violations.push(FieldViolation::new(&self.name, &rule.message));
            }
        }
    }
}

fn cast_string(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(other),
    }
}

fn cast_number(value: Value) -> Result<Value, Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(number_value)
            .ok_or(Value::String(s)),
        other => Err(other),
    }
}

/// Convert a float into a JSON number, preferring the integer form
pub fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        #[allow(clippy::cast_possible_truncation)]
        let integer = n as i64;
        return Some(Value::from(integer));
    }
    Number::from_f64(n).map(Value::Number)
}

fn cast_bool(value: Value) -> Result<Value, Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::String(s) if s == "true" => Ok(Value::Bool(true)),
        Value::String(s) if s == "false" => Ok(Value::Bool(false)),
        other => Err(other),
    }
}

fn cast_object_id(value: Value) -> Result<Value, Value> {
    match value {
        Value::String(s) => match s.parse::<ObjectId>() {
            Ok(id) => Ok(Value::String(id.into())),
            Err(_) => Err(Value::String(s)),
        },
        other => Err(other),
    }
}

fn cast_list(value: Value, cast_item: impl Fn(Value) -> Result<Value, Value>) -> Result<Value, Value> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(cast_item)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        single => cast_item(single).map(|v| Value::Array(vec![v])),
    }
}

/// Store-level schema for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entity: String,
    fields: Vec<Field>,
    timestamps: bool,
}

impl Schema {
    /// A schema for `entity` with timestamps enabled and no fields
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
            timestamps: true,
        }
    }

    /// Declare a field
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Enable or disable `createdAt` / `updatedAt`
    #[must_use]
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Entity (and collection) name
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Declared fields
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Whether timestamps are maintained
    #[must_use]
    pub fn has_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Look up a declared field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields declared unique
    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// Drop undeclared fields, cast values to their declared types and apply
    /// write transforms. Store-managed fields are dropped too.
    pub fn cast(&self, input: Document) -> Result<Document, Vec<FieldViolation>> {
        let mut output = Document::new();
        let mut violations = Vec::new();

        for (name, value) in input {
            if is_managed(&name) {
                continue;
            }
            let Some(field) = self.get(&name) else {
                continue;
            };
            match field.cast(value) {
                Ok(cast) => {
                    output.insert(name, cast);
                }
                Err(violation) => violations.push(violation),
            }
        }

        if violations.is_empty() {
            Ok(output)
        } else {
            Err(violations)
        }
    }

    /// Fill absent fields that declare a default
    pub fn apply_defaults(&self, document: &mut Document) {
        for field in &self.fields {
            if let Some(default) = &field.default {
                document
                    .entry(field.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    /// Run the validators over a complete document
    pub fn validate(&self, document: &Document) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        for field in &self.fields {
            field.validate(document.get(&field.name), &mut violations);
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn is_managed(name: &str) -> bool {
    matches!(name, ID_FIELD | VERSION_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD)
}
