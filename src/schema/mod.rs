/*
 * Responsibility
 * - collection ごとの document schema (field 名 / 型 / required / nullable / default)
 * - write payload の検証と正規化 (create / replace / patch)
 * - query parameter (文字列) を field の型に合わせて JSON 値へ変換
 *
 * 置かないもの
 * - 認可 (creatorID の強制は middleware と handler 側)
 * - store への問い合わせ
 */
mod collections;

pub use collections::{CATEGORIES, Categories, Collection, TODOS, Todos};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored record: a JSON object keyed by wire field names.
pub type Document = Map<String, Value>;

/// Store-assigned record identifier.
pub const ID_FIELD: &str = "_id";
/// Identity of the record's creator. Stamped from the caller, never taken from the client.
pub const OWNER_FIELD: &str = "creatorID";
pub const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    DateTime,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Bool => "a boolean",
            FieldKind::DateTime => "an RFC 3339 datetime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Now,
}

impl FieldDefault {
    fn produce(self) -> Value {
        match self {
            FieldDefault::Now => Value::String(format_datetime(Utc::now())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<FieldDefault>,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: false,
            default: None,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn defaults_to_now(mut self) -> Self {
        self.default = Some(FieldDefault::Now);
        self
    }

    fn check(&self, value: Value) -> Result<Value, ValidationError> {
        match (self.kind, value) {
            (_, Value::Null) if self.nullable => Ok(Value::Null),
            // required strings must also be non-empty
            (FieldKind::String, Value::String(s)) if self.required && s.trim().is_empty() => {
                Err(ValidationError::Missing(self.name))
            }
            (FieldKind::String, v @ Value::String(_)) => Ok(v),
            (FieldKind::Bool, v @ Value::Bool(_)) => Ok(v),
            (FieldKind::DateTime, Value::String(s)) => parse_datetime(&s)
                .map(|dt| Value::String(format_datetime(dt)))
                .ok_or_else(|| self.wrong_type()),
            _ => Err(self.wrong_type()),
        }
    }

    /// Converts a raw query-string value into the JSON value stored for this field.
    fn coerce(&self, raw: &str) -> Result<Value, ValidationError> {
        if self.nullable && raw == "null" {
            return Ok(Value::Null);
        }

        let invalid = || ValidationError::InvalidParameter {
            name: self.name.to_string(),
            value: raw.to_string(),
        };

        match self.kind {
            FieldKind::String => Ok(Value::String(raw.to_string())),
            FieldKind::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            FieldKind::DateTime => parse_datetime(raw)
                .map(|dt| Value::String(format_datetime(dt)))
                .ok_or_else(invalid),
        }
    }

    fn wrong_type(&self) -> ValidationError {
        ValidationError::WrongType {
            field: self.name,
            expected: self.kind.expected(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("unknown query parameter: {0}")]
    UnknownParameter(String),
    #[error("invalid value for {name}: {value:?}")]
    InvalidParameter { name: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Full document; defaults apply.
    Create,
    /// Full document replacing an existing one; defaults apply.
    Replace,
    /// Only the present fields are checked and kept.
    Patch,
}

#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [Field],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validates a write payload and returns the normalised document.
    ///
    /// Fields outside the schema (including `_id`) are dropped. Absent nullable fields are
    /// stored as `null` on create/replace so equality filters on `null` match them.
    pub fn validate(&self, payload: Value, mode: WriteMode) -> Result<Document, ValidationError> {
        let Value::Object(mut input) = payload else {
            return Err(ValidationError::NotAnObject);
        };

        let mut doc = Document::new();
        for field in self.fields {
            match input.remove(field.name) {
                Some(value) => {
                    doc.insert(field.name.to_string(), field.check(value)?);
                }
                None if mode == WriteMode::Patch => {}
                None => {
                    if let Some(default) = field.default {
                        doc.insert(field.name.to_string(), default.produce());
                    } else if field.required {
                        return Err(ValidationError::Missing(field.name));
                    } else if field.nullable {
                        doc.insert(field.name.to_string(), Value::Null);
                    }
                }
            }
        }

        Ok(doc)
    }

    /// Coerces `name=raw` from a query string into a filter value.
    pub fn coerce_param(&self, name: &str, raw: &str) -> Result<Value, ValidationError> {
        self.field(name)
            .ok_or_else(|| ValidationError::UnknownParameter(name.to_string()))?
            .coerce(raw)
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `2024-05-01T12:00:00.000Z`, the shape JavaScript's `Date#toISOString` produces.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_applies_defaults_and_drops_unknown_fields() {
        let doc = TODOS
            .validate(
                json!({
                    "creatorID": "user_1",
                    "content": "Buy milk",
                    "isDone": false,
                    "_id": "spoofed",
                    "extra": 1
                }),
                WriteMode::Create,
            )
            .unwrap();

        assert_eq!(doc["content"], "Buy milk");
        assert_eq!(doc["categoryID"], Value::Null);
        assert!(doc[CREATED_AT_FIELD].as_str().unwrap().ends_with('Z'));
        assert!(!doc.contains_key(ID_FIELD));
        assert!(!doc.contains_key("extra"));
    }

    #[test]
    fn create_requires_every_required_field() {
        let err = TODOS
            .validate(json!({"creatorID": "user_1", "content": "x"}), WriteMode::Create)
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("isDone"));

        let err = CATEGORIES
            .validate(json!({"creatorID": "user_1", "name": "  "}), WriteMode::Create)
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("name"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = TODOS
            .validate(
                json!({"creatorID": "u", "content": "x", "isDone": "yes"}),
                WriteMode::Create,
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "isDone", .. }));

        let err = TODOS
            .validate(json!({"createdAt": "yesterday"}), WriteMode::Patch)
            .unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "createdAt", .. }));

        assert_eq!(
            TODOS.validate(json!(["not", "an", "object"]), WriteMode::Create),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn patch_keeps_only_present_fields() {
        let doc = TODOS
            .validate(json!({"isDone": true, "categoryID": null}), WriteMode::Patch)
            .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc["isDone"], true);
        assert_eq!(doc["categoryID"], Value::Null);
    }

    #[test]
    fn datetimes_are_normalised_to_utc_millis() {
        let doc = CATEGORIES
            .validate(
                json!({"creatorID": "u", "name": "Work", "createdAt": "2024-05-01T14:00:00+02:00"}),
                WriteMode::Create,
            )
            .unwrap();
        assert_eq!(doc[CREATED_AT_FIELD], "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn query_params_are_coerced_by_field_kind() {
        assert_eq!(TODOS.coerce_param("isDone", "true"), Ok(Value::Bool(true)));
        assert_eq!(TODOS.coerce_param("categoryID", "null"), Ok(Value::Null));
        assert_eq!(TODOS.coerce_param("content", "null"), Ok(json!("null")));
        assert!(matches!(
            TODOS.coerce_param("isDone", "maybe"),
            Err(ValidationError::InvalidParameter { .. })
        ));
        assert_eq!(
            CATEGORIES.coerce_param("isDone", "true"),
            Err(ValidationError::UnknownParameter("isDone".to_string()))
        );
    }
}
