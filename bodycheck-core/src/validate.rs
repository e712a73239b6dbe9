//! Body validation against a `Schema`.
//!
//! Checks run depth-first in declaration order and stop at the first violation;
//! no aggregation. A valid object keeps only declared fields.

use std::fmt;

use serde_json::{Map, Value};

use crate::schema::{ObjectSchema, Schema};
use crate::Response;

/// Path of the request body itself in violation messages.
pub const ROOT_PATH: &str = "body";

/// Validated value, or the first violation found.
pub type ValidationResult = Result<Value, Violation>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    WrongType { expected: &'static str },
    MissingProperty { name: String },
    /// Union with no alternatives: nothing can match.
    NoAlternative,
}

/// Where validation failed and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn wrong_type(path: &str, expected: &'static str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ViolationKind::WrongType { expected },
        }
    }

    pub fn missing_property(path: &str, name: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: ViolationKind::MissingProperty {
                name: name.to_owned(),
            },
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// 400 envelope carrying this violation's message.
    pub fn to_response(&self) -> Response {
        Response::error(400, self.message())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::WrongType { expected } => {
                write!(f, "{} should be {}", self.path, expected)
            }
            ViolationKind::MissingProperty { name } => {
                write!(f, "{} should have required property '{}'", self.path, name)
            }
            ViolationKind::NoAlternative => {
                write!(f, "{} should match some schema in anyOf", self.path)
            }
        }
    }
}

impl std::error::Error for Violation {}

/// Validate a request body. A missing body is passed as `Value::Null`.
pub fn validate(schema: &Schema, value: &Value) -> ValidationResult {
    validate_at(schema, value, ROOT_PATH)
}

fn validate_at(schema: &Schema, value: &Value, path: &str) -> ValidationResult {
    match schema {
        Schema::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(Violation::wrong_type(path, "string")),
        },
        Schema::Null => match value {
            Value::Null => Ok(Value::Null),
            _ => Err(Violation::wrong_type(path, "null")),
        },
        Schema::Object(object) => validate_object(object, value, path),
        Schema::Union(alternatives) => validate_union(alternatives, value, path),
    }
}

fn validate_object(schema: &ObjectSchema, value: &Value, path: &str) -> ValidationResult {
    let Some(map) = value.as_object() else {
        return Err(Violation::wrong_type(path, "object"));
    };

    if let Some(missing) = schema.required().find(|name| !map.contains_key(*name)) {
        return Err(Violation::missing_property(path, missing));
    }

    let mut typed = Map::new();
    for field in schema.fields() {
        if let Some(field_value) = map.get(&field.name) {
            let field_path = join_path(path, &field.name);
            let checked = validate_at(&field.schema, field_value, &field_path)?;
            typed.insert(field.name.clone(), checked);
        }
    }
    Ok(Value::Object(typed))
}

// On total mismatch the first alternative's violation is reported.
fn validate_union(alternatives: &[Schema], value: &Value, path: &str) -> ValidationResult {
    let mut first_violation = None;
    for alternative in alternatives {
        match validate_at(alternative, value, path) {
            Ok(typed) => return Ok(typed),
            Err(violation) => {
                first_violation.get_or_insert(violation);
            }
        }
    }
    Err(first_violation.unwrap_or(Violation {
        path: path.to_owned(),
        kind: ViolationKind::NoAlternative,
    }))
}

/// `body.name` for identifier-like names, `body['x-y']` otherwise.
fn join_path(parent: &str, name: &str) -> String {
    let is_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        format!("{}.{}", parent, name)
    } else {
        format!("{}['{}']", parent, name.replace('\'', "\\'"))
    }
}
