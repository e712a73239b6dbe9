//! Request body schemas: object, string, null and ordered unions.
//!
//! A schema is a closed tree; validation dispatches on the variant (see `validate`).
//! Routes may also declare their body as a JSON Schema value, of which only the
//! subset below is understood:
//!
//! - `{"type": "object", "properties": {..}, "required": [..]}`
//! - `{"type": "string"}`, `{"type": "null"}`
//! - `{"anyOf": [..]}` / `{"oneOf": [..]}` as an ordered union
//! - `{"type": ["object", "null"], ..}` as a union in listed order

use serde_json::{json, Map, Value};

use crate::CoreError;

#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    Object(ObjectSchema),
    String,
    Null,
    /// Matches if any alternative matches; the first match wins.
    Union(Vec<Schema>),
}

/// Object with fields in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field. Redeclaring a name replaces it in place.
    pub fn field(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_field(name.into(), schema, true)
    }

    /// Add a field that may be absent.
    pub fn optional(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_field(name.into(), schema, false)
    }

    fn with_field(mut self, name: String, schema: Schema, required: bool) -> Self {
        let field = Field {
            name,
            schema,
            required,
        };
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }
}

impl Schema {
    pub fn object(schema: ObjectSchema) -> Self {
        Schema::Object(schema)
    }

    pub fn string() -> Self {
        Schema::String
    }

    pub fn null() -> Self {
        Schema::Null
    }

    pub fn union(alternatives: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Union(alternatives.into_iter().collect())
    }

    /// `inner`, or explicit null / no body at all.
    pub fn nullable(inner: Schema) -> Self {
        Schema::Union(vec![inner, Schema::Null])
    }

    /// Type name as used in violation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Object(_) => "object",
            Schema::String => "string",
            Schema::Null => "null",
            Schema::Union(_) => "union",
        }
    }

    /// Whether a missing body satisfies this schema.
    pub fn accepts_absent(&self) -> bool {
        match self {
            Schema::Null => true,
            Schema::Union(alternatives) => alternatives.iter().any(Schema::accepts_absent),
            Schema::Object(_) | Schema::String => false,
        }
    }

    /// Build from a JSON Schema value (supported subset only).
    pub fn from_json(value: &Value) -> Result<Schema, CoreError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid(format!("schema must be an object, got {}", value)))?;

        for keyword in ["anyOf", "oneOf"] {
            if let Some(alternatives) = obj.get(keyword) {
                let items = alternatives
                    .as_array()
                    .ok_or_else(|| invalid(format!("{} must be an array", keyword)))?;
                if items.is_empty() {
                    return Err(invalid(format!("{} must not be empty", keyword)));
                }
                let alternatives = items
                    .iter()
                    .map(Schema::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Schema::Union(alternatives));
            }
        }

        match obj.get("type") {
            Some(Value::String(name)) => from_type(name, obj),
            Some(Value::Array(names)) if !names.is_empty() => {
                let mut alternatives = names
                    .iter()
                    .map(|n| {
                        n.as_str()
                            .ok_or_else(|| invalid("type list must hold strings"))
                            .and_then(|name| from_type(name, obj))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if alternatives.len() == 1 {
                    return Ok(alternatives.remove(0));
                }
                Ok(Schema::Union(alternatives))
            }
            Some(other) => Err(invalid(format!("unsupported type {}", other))),
            None => Err(invalid("schema has no type")),
        }
    }

    /// Render as JSON Schema (used for the OpenAPI document).
    pub fn to_json(&self) -> Value {
        match self {
            Schema::String => json!({ "type": "string" }),
            Schema::Null => json!({ "type": "null" }),
            Schema::Union(alternatives) => {
                json!({ "anyOf": alternatives.iter().map(Schema::to_json).collect::<Vec<_>>() })
            }
            Schema::Object(object) => {
                let properties: Map<String, Value> = object
                    .fields()
                    .iter()
                    .map(|f| (f.name.clone(), f.schema.to_json()))
                    .collect();
                let mut out = Map::new();
                out.insert("type".into(), json!("object"));
                out.insert("properties".into(), Value::Object(properties));
                let required: Vec<&str> = object.required().collect();
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                Value::Object(out)
            }
        }
    }
}

fn from_type(name: &str, obj: &Map<String, Value>) -> Result<Schema, CoreError> {
    match name {
        "string" => Ok(Schema::String),
        "null" => Ok(Schema::Null),
        "object" => object_from_json(obj).map(Schema::Object),
        other => Err(invalid(format!("unsupported type '{}'", other))),
    }
}

fn object_from_json(obj: &Map<String, Value>) -> Result<ObjectSchema, CoreError> {
    let empty = Map::new();
    let properties = match obj.get("properties") {
        None => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(invalid("properties must be an object")),
    };
    let required: Vec<&str> = match obj.get("required") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().ok_or_else(|| invalid("required must hold strings")))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(invalid("required must be an array")),
    };
    if let Some(unknown) = required.iter().find(|name| !properties.contains_key(**name)) {
        return Err(invalid(format!(
            "required property '{}' is not declared in properties",
            unknown
        )));
    }

    let mut schema = ObjectSchema::new();
    for (name, property) in properties {
        let field_schema = Schema::from_json(property)?;
        schema = if required.contains(&name.as_str()) {
            schema.field(name.as_str(), field_schema)
        } else {
            schema.optional(name.as_str(), field_schema)
        };
    }
    Ok(schema)
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidSchema(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_object() -> Schema {
        Schema::object(ObjectSchema::new().field("name", Schema::string()))
    }

    #[test]
    fn from_json_object_with_required_string() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }))
        .unwrap();
        assert_eq!(schema, name_object());
    }

    #[test]
    fn from_json_any_of_keeps_order() {
        let schema = Schema::from_json(&json!({
            "anyOf": [
                { "type": "object", "properties": { "name": { "type": "string" } }, "required": ["name"] },
                { "type": "null" }
            ]
        }))
        .unwrap();
        assert_eq!(schema, Schema::nullable(name_object()));
    }

    #[test]
    fn from_json_type_list_becomes_union() {
        let schema = Schema::from_json(&json!({ "type": ["string", "null"] })).unwrap();
        assert_eq!(schema, Schema::union([Schema::String, Schema::Null]));
    }

    #[test]
    fn from_json_keeps_property_order_and_optional_fields() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": { "b": { "type": "string" }, "a": { "type": "string" } },
            "required": ["a"]
        }))
        .unwrap();
        let Schema::Object(object) = schema else {
            panic!("expected object schema");
        };
        let names: Vec<&str> = object.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(!object.get("b").unwrap().required);
        assert!(object.get("a").unwrap().required);
    }

    #[test]
    fn from_json_rejects_unsupported_shapes() {
        for bad in [
            json!("string"),
            json!({ "type": "integer" }),
            json!({ "anyOf": [] }),
            json!({ "properties": {} }),
            json!({ "type": "object", "required": ["ghost"] }),
        ] {
            match Schema::from_json(&bad) {
                Err(CoreError::InvalidSchema(_)) => {}
                other => panic!("expected InvalidSchema for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn to_json_round_trips_through_from_json() {
        let schema = Schema::nullable(Schema::object(
            ObjectSchema::new()
                .field("name", Schema::string())
                .optional("nick", Schema::string()),
        ));
        assert_eq!(Schema::from_json(&schema.to_json()).unwrap(), schema);
    }

    #[test]
    fn redeclared_field_is_replaced() {
        let object = ObjectSchema::new()
            .field("name", Schema::string())
            .optional("name", Schema::null());
        assert_eq!(object.fields().len(), 1);
        assert_eq!(object.get("name").unwrap().schema, Schema::Null);
        assert_eq!(object.required().count(), 0);
    }

    #[test]
    fn accepts_absent_only_via_null() {
        assert!(!name_object().accepts_absent());
        assert!(Schema::nullable(name_object()).accepts_absent());
    }
}
