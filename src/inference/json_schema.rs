// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rendering of inferred requirements as a JSON Schema document.

use serde_json::{json, Map, Value as JsonValue};

use super::model::{Structure, StructureKind};
use super::requirements::Requirements;

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

fn object_schema<'a>(fields: impl Iterator<Item = (&'a String, &'a Structure)>) -> JsonValue {
    let mut properties = Map::new();
    let mut required = vec![];
    for (name, field) in fields {
        properties.insert(name.clone(), structure_schema(field));
        if !field.used_with_default {
            required.push(JsonValue::String(name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// JSON Schema describing values that satisfy the structure.
pub fn structure_schema(structure: &Structure) -> JsonValue {
    let mut schema = match &structure.kind {
        StructureKind::Unknown => json!({}),
        StructureKind::Scalar => json!({
            "anyOf": [
                {"type": "string"},
                {"type": "number"},
                {"type": "boolean"},
                {"type": "null"},
            ]
        }),
        StructureKind::String => json!({"type": "string"}),
        StructureKind::Number => json!({"type": "number"}),
        StructureKind::Boolean => json!({"type": "boolean"}),
        StructureKind::List(element) => json!({
            "type": "array",
            "items": structure_schema(element),
        }),
        StructureKind::Tuple(items) => {
            let min_items = items.len();
            let items: Vec<JsonValue> = items.iter().map(structure_schema).collect();
            json!({
                "type": "array",
                "items": items,
                "minItems": min_items,
            })
        }
        StructureKind::Dictionary(fields) => object_schema(fields.iter()),
    };

    if let Some(obj) = schema.as_object_mut() {
        if let Some(label) = &structure.label {
            obj.insert("title".to_string(), JsonValue::String(label.clone()));
        }
        if let Some(default) = &structure.default_value {
            if let Ok(default) = serde_json::to_value(default) {
                obj.insert("default".to_string(), default);
            }
        }
    }
    schema
}

/// JSON Schema of the context a template must be rendered with.
pub fn to_json_schema(reqs: &Requirements) -> JsonValue {
    let mut schema = object_schema(reqs.iter());
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$schema".to_string(), JsonValue::String(DRAFT.to_string()));
    }
    schema
}
