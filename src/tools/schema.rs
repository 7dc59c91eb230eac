//! Input-schema derivation
//!
//! Pure translation from a tool's declared parameter table to the
//! protocol-visible `inputSchema` object. Derived fresh on every listing
//! request; the output shares no structure with the source table, so
//! callers may mutate it freely.

use serde_json::{json, Map, Value};

use super::ParamSpec;

/// Derive the MCP `inputSchema` for a parameter table.
///
/// The result is always `{"type": "object", "properties": {...}}`. The
/// `required` key lists required parameter names in declaration order and
/// is omitted entirely when no parameter is required — an absent key means
/// "nothing is required", per the protocol convention.
pub fn input_schema(parameters: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in parameters {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(param.param_type.as_str()));
        if let Some(description) = &param.description {
            prop.insert("description".to_string(), json!(description));
        }
        properties.insert(param.name.clone(), Value::Object(prop));

        if param.is_required() {
            required.push(json!(param.name));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}
