//! Custom schema functions.
use schemars::{gen::SchemaGenerator, schema::Schema};
use serde_json::{from_value, json};

use super::NodeSet;

pub fn count(_: &mut SchemaGenerator) -> Schema {
    from_value(json!({
        "type": "integer",
        "format": "int32",
        "minimum": 0
    }))
    .unwrap()
}

// Names end up in pod and service names, hence the length limit.
pub fn node_set_name(_: &mut SchemaGenerator) -> Schema {
    from_value(json!({
        "type": "string",
        "maxLength": 23,
        "pattern": "^[a-zA-Z0-9-]+$"
    }))
    .unwrap()
}

// Arbitrary `elasticsearch.yml` settings.
pub fn preserve_unknown_fields(_: &mut SchemaGenerator) -> Schema {
    from_value(json!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    }))
    .unwrap()
}

pub fn node_sets(gen: &mut SchemaGenerator) -> Schema {
    let mut schema = gen.subschema_for::<Vec<NodeSet>>().into_object();
    schema.array().min_items = Some(1);
    Schema::Object(schema)
}
