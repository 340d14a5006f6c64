//! Attribute tree declared by data sources.
//!
//! Attributes carry two names: the Terraform attribute name (snake_case) users
//! configure, and the manifest field (camelCase) the value is written to.
use serde_json::{json, Map, Value};

use crate::validators::Validator;

mod convert;
mod validate;

pub use convert::{from_crd, to_snake_case};

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub description: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Set by the data source, never by configuration.
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    String,
    Int64,
    Float64,
    Bool,
    /// Either an integer or a string, like a port name or percentage.
    IntOrString,
    /// Any value, passed through untouched.
    Dynamic,
    List(Box<AttributeKind>),
    Map(Box<AttributeKind>),
    Object(Vec<Attribute>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub field: String,
    pub kind: AttributeKind,
    pub presence: Presence,
    pub description: Option<String>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    #[must_use]
    pub fn new(field: &str, kind: AttributeKind, presence: Presence) -> Self {
        Self {
            name: to_snake_case(field),
            field: field.to_owned(),
            kind,
            presence,
            description: None,
            validators: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(field: &str, kind: AttributeKind) -> Self {
        Self::new(field, kind, Presence::Required)
    }

    #[must_use]
    pub fn optional(field: &str, kind: AttributeKind) -> Self {
        Self::new(field, kind, Presence::Optional)
    }

    #[must_use]
    pub fn computed(field: &str, kind: AttributeKind) -> Self {
        Self::new(field, kind, Presence::Computed)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Nested attribute `name` of an object attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.kind.attributes()?.iter().find(|a| a.name == name)
    }

    fn to_json(&self) -> Value {
        let mut out = Map::new();
        match self.kind.nested() {
            Some((mode, attributes)) => {
                out.insert(
                    "nested_type".to_owned(),
                    json!({
                        "attributes": attributes_json(attributes),
                        "nesting_mode": mode,
                    }),
                );
            }
            None => {
                out.insert("type".to_owned(), self.kind.cty_type());
            }
        }
        if let Some(description) = &self.description {
            out.insert("description".to_owned(), json!(description));
            out.insert("description_kind".to_owned(), json!("plain"));
        }
        let presence = match self.presence {
            Presence::Required => "required",
            Presence::Optional => "optional",
            Presence::Computed => "computed",
        };
        out.insert(presence.to_owned(), json!(true));
        Value::Object(out)
    }
}

impl AttributeKind {
    #[must_use]
    pub fn list(elem: AttributeKind) -> Self {
        AttributeKind::List(Box::new(elem))
    }

    #[must_use]
    pub fn map(elem: AttributeKind) -> Self {
        AttributeKind::Map(Box::new(elem))
    }

    /// Attributes of an object kind.
    #[must_use]
    pub fn attributes(&self) -> Option<&[Attribute]> {
        match self {
            AttributeKind::Object(attributes) => Some(attributes),
            _ => None,
        }
    }

    // Nested attribute blocks are only used one level deep; anything deeper is a type expression.
    fn nested(&self) -> Option<(&'static str, &[Attribute])> {
        match self {
            AttributeKind::Object(attributes) => Some(("single", attributes)),
            AttributeKind::List(elem) => elem.attributes().map(|a| ("list", a)),
            AttributeKind::Map(elem) => elem.attributes().map(|a| ("map", a)),
            _ => None,
        }
    }

    fn cty_type(&self) -> Value {
        match self {
            AttributeKind::String | AttributeKind::IntOrString => json!("string"),
            AttributeKind::Int64 | AttributeKind::Float64 => json!("number"),
            AttributeKind::Bool => json!("bool"),
            AttributeKind::Dynamic => json!("dynamic"),
            AttributeKind::List(elem) => json!(["list", elem.cty_type()]),
            AttributeKind::Map(elem) => json!(["map", elem.cty_type()]),
            AttributeKind::Object(attributes) => {
                let fields: Map<String, Value> = attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.kind.cty_type()))
                    .collect();
                json!(["object", fields])
            }
        }
    }
}

impl Schema {
    /// Top level attribute `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Renders the schema as a block of `terraform providers schema -json`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "version": 0,
            "block": {
                "attributes": attributes_json(&self.attributes),
                "description": self.description,
                "description_kind": "plain",
            },
        })
    }
}

fn attributes_json(attributes: &[Attribute]) -> Value {
    Value::Object(
        attributes
            .iter()
            .map(|a| (a.name.clone(), a.to_json()))
            .collect(),
    )
}
