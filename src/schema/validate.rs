// Validates configuration against the attribute tree and maps it to manifest fields.
use serde_json::{Map, Value};

use super::{Attribute, AttributeKind, Presence, Schema};
use crate::diag::{AttributePath, Diagnostic, Diagnostics};

impl Schema {
    /// Checks `config` the way Terraform does before a read: unknown and
    /// missing attributes, read-only attributes, value types and validators.
    ///
    /// # Errors
    ///
    /// Returns every problem found, each with the path of the offending value.
    pub fn validate(&self, config: &Value) -> Result<(), Diagnostics> {
        let mut diags = Diagnostics::default();
        match config {
            Value::Object(map) => {
                validate_object(&self.attributes, map, &AttributePath::root(), &mut diags);
            }
            _ => diags.push(Diagnostic::error(
                "Invalid configuration",
                "The configuration must be an object.",
            )),
        }
        tracing::trace!(count = diags.len(), "validated configuration");
        diags.into_result()
    }

    /// Maps validated configuration to its manifest representation.
    ///
    /// Attribute names become manifest field names, unset values and computed
    /// attributes are dropped. Map keys are kept as they are.
    #[must_use]
    pub fn to_wire(&self, config: &Value) -> Value {
        match config {
            Value::Object(map) => Value::Object(object_to_wire(&self.attributes, map)),
            _ => Value::Object(Map::new()),
        }
    }
}

fn validate_object(
    attributes: &[Attribute],
    map: &Map<String, Value>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    for key in map.keys() {
        if !attributes.iter().any(|a| &a.name == key) {
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", key),
                )
                .at(path.attribute(key)),
            );
        }
    }

    for attr in attributes {
        let at = path.attribute(&attr.name);
        match (attr.presence, map.get(&attr.name).filter(|v| !v.is_null())) {
            (Presence::Required, None) => diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                )
                .at(at),
            ),
            (Presence::Computed, Some(_)) => diags.push(
                Diagnostic::error(
                    "Invalid configuration for read-only attribute",
                    format!("Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value of \"{}\".", attr.name),
                )
                .at(at),
            ),
            (_, Some(value)) => validate_attribute(attr, value, &at, diags),
            (_, None) => {}
        }
    }
}

fn validate_attribute(attr: &Attribute, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    let before = diags.len();
    validate_value(&attr.kind, value, path, diags);
    if diags.len() > before {
        // Validators assume a well typed value.
        return;
    }
    for validator in &attr.validators {
        if let Err(detail) = validator.validate(value) {
            diags.push(Diagnostic::error(validator.summary(), detail).at(path.clone()));
        }
    }
}

fn validate_value(kind: &AttributeKind, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    let type_ok = match kind {
        AttributeKind::String => value.is_string(),
        AttributeKind::Int64 => is_integral(value),
        AttributeKind::Float64 => value.is_number(),
        AttributeKind::Bool => value.is_boolean(),
        AttributeKind::IntOrString => value.is_string() || is_integral(value),
        AttributeKind::Dynamic => true,
        AttributeKind::List(elem) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let at = path.index(i);
                    if item.is_null() {
                        diags.push(Diagnostic::error("Invalid list element", "List elements must not be null.").at(at));
                    } else {
                        validate_value(elem, item, &at, diags);
                    }
                }
                true
            }
            _ => false,
        },
        AttributeKind::Map(elem) => match value {
            Value::Object(map) => {
                for (key, item) in map {
                    if !item.is_null() {
                        validate_value(elem, item, &path.key(key), diags);
                    }
                }
                true
            }
            _ => false,
        },
        AttributeKind::Object(attributes) => match value {
            Value::Object(map) => {
                validate_object(attributes, map, path, diags);
                true
            }
            _ => false,
        },
    };

    if !type_ok {
        diags.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!("Expected {}, got {}.", expected(kind), value),
            )
            .at(path.clone()),
        );
    }
}

fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().map_or(false, |f| f.fract() == 0.0)
}

fn expected(kind: &AttributeKind) -> &'static str {
    match kind {
        AttributeKind::String => "a string",
        AttributeKind::Int64 => "a whole number",
        AttributeKind::Float64 => "a number",
        AttributeKind::Bool => "a bool",
        AttributeKind::IntOrString => "a whole number or a string",
        AttributeKind::Dynamic => "any value",
        AttributeKind::List(_) => "a list",
        AttributeKind::Map(_) => "a map",
        AttributeKind::Object(_) => "an object",
    }
}

fn object_to_wire(attributes: &[Attribute], map: &Map<String, Value>) -> Map<String, Value> {
    attributes
        .iter()
        .filter(|a| a.presence != Presence::Computed)
        .filter_map(|a| {
            let value = map.get(&a.name).filter(|v| !v.is_null())?;
            Some((a.field.clone(), value_to_wire(&a.kind, value)))
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn value_to_wire(kind: &AttributeKind, value: &Value) -> Value {
    match (kind, value) {
        (AttributeKind::Object(attributes), Value::Object(map)) => {
            Value::Object(object_to_wire(attributes, map))
        }
        (AttributeKind::List(elem), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| value_to_wire(elem, item)).collect())
        }
        (AttributeKind::Map(elem), Value::Object(map)) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), value_to_wire(elem, v)))
                .collect(),
        ),
        (AttributeKind::Int64 | AttributeKind::IntOrString, Value::Number(n))
            if !n.is_i64() && !n.is_u64() =>
        {
            n.as_f64().map_or_else(|| value.clone(), |f| Value::from(f as i64))
        }
        (AttributeKind::IntOrString, Value::String(s)) => {
            s.parse::<i64>().map_or_else(|_| value.clone(), Value::from)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validators::Validator;

    fn schema() -> Schema {
        Schema {
            description: "Test".to_owned(),
            attributes: vec![
                Attribute::computed("id", AttributeKind::String),
                Attribute::required(
                    "metadata",
                    AttributeKind::Object(vec![
                        Attribute::required("name", AttributeKind::String)
                            .with_validator(Validator::Name),
                        Attribute::optional("labels", AttributeKind::map(AttributeKind::String))
                            .with_validator(Validator::Labels),
                    ]),
                ),
                Attribute::optional(
                    "spec",
                    AttributeKind::Object(vec![
                        Attribute::optional(
                            "nodeSets",
                            AttributeKind::list(AttributeKind::Object(vec![
                                Attribute::required("count", AttributeKind::Int64)
                                    .with_validator(Validator::AtLeast(0.0)),
                                Attribute::optional("config", AttributeKind::Dynamic),
                            ])),
                        ),
                        Attribute::optional("maxUnavailable", AttributeKind::IntOrString),
                    ]),
                ),
            ],
        }
    }

    fn messages(diags: &Diagnostics) -> Vec<(String, String)> {
        diags
            .iter()
            .map(|d| {
                let path = d.attribute.as_ref().map(ToString::to_string).unwrap_or_default();
                (d.summary.clone(), path)
            })
            .collect()
    }

    #[test]
    fn accepts_valid_config() {
        let config = json!({
            "id": null,
            "metadata": {"name": "quickstart", "labels": {"app": "es"}},
            "spec": {"node_sets": [{"count": 3, "config": {"node.store.allow_mmap": false}}]},
        });
        assert!(schema().validate(&config).is_ok());
    }

    #[test]
    fn reports_every_problem_with_paths() {
        let config = json!({
            "id": "ns/name",
            "metadata": {"labels": {"bad key": "x"}, "extra": true},
            "spec": {"node_sets": [{"count": -1}, {"count": "three"}, {}]},
        });
        let diags = schema().validate(&config).unwrap_err();
        let messages = messages(&diags);
        let expected = vec![
            ("Invalid configuration for read-only attribute", "id"),
            ("Unsupported argument", "metadata.extra"),
            ("Missing required argument", "metadata.name"),
            ("Invalid labels", "metadata.labels"),
            ("Value out of range", "spec.node_sets[0].count"),
            ("Incorrect attribute value type", "spec.node_sets[1].count"),
            ("Missing required argument", "spec.node_sets[2].count"),
        ];
        assert_eq!(
            messages,
            expected
                .into_iter()
                .map(|(s, p)| (s.to_owned(), p.to_owned()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn rejects_non_object_config() {
        let diags = schema().validate(&json!("nope")).unwrap_err();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn rejects_empty_name() {
        let config = json!({"metadata": {"name": ""}});
        let diags = schema().validate(&config).unwrap_err();
        assert_eq!(
            messages(&diags),
            vec![("Invalid object name".to_owned(), "metadata.name".to_owned())]
        );
    }

    #[test]
    fn maps_names_to_fields() {
        let config = json!({
            "id": null,
            "metadata": {"name": "quickstart", "labels": {"app.kubernetes.io/name": "es"}},
            "spec": {
                "node_sets": [{"count": 3.0, "config": {"node.roles": ["master"], "some_key": 1}}],
                "max_unavailable": "1",
            },
        });
        assert_eq!(
            schema().to_wire(&config),
            json!({
                "metadata": {"name": "quickstart", "labels": {"app.kubernetes.io/name": "es"}},
                "spec": {
                    "nodeSets": [{"count": 3, "config": {"node.roles": ["master"], "some_key": 1}}],
                    "maxUnavailable": 1,
                },
            })
        );
    }

    #[test]
    fn int_or_string_keeps_percentages() {
        let config = json!({"metadata": {"name": "a"}, "spec": {"max_unavailable": "25%"}});
        assert_eq!(
            schema().to_wire(&config)["spec"]["maxUnavailable"],
            json!("25%")
        );
    }
}
