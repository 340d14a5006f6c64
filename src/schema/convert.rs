// Derives attributes from the OpenAPI v3 schema of a CRD.
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};

use super::{Attribute, AttributeKind, Presence};
use crate::validators::{Pattern, Validator};

// Root properties handled by the data source itself.
const RESERVED: [&str; 4] = ["apiVersion", "kind", "metadata", "status"];

/// Attributes for the root properties of `version` of `crd`, e.g. `spec`.
#[must_use]
pub fn from_crd(crd: &CustomResourceDefinition, version: &str) -> Vec<Attribute> {
    let root = crd
        .spec
        .versions
        .iter()
        .find(|v| v.name == version)
        .and_then(|v| v.schema.as_ref())
        .and_then(|v| v.open_api_v3_schema.as_ref());
    match root {
        Some(root) => object_attributes(root)
            .into_iter()
            .filter(|a| !RESERVED.contains(&a.field.as_str()))
            .collect(),
        None => {
            tracing::warn!(crd = %crd.spec.names.kind, version, "no schema found, using dynamic spec");
            vec![Attribute::optional("spec", AttributeKind::Dynamic)]
        }
    }
}

fn object_attributes(props: &JSONSchemaProps) -> Vec<Attribute> {
    let required = props.required.as_deref().unwrap_or_default();
    props
        .properties
        .iter()
        .flatten()
        .map(|(field, child)| {
            let presence = if required.iter().any(|r| r == field) {
                Presence::Required
            } else {
                Presence::Optional
            };
            attribute(field, child, presence)
        })
        .collect()
}

fn attribute(field: &str, props: &JSONSchemaProps, presence: Presence) -> Attribute {
    let description = props.description.clone();
    let props = unwrap_composition(props);
    Attribute {
        description: description.or_else(|| props.description.clone()),
        validators: validators(props),
        ..Attribute::new(field, kind(props), presence)
    }
}

// `Option<T>` and friends may come wrapped in a single `allOf`/`anyOf`.
fn unwrap_composition(props: &JSONSchemaProps) -> &JSONSchemaProps {
    if props.type_.is_some() || props.properties.is_some() || is_int_or_string(props) {
        return props;
    }
    match (props.all_of.as_deref(), props.any_of.as_deref()) {
        (Some([inner]), _) | (_, Some([inner])) => unwrap_composition(inner),
        _ => props,
    }
}

// k8s-openapi describes `IntOrString` as a string with format `int-or-string`,
// CRDs generated by controller-gen use the extension instead.
fn is_int_or_string(props: &JSONSchemaProps) -> bool {
    props.x_kubernetes_int_or_string == Some(true)
        || props.format.as_deref() == Some("int-or-string")
}

fn kind(props: &JSONSchemaProps) -> AttributeKind {
    let props = unwrap_composition(props);
    if is_int_or_string(props) {
        return AttributeKind::IntOrString;
    }
    let has_properties = props.properties.as_ref().map_or(false, |p| !p.is_empty());
    if props.x_kubernetes_preserve_unknown_fields == Some(true) && !has_properties {
        return AttributeKind::Dynamic;
    }

    match props.type_.as_deref() {
        Some("string") => AttributeKind::String,
        Some("integer") => AttributeKind::Int64,
        Some("number") => AttributeKind::Float64,
        Some("boolean") => AttributeKind::Bool,
        Some("array") => match &props.items {
            Some(JSONSchemaPropsOrArray::Schema(items)) => AttributeKind::list(kind(items)),
            _ => AttributeKind::list(AttributeKind::Dynamic),
        },
        Some("object") | None if has_properties => AttributeKind::Object(object_attributes(props)),
        Some("object") => match &props.additional_properties {
            Some(JSONSchemaPropsOrBool::Schema(values)) => AttributeKind::map(kind(values)),
            _ => AttributeKind::Dynamic,
        },
        _ => AttributeKind::Dynamic,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn validators(props: &JSONSchemaProps) -> Vec<Validator> {
    let mut validators = Vec::new();
    if let Some(min) = props.minimum {
        validators.push(Validator::AtLeast(min));
    }
    if let Some(max) = props.maximum {
        validators.push(Validator::AtMost(max));
    }
    if props.format.as_deref() == Some("int32") {
        if props.minimum.is_none() {
            validators.push(Validator::AtLeast(f64::from(i32::MIN)));
        }
        if props.maximum.is_none() {
            validators.push(Validator::AtMost(f64::from(i32::MAX)));
        }
    }
    if let Some(min) = props.min_length {
        validators.push(Validator::LengthAtLeast(min.max(0) as usize));
    }
    if let Some(max) = props.max_length {
        validators.push(Validator::LengthAtMost(max.max(0) as usize));
    }
    if let Some(pattern) = &props.pattern {
        match Pattern::new(pattern) {
            Ok(pattern) => validators.push(Validator::Matches(pattern)),
            Err(err) => tracing::warn!(%pattern, %err, "skipping invalid pattern"),
        }
    }
    if let Some(values) = &props.enum_ {
        validators.push(Validator::OneOf(values.iter().map(|v| v.0.clone()).collect()));
    }
    if let Some(min) = props.min_items {
        validators.push(Validator::SizeAtLeast(min.max(0) as usize));
    }
    if let Some(max) = props.max_items {
        validators.push(Validator::SizeAtMost(max.max(0) as usize));
    }
    validators
}

/// Converts a camelCase field name into a Terraform attribute name.
///
/// Acronyms stay together (`hostIPC` -> `host_ipc`), including plural ones
/// (`podIPs` -> `pod_ips`).
#[must_use]
pub fn to_snake_case(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut out = String::with_capacity(field.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '.' {
            out.push('_');
            continue;
        }
        if !c.is_ascii_uppercase() {
            out.push(c);
            continue;
        }

        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();
        let after = chars.get(i + 2).copied();
        let boundary = match prev {
            Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
            Some(p) if p.is_ascii_uppercase() => match next {
                // Plural acronym: `IPs` at the end or before the next word.
                Some('s') if after.map_or(true, |a| a.is_ascii_uppercase()) => false,
                Some(n) => n.is_ascii_lowercase(),
                None => false,
            },
            _ => false,
        };
        if boundary {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;

    use super::*;
    use crate::Elasticsearch;

    #[test]
    fn snake_case_names() {
        assert_eq!(to_snake_case("name"), "name");
        assert_eq!(to_snake_case("nodeSets"), "node_sets");
        assert_eq!(to_snake_case("subjectAltNames"), "subject_alt_names");
        assert_eq!(to_snake_case("hostIPC"), "host_ipc");
        assert_eq!(to_snake_case("podIPs"), "pod_ips");
        assert_eq!(to_snake_case("clusterIPs"), "cluster_ips");
        assert_eq!(to_snake_case("ipFamilies"), "ip_families");
        assert_eq!(to_snake_case("IPAddress"), "ip_address");
        assert_eq!(to_snake_case("x509Name"), "x509_name");
        assert_eq!(to_snake_case("$ref"), "$ref");
    }

    fn spec() -> Attribute {
        from_crd(&Elasticsearch::crd(), "v1beta1")
            .into_iter()
            .find(|a| a.name == "spec")
            .unwrap()
    }

    #[test]
    fn only_spec_is_derived() {
        let names: Vec<String> = from_crd(&Elasticsearch::crd(), "v1beta1")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["spec".to_owned()]);
    }

    #[test]
    fn unknown_version_falls_back_to_dynamic() {
        let attributes = from_crd(&Elasticsearch::crd(), "v9");
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].kind, AttributeKind::Dynamic);
    }

    #[test]
    fn spec_requirements() {
        let spec = spec();
        assert_eq!(spec.presence, Presence::Required);
        assert_eq!(spec.get("version").unwrap().presence, Presence::Required);
        assert_eq!(spec.get("image").unwrap().presence, Presence::Optional);

        let node_sets = spec.get("node_sets").unwrap();
        assert_eq!(node_sets.field, "nodeSets");
        assert_eq!(node_sets.presence, Presence::Required);
        assert!(node_sets.validators.contains(&Validator::SizeAtLeast(1)));
    }

    #[test]
    fn node_set_attributes() {
        let node_sets = spec().get("node_sets").cloned().unwrap();
        let node_set = match node_sets.kind {
            AttributeKind::List(elem) => *elem,
            other => panic!("unexpected kind {:?}", other),
        };
        let attributes = node_set.attributes().unwrap();
        let get = |name: &str| attributes.iter().find(|a| a.name == name).unwrap();

        let name = get("name");
        assert_eq!(name.presence, Presence::Required);
        assert!(name.validators.contains(&Validator::LengthAtMost(23)));
        assert!(name
            .validators
            .contains(&Validator::Matches(Pattern::new("^[a-zA-Z0-9-]+$").unwrap())));

        let count = get("count");
        assert_eq!(count.kind, AttributeKind::Int64);
        assert!(count.validators.contains(&Validator::AtLeast(0.0)));
        assert!(count.validators.contains(&Validator::AtMost(f64::from(i32::MAX))));
        assert!(!count.validators.contains(&Validator::AtLeast(f64::from(i32::MIN))));

        assert_eq!(get("config").kind, AttributeKind::Dynamic);
        assert!(matches!(get("pod_template").kind, AttributeKind::Object(_)));
        assert!(matches!(get("volume_claim_templates").kind, AttributeKind::List(_)));
    }

    #[test]
    fn pod_template_is_expanded() {
        let spec = spec();
        let node_sets = spec.get("node_sets").unwrap();
        let node_set = match &node_sets.kind {
            AttributeKind::List(elem) => elem.attributes().unwrap(),
            other => panic!("unexpected kind {:?}", other),
        };
        let pod_template = node_set.iter().find(|a| a.name == "pod_template").unwrap();
        let pod_spec = pod_template.get("spec").unwrap();
        let containers = pod_spec.get("containers").unwrap();
        let container = match &containers.kind {
            AttributeKind::List(elem) => elem.attributes().unwrap(),
            other => panic!("unexpected kind {:?}", other),
        };
        let image_pull_policy = container
            .iter()
            .find(|a| a.name == "image_pull_policy")
            .unwrap();
        assert_eq!(image_pull_policy.field, "imagePullPolicy");
        assert_eq!(image_pull_policy.kind, AttributeKind::String);

        let labels = pod_template.get("metadata").and_then(|m| m.get("labels")).unwrap();
        assert_eq!(labels.kind, AttributeKind::map(AttributeKind::String));
    }

    #[test]
    fn int_or_string_fields() {
        let spec = spec();
        let pdb_spec = spec
            .get("pod_disruption_budget")
            .and_then(|p| p.get("spec"))
            .unwrap();
        assert_eq!(
            pdb_spec.get("max_unavailable").unwrap().kind,
            AttributeKind::IntOrString
        );
    }

    #[test]
    fn int_or_string_formats() {
        let k8s_openapi_shape = JSONSchemaProps {
            type_: Some("string".to_owned()),
            format: Some("int-or-string".to_owned()),
            ..JSONSchemaProps::default()
        };
        assert_eq!(kind(&k8s_openapi_shape), AttributeKind::IntOrString);

        let extension_shape = JSONSchemaProps {
            x_kubernetes_int_or_string: Some(true),
            ..JSONSchemaProps::default()
        };
        assert_eq!(kind(&extension_shape), AttributeKind::IntOrString);

        let target_port = spec()
            .get("http")
            .and_then(|h| h.get("service"))
            .and_then(|s| s.get("spec"))
            .and_then(|s| s.get("ports"))
            .and_then(|p| match &p.kind {
                AttributeKind::List(elem) => elem
                    .attributes()
                    .and_then(|a| a.iter().find(|a| a.name == "target_port"))
                    .cloned(),
                _ => None,
            })
            .unwrap();
        assert_eq!(target_port.kind, AttributeKind::IntOrString);
    }

    #[test]
    fn int32_fields_are_bounded() {
        let spec = spec();
        let max_surge = spec
            .get("update_strategy")
            .and_then(|u| u.get("change_budget"))
            .and_then(|c| c.get("max_surge"))
            .unwrap();
        assert!(max_surge
            .validators
            .contains(&Validator::AtLeast(f64::from(i32::MIN))));
        assert!(max_surge
            .validators
            .contains(&Validator::AtMost(f64::from(i32::MAX))));

        let int64 = JSONSchemaProps {
            type_: Some("integer".to_owned()),
            format: Some("int64".to_owned()),
            ..JSONSchemaProps::default()
        };
        assert!(validators(&int64).is_empty());
    }
}
