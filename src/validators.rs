//! Field-level validators attached to schema attributes.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DNS_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});
static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));
static QUALIFIED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex")
});

const DNS_SUBDOMAIN_MAX: usize = 253;
const DNS_LABEL_MAX: usize = 63;
const QUALIFIED_NAME_MAX: usize = 63;
const LABEL_VALUE_MAX: usize = 63;
const ANNOTATIONS_MAX_BYTES: usize = 256 * 1024;

/// A regular expression compiled once, compared by its source.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Fails if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_match(&self, s: &str) -> bool {
        self.0.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Object name: a DNS-1123 subdomain.
    Name,
    /// Namespace: a DNS-1123 label.
    Namespace,
    /// Label map: qualified keys and short qualified values.
    Labels,
    /// Annotation map: qualified keys, bounded total size.
    Annotations,
    LengthAtLeast(usize),
    LengthAtMost(usize),
    Matches(Pattern),
    AtLeast(f64),
    AtMost(f64),
    OneOf(Vec<Value>),
    SizeAtLeast(usize),
    SizeAtMost(usize),
}

impl Validator {
    /// Summary used for diagnostics when this validator rejects a value.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Validator::Name => "Invalid object name",
            Validator::Namespace => "Invalid namespace",
            Validator::Labels => "Invalid labels",
            Validator::Annotations => "Invalid annotations",
            Validator::LengthAtLeast(_) | Validator::LengthAtMost(_) => "Invalid string length",
            Validator::Matches(_) => "Invalid string format",
            Validator::AtLeast(_) | Validator::AtMost(_) => "Value out of range",
            Validator::OneOf(_) => "Invalid value",
            Validator::SizeAtLeast(_) | Validator::SizeAtMost(_) => "Invalid collection size",
        }
    }

    /// Human readable description of the constraint.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Validator::Name => "value must be a valid Kubernetes object name".to_owned(),
            Validator::Namespace => "value must be a valid Kubernetes namespace".to_owned(),
            Validator::Labels => "keys and values must be valid Kubernetes labels".to_owned(),
            Validator::Annotations => "keys must be valid Kubernetes annotation keys".to_owned(),
            Validator::LengthAtLeast(n) => format!("string length must be at least {}", n),
            Validator::LengthAtMost(n) => format!("string length must be at most {}", n),
            Validator::Matches(pattern) => {
                format!("value must match regular expression '{}'", pattern.as_str())
            }
            Validator::AtLeast(n) => format!("value must be at least {}", n),
            Validator::AtMost(n) => format!("value must be at most {}", n),
            Validator::OneOf(values) => format!(
                "value must be one of: [{}]",
                values.iter().map(Value::to_string).collect::<Vec<_>>().join(" ")
            ),
            Validator::SizeAtLeast(n) => format!("collection must contain at least {} elements", n),
            Validator::SizeAtMost(n) => format!("collection must contain at most {} elements", n),
        }
    }

    /// Checks `value`, returning the diagnostic detail on failure.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the value is rejected.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Validator::Name => with_str(value, validate_name),
            Validator::Namespace => with_str(value, validate_namespace),
            Validator::Labels => with_map(value, |map| {
                for (key, value) in map {
                    validate_qualified_name(key)?;
                    validate_label_value(value.as_str().unwrap_or_default())?;
                }
                Ok(())
            }),
            Validator::Annotations => with_map(value, |map| {
                let mut total = 0;
                for (key, value) in map {
                    validate_qualified_name(key)?;
                    total += key.len() + value.as_str().map_or(0, str::len);
                }
                if total > ANNOTATIONS_MAX_BYTES {
                    return Err(format!(
                        "total size of annotations must be at most {} bytes, got {}",
                        ANNOTATIONS_MAX_BYTES, total
                    ));
                }
                Ok(())
            }),
            Validator::LengthAtLeast(min) => with_str(value, |s| {
                let len = s.chars().count();
                if len < *min {
                    return Err(format!("{}, got: {}", self.description(), len));
                }
                Ok(())
            }),
            Validator::LengthAtMost(max) => with_str(value, |s| {
                let len = s.chars().count();
                if len > *max {
                    return Err(format!("{}, got: {}", self.description(), len));
                }
                Ok(())
            }),
            Validator::Matches(pattern) => with_str(value, |s| {
                if !pattern.is_match(s) {
                    return Err(format!("{}, got: {}", self.description(), s));
                }
                Ok(())
            }),
            Validator::AtLeast(min) => with_number(value, |n| {
                if n < *min {
                    return Err(format!("{}, got: {}", self.description(), n));
                }
                Ok(())
            }),
            Validator::AtMost(max) => with_number(value, |n| {
                if n > *max {
                    return Err(format!("{}, got: {}", self.description(), n));
                }
                Ok(())
            }),
            Validator::OneOf(values) => {
                if values.contains(value) {
                    Ok(())
                } else {
                    Err(format!("{}, got: {}", self.description(), value))
                }
            }
            Validator::SizeAtLeast(min) => with_len(value, |len| {
                if len < *min {
                    return Err(format!("{}, got: {}", self.description(), len));
                }
                Ok(())
            }),
            Validator::SizeAtMost(max) => with_len(value, |len| {
                if len > *max {
                    return Err(format!("{}, got: {}", self.description(), len));
                }
                Ok(())
            }),
        }
    }
}

fn with_str<F>(value: &Value, f: F) -> Result<(), String>
where
    F: FnOnce(&str) -> Result<(), String>,
{
    value.as_str().map_or_else(|| Err("expected a string".to_owned()), f)
}

fn with_map<F>(value: &Value, f: F) -> Result<(), String>
where
    F: FnOnce(&serde_json::Map<String, Value>) -> Result<(), String>,
{
    value.as_object().map_or_else(|| Err("expected a map".to_owned()), f)
}

fn with_number<F>(value: &Value, f: F) -> Result<(), String>
where
    F: FnOnce(f64) -> Result<(), String>,
{
    value.as_f64().map_or_else(|| Err("expected a number".to_owned()), f)
}

fn with_len<F>(value: &Value, f: F) -> Result<(), String>
where
    F: FnOnce(usize) -> Result<(), String>,
{
    match value {
        Value::Array(items) => f(items.len()),
        Value::Object(map) => f(map.len()),
        _ => Err("expected a collection".to_owned()),
    }
}

/// Checks a Kubernetes object name (DNS-1123 subdomain).
///
/// # Errors
///
/// Returns the reason the name is invalid.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_owned());
    }
    if name.len() > DNS_SUBDOMAIN_MAX {
        return Err(format!("name must be no more than {} characters", DNS_SUBDOMAIN_MAX));
    }
    if !DNS_SUBDOMAIN.is_match(name) {
        return Err(format!(
            "'{}' must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character",
            name
        ));
    }
    Ok(())
}

/// Checks a Kubernetes namespace (DNS-1123 label).
///
/// # Errors
///
/// Returns the reason the namespace is invalid.
pub fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace must not be empty".to_owned());
    }
    if namespace.len() > DNS_LABEL_MAX {
        return Err(format!("namespace must be no more than {} characters", DNS_LABEL_MAX));
    }
    if !DNS_LABEL.is_match(namespace) {
        return Err(format!(
            "'{}' must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character",
            namespace
        ));
    }
    Ok(())
}

/// Checks a label or annotation key: an optional DNS subdomain prefix and a name.
///
/// # Errors
///
/// Returns the reason the key is invalid.
pub fn validate_qualified_name(key: &str) -> Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err(format!("key '{}' has an empty prefix", key));
        }
        if prefix.len() > DNS_SUBDOMAIN_MAX || !DNS_SUBDOMAIN.is_match(prefix) {
            return Err(format!(
                "prefix of key '{}' must be a DNS subdomain of at most {} characters",
                key, DNS_SUBDOMAIN_MAX
            ));
        }
    }
    if name.is_empty() {
        return Err(format!("key '{}' has an empty name", key));
    }
    if name.len() > QUALIFIED_NAME_MAX {
        return Err(format!(
            "name part of key '{}' must be no more than {} characters",
            key, QUALIFIED_NAME_MAX
        ));
    }
    if !QUALIFIED_NAME.is_match(name) {
        return Err(format!(
            "name part of key '{}' must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            key
        ));
    }
    Ok(())
}

/// Checks a label value: empty, or a short qualified name.
///
/// # Errors
///
/// Returns the reason the value is invalid.
pub fn validate_label_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > LABEL_VALUE_MAX {
        return Err(format!(
            "label value '{}' must be no more than {} characters",
            value, LABEL_VALUE_MAX
        ));
    }
    if !QUALIFIED_NAME.is_match(value) {
        return Err(format!(
            "label value '{}' must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            value
        ));
    }
    Ok(())
}
