//! Diagnostics reported back to the caller, modeled after Terraform's.
use std::fmt;

use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One step of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Attribute(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a configuration, e.g. `spec.node_sets[0].name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Self {
        self.with(PathStep::Attribute(name.to_owned()))
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.with(PathStep::Index(index))
    }

    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.with(PathStep::Key(key.to_owned()))
    }

    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    fn with(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
                PathStep::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}

impl Serialize for AttributePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    #[must_use]
    pub fn at(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(path) => write!(f, "{} ({}): {}", self.summary, path, self.detail),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

/// Diagnostics collected while handling one request.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// `Err(self)` if any error was collected.
    ///
    /// # Errors
    ///
    /// Returns the diagnostics when at least one of them is an error.
    pub fn into_result(self) -> Result<(), Self> {
        if self.has_error() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        let path = AttributePath::root()
            .attribute("spec")
            .attribute("node_sets")
            .index(0)
            .attribute("name");
        assert_eq!(path.to_string(), "spec.node_sets[0].name");

        let path = AttributePath::root().attribute("metadata").attribute("labels").key("app");
        assert_eq!(path.to_string(), r#"metadata.labels["app"]"#);
    }

    #[test]
    fn warnings_do_not_fail() {
        let mut diags = Diagnostics::default();
        diags.push(Diagnostic::warning("Deprecated", "use something else"));
        assert!(!diags.has_error());
        assert!(diags.into_result().is_ok());
    }

    #[test]
    fn errors_fail_and_display_every_diagnostic() {
        let mut diags = Diagnostics::default();
        diags.push(Diagnostic::error("Missing required argument", "name is required")
            .at(AttributePath::root().attribute("metadata").attribute("name")));
        diags.push(Diagnostic::error("Unsupported argument", "foo"));
        let err = diags.into_result().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(
            err.to_string(),
            "Missing required argument (metadata.name): name is required\nUnsupported argument: foo"
        );
    }
}
