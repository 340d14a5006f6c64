use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    diag::{Diagnostic, Diagnostics},
    schema::Schema,
};

mod manifest;

pub use manifest::ManifestDataSource;

/// A read-only data source.
pub trait DataSource: Send + Sync {
    /// Full type name of the data source under `provider_type_name`.
    fn metadata(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    /// Computes the state of the data source from its configuration.
    ///
    /// # Errors
    ///
    /// Returns diagnostics if the configuration is invalid or can't be rendered.
    fn read(&self, config: &Value) -> Result<State, Diagnostics>;
}

/// Attribute values produced by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct State(Map<String, Value>);

impl State {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    #[must_use]
    pub fn yaml(&self) -> Option<&str> {
        self.get("yaml").and_then(Value::as_str)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("failed to map configuration to {kind}: {source}")]
    MapConfiguration {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to marshal manifest: {0}")]
    Marshal(#[source] serde_yaml::Error),
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        match err {
            err @ Error::MapConfiguration { .. } => {
                Diagnostic::error("Unable to map configuration", err.to_string())
            }
            err @ Error::Marshal(_) => Diagnostic::error("Unable to marshal YAML", err.to_string()),
        }
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        Diagnostic::from(err).into()
    }
}
