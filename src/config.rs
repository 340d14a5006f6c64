use std::collections::BTreeMap;

use serde::Deserialize;

use crate::provider::DEFAULT_TYPE_NAME;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Prefix of the data source type names.
    #[serde(default = "default_type_name")]
    pub provider_type_name: String,
    /// Data blocks to render, by name.
    #[serde(default)]
    pub data: Blocks,
}

pub type Blocks = BTreeMap<String, DataBlock>;

/// A `data` block: the data source type and its configuration.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct DataBlock {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_type_name() -> String {
    DEFAULT_TYPE_NAME.to_owned()
}

impl Config {
    /// Parses a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the document doesn't describe a `Config`.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }
}
