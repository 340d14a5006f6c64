use std::collections::BTreeMap;

use kube::Resource;
use serde::{Deserialize, Serialize};

/// A Kubernetes object as rendered by a manifest data source.
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<S> {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ManifestMetadata,
    // No `default` here: it would add an `S: Default` bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<S>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl<S> Manifest<S> {
    /// Sets `apiVersion` and `kind` to the ones of `K`.
    pub fn stamp<K>(&mut self)
    where
        K: Resource<DynamicType = ()>,
    {
        self.api_version = K::api_version(&()).into_owned();
        self.kind = K::kind(&()).into_owned();
    }

    /// `namespace/name`, or just `name` for cluster scoped objects.
    #[must_use]
    pub fn id(&self) -> String {
        match &self.metadata.namespace {
            Some(namespace) => format!("{}/{}", namespace, self.metadata.name),
            None => self.metadata.name.clone(),
        }
    }
}

impl<S: Serialize> Manifest<S> {
    /// Serializes the manifest as a single YAML document.
    ///
    /// # Errors
    ///
    /// Fails if the manifest can't be represented in YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(match yaml.strip_prefix("---\n") {
            Some(document) => document.to_owned(),
            None => yaml,
        })
    }
}
