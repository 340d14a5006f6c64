use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{
    config::Blocks,
    datasource::{DataSource, ManifestDataSource, State},
    diag::{Diagnostic, Diagnostics},
    Elasticsearch, ElasticsearchSpec,
};

pub const DEFAULT_TYPE_NAME: &str = "k8s";

/// Manifest data source for `elasticsearch.k8s.elastic.co/v1beta1` `Elasticsearch`.
pub type ElasticsearchV1Beta1Manifest = ManifestDataSource<Elasticsearch, ElasticsearchSpec>;

#[derive(Debug, Error)]
#[error("failed to render {name}:\n{diagnostics}")]
pub struct RenderError {
    /// Name of the data block that failed.
    pub name: String,
    #[source]
    pub diagnostics: Diagnostics,
}

/// Registry of the data sources offered under one provider type name.
pub struct Provider {
    type_name: String,
    data_sources: Vec<Box<dyn DataSource>>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_NAME)
    }
}

impl Provider {
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            data_sources: vec![Box::new(ElasticsearchV1Beta1Manifest::new(
                "Elasticsearch represents an Elasticsearch resource in a Kubernetes cluster.",
            )) as Box<dyn DataSource>],
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Full type names of all data sources.
    #[must_use]
    pub fn data_source_names(&self) -> Vec<String> {
        self.data_sources
            .iter()
            .map(|ds| ds.metadata(&self.type_name))
            .collect()
    }

    #[must_use]
    pub fn data_source(&self, type_name: &str) -> Option<&dyn DataSource> {
        self.data_sources
            .iter()
            .find(|ds| ds.metadata(&self.type_name) == type_name)
            .map(|ds| &**ds)
    }

    /// Reads the data source `type_name` with `config`.
    ///
    /// # Errors
    ///
    /// Returns diagnostics if the data source is unknown or the read fails.
    #[tracing::instrument(skip(self, config), level = "debug")]
    pub fn read(&self, type_name: &str, config: &Value) -> Result<State, Diagnostics> {
        let data_source = self.data_source(type_name).ok_or_else(|| {
            Diagnostic::error(
                "Unknown data source",
                format!(
                    "The provider \"{}\" does not support data source \"{}\".",
                    self.type_name, type_name
                ),
            )
        })?;
        data_source.read(config)
    }

    /// Renders every block as a YAML document, separated by `---`.
    ///
    /// # Errors
    ///
    /// Fails on the first block that can't be read.
    pub fn render(&self, blocks: &Blocks) -> Result<String, RenderError> {
        let mut documents = Vec::with_capacity(blocks.len());
        for (name, block) in blocks {
            let state = self
                .read(&block.type_name, &block.config)
                .map_err(|diagnostics| RenderError {
                    name: name.clone(),
                    diagnostics,
                })?;
            tracing::info!(%name, id = state.id().unwrap_or_default(), "rendered");
            documents.push(state.yaml().unwrap_or_default().to_owned());
        }
        Ok(documents.join("---\n"))
    }

    /// Schemas of all data sources in the format of `terraform providers schema -json`.
    #[must_use]
    pub fn schema_json(&self, source_address: &str) -> Value {
        let data_source_schemas: Map<String, Value> = self
            .data_sources
            .iter()
            .map(|ds| (ds.metadata(&self.type_name), ds.schema().to_json()))
            .collect();
        json!({
            "format_version": "1.0",
            "provider_schemas": {
                source_address: {
                    "provider": {"version": 0, "block": {"description_kind": "plain"}},
                    "data_source_schemas": data_source_schemas,
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataBlock;

    const ES: &str = "k8s_elasticsearch_k8s_elastic_co_elasticsearch_v1beta1_manifest";

    #[test]
    fn lists_data_sources() {
        let provider = Provider::default();
        assert_eq!(provider.type_name(), "k8s");
        assert_eq!(provider.data_source_names(), vec![ES.to_owned()]);
        assert!(provider.data_source(ES).is_some());
        assert!(provider.data_source("k8s_unknown_manifest").is_none());
    }

    #[test]
    fn custom_type_name() {
        let provider = Provider::new("kubernetes");
        assert!(provider
            .data_source("kubernetes_elasticsearch_k8s_elastic_co_elasticsearch_v1beta1_manifest")
            .is_some());
        assert!(provider.data_source(ES).is_none());
    }

    #[test]
    fn unknown_data_source_is_a_diagnostic() {
        let diags = Provider::default()
            .read("k8s_unknown_manifest", &json!({}))
            .unwrap_err();
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Unknown data source");
    }

    #[test]
    fn exports_schemas() {
        let json = Provider::default().schema_json("registry.terraform.io/example/k8s");
        let schema = &json["provider_schemas"]["registry.terraform.io/example/k8s"]
            ["data_source_schemas"][ES]["block"];
        assert_eq!(schema["attributes"]["yaml"]["computed"], true);
        assert_eq!(schema["attributes"]["metadata"]["required"], true);
        assert_eq!(
            schema["attributes"]["spec"]["nested_type"]["attributes"]["node_sets"]["nested_type"]
                ["nesting_mode"],
            "list"
        );
    }

    fn block(name: &str, count: i64) -> DataBlock {
        DataBlock {
            type_name: ES.to_owned(),
            config: json!({
                "metadata": {"name": name, "namespace": "elastic"},
                "spec": {"version": "7.4.0", "node_sets": [{"name": "default", "count": count}]},
            }),
        }
    }

    #[test]
    fn renders_blocks_as_documents() {
        let mut blocks = Blocks::new();
        blocks.insert("first".to_owned(), block("alpha", 1));
        blocks.insert("second".to_owned(), block("beta", 3));

        let out = Provider::default().render(&blocks).unwrap();
        let documents: Vec<&str> = out.split("---\n").collect();
        assert_eq!(documents.len(), 2);
        assert!(documents[0].starts_with("apiVersion: elasticsearch.k8s.elastic.co/v1beta1\n"));
        assert!(documents[0].contains("name: alpha\n"));
        assert!(documents[1].starts_with("apiVersion: elasticsearch.k8s.elastic.co/v1beta1\n"));
        assert!(documents[1].contains("name: beta\n"));
        assert!(documents[1].contains("count: 3\n"));
    }

    #[test]
    fn renders_nothing_without_blocks() {
        assert_eq!(Provider::default().render(&Blocks::new()).unwrap(), "");
    }

    #[test]
    fn render_error_names_the_block() {
        let mut blocks = Blocks::new();
        blocks.insert("good".to_owned(), block("alpha", 1));
        blocks.insert("broken".to_owned(), block("beta", -1));

        let err = Provider::default().render(&blocks).unwrap_err();
        assert_eq!(err.name, "broken");
        assert!(err.to_string().starts_with("failed to render broken:\n"));
        assert!(err.to_string().contains("spec.node_sets[0].count"));
    }
}
