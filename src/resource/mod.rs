// https://github.com/GREsau/schemars/pull/65
#![allow(clippy::field_reassign_with_default)]
// From `CustomResource`
#![allow(clippy::default_trait_access)]

use k8s_openapi::api::{
    core::v1::{PersistentVolumeClaim, PodTemplateSpec, ServiceSpec},
    policy::v1beta1::PodDisruptionBudgetSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod schemas;

/// Desired state of an Elasticsearch cluster managed by ECK.
#[derive(CustomResource, Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "elasticsearch.k8s.elastic.co",
    version = "v1beta1",
    kind = "Elasticsearch",
    plural = "elasticsearches",
    shortname = "es",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    /// The Elasticsearch version.
    pub version: String,
    /// The Elasticsearch Docker image to deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// HTTP layer settings for Elasticsearch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,
    /// Node sets making up the cluster.
    #[schemars(schema_with = "schemas::node_sets")]
    pub node_sets: Vec<NodeSet>,
    /// How updates to the cluster should be performed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_strategy: Option<UpdateStrategy>,
    /// Template for the default PodDisruptionBudget of the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_disruption_budget: Option<PodDisruptionBudgetTemplate>,
    /// Secrets to load into the Elasticsearch keystore.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure_settings: Vec<SecretSource>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// The Service exposing the HTTP endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceTemplate>,
    /// TLS options for the HTTP endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsOptions>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ServiceSpec>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsOptions {
    /// Settings for the self-signed certificate generated by the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_signed_certificate: Option<SelfSignedCertificate>,
    /// A secret holding a user-provided certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<SecretRef>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelfSignedCertificate {
    /// Subject alternative names to add to the certificate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<SubjectAlternativeName>,
    /// Disables the self-signed certificate, serving plain HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAlternativeName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSet {
    /// Logical name for this set of nodes.
    #[schemars(schema_with = "schemas::node_set_name")]
    pub name: String,
    /// Elasticsearch configuration (`elasticsearch.yml`) of the nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "schemas::preserve_unknown_fields")]
    pub config: Option<serde_json::Value>,
    /// Number of nodes to deploy.
    #[schemars(schema_with = "schemas::count")]
    pub count: i32,
    /// Pod template used for the nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplateSpec>,
    /// Persistent volume claims added to every node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_budget: Option<ChangeBudget>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeBudget {
    /// Number of pods that can be unavailable during an update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
    /// Number of pods that can be created above the desired count during an update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionBudgetTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodDisruptionBudgetSpec>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    /// Name of the secret.
    pub secret_name: String,
    /// Keys of the secret to project; all keys when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<KeyToPath>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyToPath {
    /// The key to project.
    pub key: String,
    /// Relative path of the file the key maps to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
