#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
pub mod config;
mod datasource;
pub mod diag;
mod manifest;
mod provider;
mod resource;
pub mod schema;
pub mod validators;

pub use config::Config;
pub use datasource::{DataSource, ManifestDataSource, State};
pub use manifest::{Manifest, ManifestMetadata};
pub use provider::{ElasticsearchV1Beta1Manifest, Provider, RenderError, DEFAULT_TYPE_NAME};
pub use resource::{
    ChangeBudget, Elasticsearch, ElasticsearchSpec, HttpConfig, KeyToPath, NodeSet,
    PodDisruptionBudgetTemplate, SecretRef, SecretSource, SelfSignedCertificate, ServiceTemplate,
    SubjectAlternativeName, TlsOptions, UpdateStrategy,
};
