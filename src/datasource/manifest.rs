use std::marker::PhantomData;

use kube::{CustomResourceExt, Resource};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::{DataSource, Error, State};
use crate::{
    diag::Diagnostics,
    manifest::Manifest,
    schema::{self, Attribute, AttributeKind, Schema},
    validators::Validator,
};

/// Renders a custom resource `K` with spec `S` into a YAML manifest without
/// talking to a cluster.
pub struct ManifestDataSource<K, S> {
    description: &'static str,
    _resource: PhantomData<fn() -> (K, S)>,
}

impl<K, S> ManifestDataSource<K, S> {
    #[must_use]
    pub const fn new(description: &'static str) -> Self {
        Self {
            description,
            _resource: PhantomData,
        }
    }
}

impl<K, S> ManifestDataSource<K, S>
where
    K: CustomResourceExt + Resource<DynamicType = ()>,
{
    fn is_namespaced() -> bool {
        K::crd().spec.scope == "Namespaced"
    }

    fn metadata_attribute() -> Attribute {
        let mut attributes = vec![Attribute::required("name", AttributeKind::String)
            .with_description("Unique identification for this resource.")
            .with_validator(Validator::Name)];
        if Self::is_namespaced() {
            attributes.push(
                Attribute::required("namespace", AttributeKind::String)
                    .with_description("Namespace of this resource.")
                    .with_validator(Validator::Namespace),
            );
        }
        attributes.push(
            Attribute::optional("labels", AttributeKind::map(AttributeKind::String))
                .with_description("Keys and values that can be used to organize and categorize objects.")
                .with_validator(Validator::Labels),
        );
        attributes.push(
            Attribute::optional("annotations", AttributeKind::map(AttributeKind::String))
                .with_description("Unstructured key value map stored with a resource that may be set by external tools.")
                .with_validator(Validator::Annotations),
        );
        Attribute::required("metadata", AttributeKind::Object(attributes))
            .with_description("Data that helps uniquely identify this object.")
    }
}

impl<K, S> DataSource for ManifestDataSource<K, S>
where
    K: CustomResourceExt + Resource<DynamicType = ()>,
    S: Serialize + DeserializeOwned,
{
    fn metadata(&self, provider_type_name: &str) -> String {
        format!(
            "{}_{}_{}_{}_manifest",
            provider_type_name,
            K::group(&()).replace('.', "_"),
            K::kind(&()).to_lowercase(),
            K::version(&())
        )
    }

    fn schema(&self) -> Schema {
        let id = if Self::is_namespaced() {
            "Contains the value `metadata.namespace/metadata.name`."
        } else {
            "Contains the value `metadata.name`."
        };
        let mut attributes = vec![
            Attribute::computed("id", AttributeKind::String).with_description(id),
            Attribute::computed("yaml", AttributeKind::String)
                .with_description("The generated manifest in YAML format."),
            Self::metadata_attribute(),
        ];
        attributes.extend(schema::from_crd(&K::crd(), &K::version(&())));
        Schema {
            description: self.description.to_owned(),
            attributes,
        }
    }

    #[tracing::instrument(skip(self, config), fields(kind = %K::kind(&())), level = "debug")]
    fn read(&self, config: &Value) -> Result<State, Diagnostics> {
        let schema = self.schema();
        schema.validate(config)?;

        let wire = schema.to_wire(config);
        trace!("mapped configuration: {}", wire);
        let mut manifest: Manifest<S> =
            serde_json::from_value(wire).map_err(|source| Error::MapConfiguration {
                kind: K::kind(&()).into_owned(),
                source,
            })?;
        manifest.stamp::<K>();

        let id = manifest.id();
        let yaml = manifest.to_yaml().map_err(Error::Marshal)?;
        debug!(%id, "rendered manifest");

        let mut state = config.as_object().cloned().unwrap_or_else(Map::new);
        state.insert("id".to_owned(), Value::String(id));
        state.insert("yaml".to_owned(), Value::String(yaml));
        Ok(State::new(state))
    }
}
