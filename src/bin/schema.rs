// Prints the provider schema as `terraform providers schema -json` would
use k8s_manifests::{Provider, DEFAULT_TYPE_NAME};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let type_name =
        std::env::var("PROVIDER_TYPE_NAME").unwrap_or_else(|_| DEFAULT_TYPE_NAME.to_owned());
    if type_name.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "PROVIDER_TYPE_NAME must not be empty",
        )
        .into());
    }
    let source = std::env::var("PROVIDER_SOURCE")
        .unwrap_or_else(|_| format!("registry.terraform.io/local/{}", type_name));

    let provider = Provider::new(&type_name);
    tracing::debug!(data_sources = ?provider.data_source_names(), "exporting schemas");
    println!("{}", serde_json::to_string_pretty(&provider.schema_json(&source))?);
    Ok(())
}
