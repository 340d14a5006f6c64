// Renders the manifests declared in a configuration file
use k8s_manifests::{Config, Provider};
use thiserror::Error;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Error)]
enum Error {
    #[error("failed to read config: {0}")]
    ReadConfig(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseConfig(#[source] serde_yaml::Error),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "k8s_manifests=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let config = get_config()?;
    let documents = Provider::new(&config.provider_type_name).render(&config.data)?;
    print!("{}", documents);
    Ok(())
}

fn get_config() -> Result<Config, Error> {
    let config_path =
        std::env::var("MANIFEST_CONFIG").unwrap_or_else(|_| "manifests.yaml".to_owned());
    let config = std::fs::read(config_path).map_err(Error::ReadConfig)?;
    Config::from_yaml(&config).map_err(Error::ParseConfig)
}
