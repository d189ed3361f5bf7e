use std::path::PathBuf;
use std::sync::Arc;
use terrane::{logging, Instance, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, source) = ServerConfig::load_or_default(config_path.as_deref())?;

    logging::init(&config.logging)?;
    source.log();
    tracing::info!("Starting terrane {}", env!("CARGO_PKG_VERSION"));

    Arc::new(Instance::new(config)?).run().await
}
