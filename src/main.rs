//! Sales query server
//!
//! Configuration comes from the YAML file named by `SALES_CONFIG` (optional)
//! plus the environment overlay, see [`sales_query::config`].

use anyhow::Result;
use sales_query::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::var("SALES_CONFIG").ok();
    let config = ServiceConfig::load(config_path.as_deref())?;

    tracing::info!(
        bind = %config.server.bind,
        csv = %config.data.csv_path.display(),
        remote = config.active_remote().is_some(),
        "starting sales-query"
    );

    ServerBuilder::new().with_config(config).serve().await
}
