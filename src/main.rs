mod config;
mod db;
mod fetch;
mod files;
mod model;
mod pipeline;

use anyhow::Result;
use log::info;
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    if env::var(env_logger::DEFAULT_FILTER_ENV).is_ok() {
        env_logger::init();
    } else {
        env_logger::builder()
            .filter(Some(env!("CARGO_PKG_NAME")), log::LevelFilter::Info)
            .format_timestamp(None)
            .format_target(false)
            .init();
    }

    // Optional: path to a JSON config file
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = config::load(config_path.as_deref())?;

    info!("Catalog update started");

    pipeline::run(&config).await?;

    info!("Catalog update finished");

    Ok(())
}
