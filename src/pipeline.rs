use anyhow::Result;
use log::{info, warn};
use reqwest::Client;

use crate::config::Config;
use crate::db::{CourseLoad, Store};
use crate::fetch;
use crate::files;
use crate::model;

pub async fn update_programs(client: &Client, config: &Config) -> Result<()> {
    let catalog = fetch::fetch_programs(client, &config.sources).await?;

    files::write_programs(&config.files.programs, &catalog)?;
    info!("Program data saved to {:?}", config.files.programs);

    Ok(())
}

/// Leaves the previous courses file in place when the page has no course array.
pub async fn update_courses(client: &Client, config: &Config) -> Result<bool> {
    let Some(courses) = fetch::fetch_courses(client, &config.sources.courses).await? else {
        warn!("No matches found");
        return Ok(false);
    };

    files::write_courses(&config.files.courses, &courses)?;
    info!("{} courses saved to {:?}", courses.len(), config.files.courses);

    Ok(true)
}

pub async fn initialise_programs(config: &Config) -> Result<usize> {
    let catalog = files::read_programs(&config.files.programs)?;
    let programs = catalog.programs()?;

    let mut store = Store::open(&config.database_target()).await?;
    let loaded = store.replace_programs(&programs).await?;
    store.close().await?;

    info!("Loaded {} programs", loaded);
    Ok(loaded)
}

pub async fn initialise_courses(config: &Config) -> Result<CourseLoad> {
    let values = files::read_courses(&config.files.courses)?;
    let courses = model::courses_from_values(&values)?;

    let mut store = Store::open(&config.database_target()).await?;
    let load = store
        .load_courses(&courses, config.keep_existing_courses)
        .await?;
    store.close().await?;

    info!(
        "Loaded {} courses ({} skipped as already present)",
        load.inserted, load.skipped
    );
    Ok(load)
}

pub async fn run(config: &Config) -> Result<()> {
    let client = fetch::client(config)?;

    update_programs(&client, config).await?;
    update_courses(&client, config).await?;

    initialise_programs(config).await?;
    initialise_courses(config).await?;

    Ok(())
}
