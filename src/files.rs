use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::model::ProgramCatalog;

pub fn write_programs(path: &Path, catalog: &ProgramCatalog) -> Result<()> {
    write_pretty(path, catalog)
}

pub fn read_programs(path: &Path) -> Result<ProgramCatalog> {
    read(path)
}

pub fn write_courses(path: &Path, courses: &[Value]) -> Result<()> {
    write_pretty(path, &courses)
}

pub fn read_courses(path: &Path) -> Result<Vec<Value>> {
    read(path)
}

// Two-space indentation, UTF-8 kept verbatim. The temp file is renamed into
// place so a failed write never leaves a truncated file for the loaders.
fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {:?}", parent))?;

    let mut file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file for: {:?}", path))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write JSON to file: {:?}", path))?;
    file.persist(path)
        .with_context(|| format!("Failed to persist temporary file to: {:?}", path))?;

    Ok(())
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let value = serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    Ok(value)
}
