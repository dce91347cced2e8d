use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::model::Locale;

const PROGRAMS_EN_URL: &str = "https://www.ntnu.edu/web/studies/allstudies?p_p_id=studyprogrammelistportlet_WAR_studyprogrammelistportlet&p_p_lifecycle=2&p_p_state=normal&p_p_mode=view&p_p_resource_id=searchStudies&p_p_cacheability=cacheLevelPage";
const PROGRAMS_NO_URL: &str = "https://www.ntnu.no/web/studier/alle?p_p_id=studyprogrammelistportlet_WAR_studyprogrammelistportlet&p_p_lifecycle=2&p_p_state=normal&p_p_mode=view&p_p_resource_id=searchStudies&p_p_cacheability=cacheLevelPage";
const COURSES_URL: &str = "https://tp.educloud.no/ntnu/timeplan/emner.php";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: Sources,
    pub files: Files,
    pub database: String,
    pub keep_existing_courses: bool,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub programs_en: Url,
    pub programs_no: Url,
    pub courses: Url,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Files {
    pub programs: PathBuf,
    pub courses: PathBuf,
}

/// Where the loaders write to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Sqlite(PathBuf),
    Postgres(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Sources::default(),
            files: Files::default(),
            database: "catalog.sqlite".into(),
            keep_existing_courses: false,
            request_timeout_secs: None,
        }
    }
}

impl Default for Sources {
    fn default() -> Self {
        // Constants above are valid URLs
        Self {
            programs_en: Url::parse(PROGRAMS_EN_URL).unwrap(),
            programs_no: Url::parse(PROGRAMS_NO_URL).unwrap(),
            courses: Url::parse(COURSES_URL).unwrap(),
        }
    }
}

impl Default for Files {
    fn default() -> Self {
        Self {
            programs: "programs.json".into(),
            courses: "courses.json".into(),
        }
    }
}

impl Sources {
    pub fn program_url(&self, locale: Locale) -> &Url {
        match locale {
            Locale::En => &self.programs_en,
            Locale::No => &self.programs_no,
        }
    }
}

impl Config {
    pub fn database_target(&self) -> DatabaseTarget {
        DatabaseTarget::parse(&self.database)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl DatabaseTarget {
    pub fn parse(value: &str) -> Self {
        if value.starts_with("postgres://") || value.starts_with("postgresql://") {
            DatabaseTarget::Postgres(value.to_string())
        } else {
            DatabaseTarget::Sqlite(PathBuf::from(value))
        }
    }
}

/// Reads the JSON config at `path`, or falls back to defaults.
/// `DATABASE_URL` wins over the file's `database`.
pub fn load(path: Option<&Path>) -> Result<Config> {
    load_with_database_url(path, env::var("DATABASE_URL").ok())
}

fn load_with_database_url(path: Option<&Path>, database_url: Option<String>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        }
        None => Config::default(),
    };

    if let Some(database) = database_url {
        if !database.trim().is_empty() {
            config.database = database;
        }
    }

    Ok(config)
}
