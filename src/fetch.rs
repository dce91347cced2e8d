use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use crate::config::{Config, Sources};
use crate::model::{Locale, ProgramCatalog};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status error: {status} {url}")]
    HttpStatus { status: StatusCode, url: String },
}

pub fn client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Fetches both locales. A locale answering with a non-200 status keeps an
/// empty bucket; transport and JSON errors abort.
pub async fn fetch_programs(client: &Client, sources: &Sources) -> Result<ProgramCatalog> {
    let mut catalog = ProgramCatalog::default();

    for locale in Locale::ALL {
        let url = sources.program_url(locale);

        match fetch_json(client, url).await {
            Ok(value) => {
                info!("Fetched {} program data", locale);
                catalog.set_bucket(locale, value);
            }
            Err(e) => match e.downcast_ref::<FetchError>() {
                Some(FetchError::HttpStatus { status, .. }) => {
                    warn!(
                        "Failed to fetch {} program data. Status code: {}",
                        locale,
                        status.as_u16()
                    );
                }
                None => return Err(e),
            },
        }
    }

    Ok(catalog)
}

async fn fetch_json(client: &Client, url: &Url) -> Result<Value> {
    debug!("GET {}", url);
    let response = client.get(url.clone()).send().await?;

    if response.status() != StatusCode::OK {
        return Err(FetchError::HttpStatus {
            status: response.status(),
            url: url.to_string(),
        }
        .into());
    }

    let body = response.bytes().await?;
    let value = serde_json::from_slice(&body)
        .with_context(|| format!("Response from {} is not valid JSON", url))?;

    Ok(value)
}

static COURSES_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var courses = (\[.*?\]);").unwrap());
static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).unwrap());

/// Returns `None` when the timetable page carries no course array.
pub async fn fetch_courses(client: &Client, url: &Url) -> Result<Option<Vec<Value>>> {
    debug!("GET {}", url);
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        warn!("Timetable page answered {} {}", response.status(), url);
        return Ok(None);
    }

    let charset = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    let bytes = response.bytes().await?;

    extract_courses(&decode_page(charset, &bytes))
}

pub fn extract_courses(page: &str) -> Result<Option<Vec<Value>>> {
    let Some(cap) = COURSES_VAR.captures(page) else {
        return Ok(None);
    };

    let courses: Vec<Value> = serde_json::from_str(&cap[1]).context("Course array is not valid JSON")?;

    Ok(Some(courses))
}

// `text/html; charset="ISO-8859-1"; foo=bar` -> `ISO-8859-1`
fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Header charset first, then a `<meta>` declaration near the top of the
/// page, then a guess from the bytes.
fn decode_page(header_charset: Option<&'static Encoding>, bytes: &[u8]) -> String {
    let encoding = header_charset
        .or_else(|| {
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
            META_CHARSET
                .captures(&head)
                .and_then(|cap| Encoding::for_label(cap[1].as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
