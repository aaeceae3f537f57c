//! Static JSON source - the prebuilt `publications.json` written by `publist build`.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, instrument};
use url::Url;

use crate::publication::{PublicationItem, RawRecord};

use super::http_client::{HttpTimeouts, build_source_http_client};
use super::{LoadError, SourceLoader};

/// Default location of the static JSON document.
pub const DEFAULT_STATIC_PATH: &str = "assets/publications.json";

/// Where the static document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticLocation {
    File(PathBuf),
    Url(Url),
}

impl StaticLocation {
    /// Classifies `location` as an `http(s)` URL or a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidLocation`] for empty input, malformed URLs
    /// and URL schemes other than http/https.
    pub fn parse(location: &str) -> Result<Self, LoadError> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(LoadError::invalid_location(location, "location is empty"));
        }

        if trimmed.contains("://") {
            let url = Url::parse(trimmed)
                .map_err(|e| LoadError::invalid_location(trimmed, e.to_string()))?;
            return match url.scheme() {
                "http" | "https" => Ok(Self::Url(url)),
                scheme => Err(LoadError::invalid_location(
                    trimmed,
                    format!("unsupported scheme '{scheme}'"),
                )),
            };
        }

        Ok(Self::File(PathBuf::from(trimmed)))
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Url(url) => url.to_string(),
        }
    }
}

/// Reads a JSON array of publication records with a single uncached read.
pub struct StaticJsonSource {
    location: StaticLocation,
    client: Option<Client>,
}

impl StaticJsonSource {
    /// Creates a source for a path or `http(s)` URL.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the location is invalid or, for URLs, the
    /// HTTP client cannot be built.
    pub fn new(location: &str, timeouts: HttpTimeouts) -> Result<Self, LoadError> {
        let location = StaticLocation::parse(location)?;
        let client = match location {
            StaticLocation::Url(_) => Some(build_source_http_client("static", timeouts)?),
            StaticLocation::File(_) => None,
        };
        Ok(Self { location, client })
    }

    async fn read_body(&self) -> Result<String, LoadError> {
        match &self.location {
            StaticLocation::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LoadError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            StaticLocation::Url(url) => {
                let client = match &self.client {
                    Some(client) => client.clone(),
                    None => build_source_http_client("static", HttpTimeouts::default())?,
                };
                let response = client
                    .get(url.as_str())
                    .header(ACCEPT, "application/json")
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await
                    .map_err(|e| LoadError::network(url.as_str(), e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::http_status(url.as_str(), status.as_u16()));
                }

                response
                    .text()
                    .await
                    .map_err(|e| LoadError::network(url.as_str(), e))
            }
        }
    }
}

impl std::fmt::Debug for StaticJsonSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticJsonSource")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Parses the static document body into items, preserving source order.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] when the body is not a JSON array of objects.
pub fn parse_static_document(
    body: &str,
    origin: &str,
) -> Result<Vec<PublicationItem>, LoadError> {
    let records: Vec<RawRecord> =
        serde_json::from_str(body).map_err(|e| LoadError::parse(origin, e))?;
    Ok(records.into_iter().map(PublicationItem::from).collect())
}

#[async_trait]
impl SourceLoader for StaticJsonSource {
    fn name(&self) -> &'static str {
        "static"
    }

    #[instrument(skip(self), fields(source = "static", location = %self.location.describe()))]
    async fn fetch(&self) -> Result<Vec<PublicationItem>, LoadError> {
        let body = self.read_body().await?;
        let items = parse_static_document(&body, &self.location.describe())?;
        debug!(count = items.len(), "parsed static publications");
        Ok(items)
    }
}
