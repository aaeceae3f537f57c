//! ORCID source - reads a researcher's works from the ORCID public API.
//!
//! The [`OrcidClient`] talks to two endpoints:
//!
//! - `GET {base}/v3.0/{orcid}/works` - the works summary, grouped by version
//! - `GET {base}/v3.0/{orcid}/work/{put-code}` - one work with its external ids
//!
//! [`OrcidSource`] maps each version-group to one [`PublicationItem`] and then
//! runs the [`Enricher`] to fill in DOIs from the detail endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::enrich::{EnrichStats, Enricher, IdentifierLookup};
use crate::publication::{
    PublicationItem, lenient_string, normalize_title, sort_newest_first, value_to_string,
};

use super::http_client::{HttpTimeouts, build_source_http_client};
use super::{LoadError, SourceLoader};

/// Default ORCID public API host.
pub const DEFAULT_ORCID_BASE_URL: &str = "https://pub.orcid.org";

/// ORCID iD whose works are listed when none is configured.
pub const DEFAULT_ORCID_ID: &str = "0000-0003-2271-6803";

// ==================== ORCID API Response Types ====================

/// Top-level works summary response.
///
/// Groups stay untyped so one malformed record degrades on its own instead of
/// failing the whole response.
#[derive(Debug, Deserialize)]
pub(crate) struct WorksResponse {
    pub group: Option<Vec<Value>>,
}

/// Detail response for a single work.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkDetail {
    #[serde(rename = "external-ids")]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalIds {
    #[serde(rename = "external-id")]
    pub external_id: Option<Vec<ExternalId>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalId {
    #[serde(
        default,
        rename = "external-id-type",
        deserialize_with = "lenient_string"
    )]
    pub id_type: String,
    #[serde(
        default,
        rename = "external-id-value",
        deserialize_with = "lenient_string"
    )]
    pub value: String,
}

// ==================== Extraction Helpers ====================

/// Text at a JSON pointer; absent or wrongly shaped values become empty.
fn text_at(summary: &Value, pointer: &str) -> String {
    summary
        .pointer(pointer)
        .map(value_to_string)
        .unwrap_or_default()
}

/// Maps one work summary to an item; missing or malformed nested fields
/// become empty strings. Returns `None` when the entry is not an object.
fn summary_to_item(summary: &Value) -> Option<PublicationItem> {
    let fields = summary.as_object()?;
    let put_code = fields
        .get("putCode")
        .or_else(|| fields.get("put-code"))
        .map(value_to_string)
        .filter(|code| !code.is_empty());

    Some(PublicationItem {
        title: normalize_title(text_at(summary, "/title/title/value")),
        year: text_at(summary, "/publication-date/year/value"),
        kind: text_at(summary, "/type"),
        doi: String::new(),
        url: text_at(summary, "/url/value"),
        put_code,
    })
}

/// Takes the first summary of every group, newest year first. Groups without
/// a usable first summary are dropped.
pub(crate) fn items_from_works(works: &WorksResponse) -> Vec<PublicationItem> {
    let mut items: Vec<PublicationItem> = works
        .group
        .iter()
        .flatten()
        .filter_map(|group| group.get("work-summary")?.as_array()?.first())
        .filter_map(summary_to_item)
        .collect();
    sort_newest_first(&mut items);
    items
}

/// Value of the first external id of type "doi" (case-insensitive), trimmed.
///
/// Only that first entry is considered: if its value is blank the work has
/// no DOI, even when a later `doi` entry carries one.
pub(crate) fn doi_from_detail(detail: &WorkDetail) -> Option<String> {
    detail
        .external_ids
        .as_ref()?
        .external_id
        .as_ref()?
        .iter()
        .find(|ext| ext.id_type.trim().eq_ignore_ascii_case("doi"))
        .map(|ext| ext.value.trim().to_string())
        .filter(|doi| !doi.is_empty())
}

// ==================== OrcidClient ====================

/// Thin client over the two ORCID endpoints for a single ORCID iD.
pub struct OrcidClient {
    client: Client,
    base_url: String,
    orcid_id: String,
}

impl OrcidClient {
    /// Creates a client against the public ORCID API.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if HTTP client construction fails.
    pub fn new(orcid_id: impl Into<String>) -> Result<Self, LoadError> {
        Self::with_base_url(orcid_id, DEFAULT_ORCID_BASE_URL, HttpTimeouts::default())
    }

    /// Creates a client with a custom base URL (mirrors, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidLocation`] for a malformed base URL or an
    /// empty ORCID iD, and [`LoadError::Client`] if client construction fails.
    pub fn with_base_url(
        orcid_id: impl Into<String>,
        base_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, LoadError> {
        let orcid_id = orcid_id.into().trim().to_string();
        if orcid_id.is_empty() {
            return Err(LoadError::invalid_location("", "ORCID iD is empty"));
        }

        let base_url = base_url.into();
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| LoadError::invalid_location(&base_url, e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LoadError::invalid_location(
                &base_url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let client = build_source_http_client("orcid", timeouts)?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            orcid_id,
        })
    }

    fn works_url(&self) -> String {
        format!(
            "{}/v3.0/{}/works",
            self.base_url,
            urlencoding::encode(&self.orcid_id)
        )
    }

    fn work_url(&self, put_code: &str) -> String {
        format!(
            "{}/v3.0/{}/work/{}",
            self.base_url,
            urlencoding::encode(&self.orcid_id),
            urlencoding::encode(put_code)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LoadError> {
        debug!(api_url = %url, "Calling ORCID API");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LoadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "ORCID API error");
            return Err(LoadError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::network(url, e))?;
        serde_json::from_str(&body).map_err(|e| LoadError::parse(url, e))
    }

    /// Fetches the works summary and maps it to items, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] on transport failure, non-success status or an
    /// unparseable body.
    #[instrument(skip(self), fields(orcid = %self.orcid_id))]
    pub async fn fetch_works(&self) -> Result<Vec<PublicationItem>, LoadError> {
        let works: WorksResponse = self.get_json(&self.works_url()).await?;
        let items = items_from_works(&works);
        debug!(
            groups = works.group.as_ref().map_or(0, Vec::len),
            items = items.len(),
            "mapped ORCID works"
        );
        Ok(items)
    }
}

impl std::fmt::Debug for OrcidClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrcidClient")
            .field("base_url", &self.base_url)
            .field("orcid_id", &self.orcid_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentifierLookup for OrcidClient {
    #[instrument(skip(self), fields(orcid = %self.orcid_id))]
    async fn lookup_doi(&self, put_code: &str) -> Result<Option<String>, LoadError> {
        let detail: WorkDetail = self.get_json(&self.work_url(put_code)).await?;
        Ok(doi_from_detail(&detail))
    }
}

// ==================== OrcidSource ====================

/// Live source: ORCID works summary plus DOI enrichment.
#[derive(Debug)]
pub struct OrcidSource {
    client: Arc<OrcidClient>,
    enricher: Enricher,
}

impl OrcidSource {
    /// Creates a source with the given worker bound and per-request delay.
    ///
    /// Worker counts outside the valid range are clamped by the [`Enricher`].
    #[must_use]
    pub fn new(client: OrcidClient, workers: usize, request_delay: Duration) -> Self {
        Self {
            client: Arc::new(client),
            enricher: Enricher::new(workers).with_request_delay(request_delay),
        }
    }
}

#[async_trait]
impl SourceLoader for OrcidSource {
    fn name(&self) -> &'static str {
        "orcid"
    }

    async fn fetch(&self) -> Result<Vec<PublicationItem>, LoadError> {
        self.client.fetch_works().await
    }

    fn enriches(&self) -> bool {
        true
    }

    async fn enrich(&self, items: &mut Vec<PublicationItem>) -> Option<EnrichStats> {
        Some(self.enricher.run(items, self.client.as_ref()).await)
    }
}
