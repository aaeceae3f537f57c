//! Publication sources.
//!
//! Two interchangeable implementations of [`SourceLoader`] exist and are
//! chosen at configuration time, never combined:
//!
//! - [`StaticJsonSource`] - reads a prebuilt JSON array from disk or over HTTP
//! - [`OrcidSource`] - reads the ORCID works list and enriches items with DOIs
//!
//! # Example
//!
//! ```no_run
//! use publist_core::source::{SourceKind, SourceSettings, build_source};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SourceSettings::new(SourceKind::Static);
//! let source = build_source(&settings)?;
//! let items = source.load().await?;
//! println!("loaded {} publications", items.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod orcid;
mod static_json;

pub use error::LoadError;
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts,
    build_source_http_client,
};
pub use orcid::{DEFAULT_ORCID_BASE_URL, DEFAULT_ORCID_ID, OrcidClient, OrcidSource};
pub use static_json::{
    DEFAULT_STATIC_PATH, StaticJsonSource, StaticLocation, parse_static_document,
};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::enrich::{DEFAULT_ENRICH_WORKERS, EnrichStats};
use crate::publication::PublicationItem;

/// Which source a deployment reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Prebuilt JSON file.
    #[default]
    Static,
    /// Live ORCID public API.
    Orcid,
}

impl SourceKind {
    /// Returns the stable label used in config files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Orcid => "orcid",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "json" => Ok(Self::Static),
            "orcid" | "live" => Ok(Self::Orcid),
            other => Err(format!(
                "unknown source '{other}': expected 'static' or 'orcid'"
            )),
        }
    }
}

/// Everything needed to construct either source.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    /// Static JSON path or URL.
    pub input: String,
    pub orcid_id: String,
    pub orcid_base_url: String,
    /// Enrichment worker bound.
    pub workers: usize,
    /// Pause after each enrichment request, per worker.
    pub request_delay: Duration,
    pub timeouts: HttpTimeouts,
}

impl SourceSettings {
    /// Settings with every default filled in for the given source kind.
    #[must_use]
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            input: DEFAULT_STATIC_PATH.to_string(),
            orcid_id: DEFAULT_ORCID_ID.to_string(),
            orcid_base_url: DEFAULT_ORCID_BASE_URL.to_string(),
            workers: DEFAULT_ENRICH_WORKERS,
            request_delay: Duration::ZERO,
            timeouts: HttpTimeouts::default(),
        }
    }
}

/// A source of publication items.
///
/// `load` runs the primary fetch and then the (optional) enrichment step;
/// the pipeline calls the two halves separately so it can report progress.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Returns the source's name (e.g. "static", "orcid").
    fn name(&self) -> &str;

    /// Performs the primary acquisition.
    async fn fetch(&self) -> Result<Vec<PublicationItem>, LoadError>;

    /// Whether [`SourceLoader::enrich`] does any work for this source.
    fn enriches(&self) -> bool {
        false
    }

    /// Enriches fetched items in place. Never fails; per-item problems are
    /// absorbed and counted.
    async fn enrich(&self, _items: &mut Vec<PublicationItem>) -> Option<EnrichStats> {
        None
    }

    /// Fetches and enriches.
    async fn load(&self) -> Result<Vec<PublicationItem>, LoadError> {
        let mut items = self.fetch().await?;
        self.enrich(&mut items).await;
        Ok(items)
    }
}

/// Builds the configured source.
///
/// # Errors
///
/// Returns [`LoadError`] when the static location or ORCID base URL is
/// invalid, or the HTTP client cannot be constructed.
pub fn build_source(settings: &SourceSettings) -> Result<Box<dyn SourceLoader>, LoadError> {
    match settings.kind {
        SourceKind::Static => Ok(Box::new(StaticJsonSource::new(
            &settings.input,
            settings.timeouts,
        )?)),
        SourceKind::Orcid => {
            let client = OrcidClient::with_base_url(
                &settings.orcid_id,
                &settings.orcid_base_url,
                settings.timeouts,
            )?;
            Ok(Box::new(OrcidSource::new(
                client,
                settings.workers,
                settings.request_delay,
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse_accepts_aliases() {
        assert_eq!("static".parse::<SourceKind>().unwrap(), SourceKind::Static);
        assert_eq!("JSON".parse::<SourceKind>().unwrap(), SourceKind::Static);
        assert_eq!("orcid".parse::<SourceKind>().unwrap(), SourceKind::Orcid);
        assert_eq!(" live ".parse::<SourceKind>().unwrap(), SourceKind::Orcid);
    }

    #[test]
    fn test_source_kind_parse_rejects_unknown() {
        let err = "scholar".parse::<SourceKind>().unwrap_err();
        assert!(err.contains("scholar"));
    }

    #[test]
    fn test_source_kind_display_round_trips() {
        for kind in [SourceKind::Static, SourceKind::Orcid] {
            assert_eq!(kind.to_string().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings = SourceSettings::new(SourceKind::Orcid);
        assert_eq!(settings.input, "assets/publications.json");
        assert_eq!(settings.orcid_id, "0000-0003-2271-6803");
        assert_eq!(settings.orcid_base_url, "https://pub.orcid.org");
        assert_eq!(settings.workers, 6);
        assert_eq!(settings.request_delay, Duration::ZERO);
    }

    #[test]
    fn test_build_source_selects_implementation() {
        let static_source = build_source(&SourceSettings::new(SourceKind::Static)).unwrap();
        assert_eq!(static_source.name(), "static");
        assert!(!static_source.enriches());

        let orcid_source = build_source(&SourceSettings::new(SourceKind::Orcid)).unwrap();
        assert_eq!(orcid_source.name(), "orcid");
        assert!(orcid_source.enriches());
    }

    #[test]
    fn test_build_source_rejects_bad_orcid_base_url() {
        let mut settings = SourceSettings::new(SourceKind::Orcid);
        settings.orcid_base_url = "not a url".to_string();
        assert!(matches!(
            build_source(&settings),
            Err(LoadError::InvalidLocation { .. })
        ));
    }
}
