//! Error types for publication sources.
//!
//! Every variant carries the path or URL it concerns so a single log line is
//! enough to diagnose a failed load.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading publications.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a local JSON file failed.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Network-level failure (DNS, connection refused, TLS, timeout).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL being fetched.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body was not the JSON shape we expected.
    #[error("unexpected response format from {origin}: {source}")]
    Parse {
        /// File path or URL the body came from.
        origin: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A configured location is neither a readable path nor a valid http(s) URL.
    #[error("invalid source location '{location}': {reason}")]
    InvalidLocation {
        /// The rejected location.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Why construction failed.
        reason: String,
    },
}

impl LoadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a parse error for a body read from `origin`.
    pub fn parse(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    /// Creates an invalid-location error.
    pub fn invalid_location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_includes_url_and_code() {
        let err = LoadError::http_status("https://pub.orcid.org/v3.0/x/works", 503);
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("https://pub.orcid.org/v3.0/x/works"));
    }

    #[test]
    fn test_parse_display_names_origin() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = LoadError::parse("assets/publications.json", source);
        assert!(err.to_string().contains("assets/publications.json"));
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = LoadError::Io {
            path: PathBuf::from("/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/missing.json"));
    }

    #[test]
    fn test_invalid_location_display() {
        let err = LoadError::invalid_location("ftp://x", "unsupported scheme");
        let msg = err.to_string();
        assert!(msg.contains("ftp://x"));
        assert!(msg.contains("unsupported scheme"));
    }
}
