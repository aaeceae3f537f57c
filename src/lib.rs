//! Publication list core library.
//!
//! This library renders a website's publication list from either a prebuilt
//! static JSON document or the ORCID public API, with optional year/type
//! filtering and a five-item preview.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`publication`] - The `PublicationItem` model and its static JSON form
//! - [`source`] - Static JSON and ORCID sources behind the `SourceLoader` trait
//! - [`enrich`] - Bounded-concurrency DOI enrichment for ORCID items
//! - [`filter`] - Year/type selection and distinct-year listing
//! - [`render`] - HTML rendering of list entries
//! - [`page`] - HTML template with optional hooks the list is written into
//! - [`pipeline`] - Load → enrich → render driver with failure handling

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod enrich;
pub mod filter;
pub mod page;
pub mod pipeline;
pub mod publication;
pub mod render;
pub mod source;
mod user_agent;

// Re-export commonly used types
pub use enrich::{DEFAULT_ENRICH_WORKERS, EnrichStats, Enricher, IdentifierLookup};
pub use filter::{FilterSelection, distinct_years};
pub use page::{Hook, PREVIEW_LIMIT, Page};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineState};
pub use publication::PublicationItem;
pub use render::{render_entries, render_unavailable};
pub use source::{
    LoadError, OrcidClient, OrcidSource, SourceKind, SourceLoader, SourceSettings,
    StaticJsonSource, build_source,
};
