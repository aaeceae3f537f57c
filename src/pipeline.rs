//! Load-and-render pipeline.
//!
//! A run is a single linear pass:
//! `Idle -> Loading -> [Enriching] -> Rendered | ErrorShown`.
//! There are no retries and no re-entry; a failed load leaves exactly one
//! "unavailable" entry on the page and nothing else is touched.

use std::fmt;

use tracing::{debug, error, info, instrument};

use crate::enrich::EnrichStats;
use crate::filter::FilterSelection;
use crate::page::Page;
use crate::publication::PublicationItem;
use crate::source::{LoadError, SourceLoader};

/// States a pipeline run passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Enriching,
    Rendered,
    ErrorShown,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Enriching => "enriching",
            Self::Rendered => "rendered",
            Self::ErrorShown => "error-shown",
        };
        f.write_str(label)
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Every state visited, in order, starting with `Idle`.
    pub states: Vec<PipelineState>,
    /// Loaded items in display order (empty on failure).
    pub items: Vec<PublicationItem>,
    /// Enrichment counters, for sources that enrich.
    pub enrich_stats: Option<EnrichStats>,
    /// The load error, when the run ended in `ErrorShown`.
    pub error: Option<LoadError>,
}

impl PipelineOutcome {
    /// The terminal state.
    #[must_use]
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.final_state() == PipelineState::Rendered
    }
}

/// Drives one source through loading and rendering onto a page.
#[derive(Debug)]
pub struct Pipeline {
    states: Vec<PipelineState>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![PipelineState::Idle],
        }
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(%state, "pipeline state");
        self.states.push(state);
    }

    /// Loads from `source` and renders onto `page`.
    ///
    /// Load failures never propagate: they are logged, shown on the page as
    /// the single "unavailable" entry, and returned in the outcome.
    #[instrument(skip_all, fields(source = source.name()))]
    pub async fn run(
        mut self,
        source: &dyn SourceLoader,
        page: &mut Page,
        selection: &FilterSelection,
    ) -> PipelineOutcome {
        self.enter(PipelineState::Loading);
        let mut items = match source.fetch().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "failed to load publications");
                page.show_unavailable();
                self.enter(PipelineState::ErrorShown);
                return PipelineOutcome {
                    states: self.states,
                    items: Vec::new(),
                    enrich_stats: None,
                    error: Some(e),
                };
            }
        };

        let enrich_stats = if source.enriches() {
            self.enter(PipelineState::Enriching);
            source.enrich(&mut items).await
        } else {
            None
        };

        page.mount(&items, selection);
        self.enter(PipelineState::Rendered);
        info!(count = items.len(), "publications rendered");

        PipelineOutcome {
            states: self.states,
            items,
            enrich_stats,
            error: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::page::Hook;

    struct FixedSource {
        items: Vec<PublicationItem>,
        enriches: bool,
    }

    #[async_trait]
    impl SourceLoader for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> Result<Vec<PublicationItem>, LoadError> {
            Ok(self.items.clone())
        }

        fn enriches(&self) -> bool {
            self.enriches
        }

        async fn enrich(&self, items: &mut Vec<PublicationItem>) -> Option<EnrichStats> {
            if !self.enriches {
                return None;
            }
            for item in items.iter_mut() {
                item.apply_doi("10.1000/enriched");
            }
            Some(EnrichStats::new())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SourceLoader for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self) -> Result<Vec<PublicationItem>, LoadError> {
            Err(LoadError::http_status("https://example.com/works", 503))
        }
    }

    const TEMPLATE: &str =
        r#"<ul id="pubs-list"><li>loading</li></ul><ol id="pubs-preview-list"></ol>"#;

    #[tokio::test]
    async fn test_static_like_run_skips_enriching() {
        let source = FixedSource {
            items: vec![PublicationItem::new("A")],
            enriches: false,
        };
        let mut page = Page::parse(TEMPLATE);

        let outcome = Pipeline::new()
            .run(&source, &mut page, &FilterSelection::default())
            .await;

        assert_eq!(
            outcome.states,
            [
                PipelineState::Idle,
                PipelineState::Loading,
                PipelineState::Rendered
            ]
        );
        assert!(outcome.is_rendered());
        assert!(outcome.enrich_stats.is_none());
        assert_eq!(page.content(Hook::List).unwrap().matches("<li>").count(), 1);
    }

    #[tokio::test]
    async fn test_enriching_source_passes_through_enriching() {
        let source = FixedSource {
            items: vec![PublicationItem::new("A")],
            enriches: true,
        };
        let mut page = Page::parse(TEMPLATE);

        let outcome = Pipeline::new()
            .run(&source, &mut page, &FilterSelection::default())
            .await;

        assert_eq!(
            outcome.states,
            [
                PipelineState::Idle,
                PipelineState::Loading,
                PipelineState::Enriching,
                PipelineState::Rendered
            ]
        );
        assert_eq!(outcome.items[0].doi, "10.1000/enriched");
        assert!(page.content(Hook::List).unwrap().contains("doi:10.1000/enriched"));
    }

    #[tokio::test]
    async fn test_failure_shows_single_muted_entry() {
        let mut page = Page::parse(TEMPLATE);

        let outcome = Pipeline::new()
            .run(&FailingSource, &mut page, &FilterSelection::default())
            .await;

        assert_eq!(outcome.final_state(), PipelineState::ErrorShown);
        assert!(!outcome.states.contains(&PipelineState::Rendered));
        assert!(matches!(
            outcome.error,
            Some(LoadError::HttpStatus { status: 503, .. })
        ));
        assert_eq!(
            page.content(Hook::List).unwrap(),
            "<li class=\"muted\">Publications are unavailable right now.</li>"
        );
        assert_eq!(page.content(Hook::Preview).unwrap(), "");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::ErrorShown.to_string(), "error-shown");
        assert_eq!(PipelineState::Enriching.to_string(), "enriching");
    }
}
