//! DOI enrichment pass for live-source items.
//!
//! Items carrying an ORCID put code get one detail lookup each. Lookups run
//! on a bounded set of workers that share an index cursor over the work
//! queue; each worker claims the next unclaimed entry until the queue is
//! empty. All workers are polled on the caller's task and joined with a
//! wait-all barrier, so results are written back only once every lookup has
//! finished.
//!
//! # Example
//!
//! ```no_run
//! use publist_core::enrich::Enricher;
//! use publist_core::source::OrcidClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OrcidClient::new("0000-0003-2271-6803")?;
//! let mut items = client.fetch_works().await?;
//! let stats = Enricher::default().run(&mut items, &client).await;
//! println!("found {} DOIs", stats.found());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::publication::PublicationItem;
use crate::source::LoadError;

/// Default number of concurrent lookups.
pub const DEFAULT_ENRICH_WORKERS: usize = 6;

/// Minimum allowed worker count.
pub const MIN_ENRICH_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_ENRICH_WORKERS: usize = 32;

/// Looks up the DOI of one work by its correlation code.
#[async_trait]
pub trait IdentifierLookup: Send + Sync {
    /// Returns the work's DOI, `Ok(None)` when it has none.
    async fn lookup_doi(&self, put_code: &str) -> Result<Option<String>, LoadError>;
}

/// Counters from one enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichStats {
    requested: AtomicUsize,
    found: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl EnrichStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups issued.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested.load(Ordering::SeqCst)
    }

    /// Lookups that produced a DOI.
    #[must_use]
    pub fn found(&self) -> usize {
        self.found.load(Ordering::SeqCst)
    }

    /// Items without a correlation code (no lookup issued).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Lookups that failed and were treated as "no DOI".
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    fn increment_requested(&self) {
        self.requested.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_found(&self) {
        self.found.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Bounded-concurrency DOI enrichment.
#[derive(Debug, Clone)]
pub struct Enricher {
    workers: usize,
    request_delay: Duration,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(DEFAULT_ENRICH_WORKERS)
    }
}

impl Enricher {
    /// Creates an enricher with the given worker bound, clamped to
    /// `MIN_ENRICH_WORKERS..=MAX_ENRICH_WORKERS`.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let clamped = workers.clamp(MIN_ENRICH_WORKERS, MAX_ENRICH_WORKERS);
        if clamped != workers {
            warn!(
                requested = workers,
                using = clamped,
                "enrichment worker count out of range; clamping"
            );
        }
        Self {
            workers: clamped,
            request_delay: Duration::ZERO,
        }
    }

    /// Sets a pause each worker takes after every lookup.
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Looks up a DOI for every item with a put code and writes the results back.
    ///
    /// Failed lookups are logged and counted, never propagated: the pass
    /// always completes for the whole list.
    #[instrument(skip_all, fields(items = items.len(), workers = self.workers))]
    pub async fn run(
        &self,
        items: &mut [PublicationItem],
        lookup: &dyn IdentifierLookup,
    ) -> EnrichStats {
        let stats = EnrichStats::new();
        let queue: Vec<(usize, String)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.put_code.clone().map(|code| (index, code)))
            .collect();
        stats
            .skipped
            .store(items.len() - queue.len(), Ordering::SeqCst);

        if queue.is_empty() {
            debug!("no items with put codes; skipping enrichment");
            return stats;
        }

        let cursor = AtomicUsize::new(0);
        let worker_count = self.workers.min(queue.len());
        debug!(worker_count, queued = queue.len(), "starting enrichment workers");

        let results = join_all(
            (0..worker_count).map(|worker| self.drain(worker, &queue, &cursor, lookup, &stats)),
        )
        .await;

        for (index, doi) in results.into_iter().flatten() {
            if let Some(item) = items.get_mut(index) {
                item.apply_doi(doi);
            }
        }

        info!(
            requested = stats.requested(),
            found = stats.found(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            "enrichment complete"
        );
        stats
    }

    /// One worker: claims queue entries until none remain.
    async fn drain(
        &self,
        worker: usize,
        queue: &[(usize, String)],
        cursor: &AtomicUsize,
        lookup: &dyn IdentifierLookup,
        stats: &EnrichStats,
    ) -> Vec<(usize, String)> {
        let mut found = Vec::new();

        loop {
            let slot = cursor.fetch_add(1, Ordering::SeqCst);
            let Some((index, put_code)) = queue.get(slot) else {
                break;
            };

            stats.increment_requested();
            match lookup.lookup_doi(put_code).await {
                Ok(Some(doi)) => {
                    debug!(worker, put_code = %put_code, doi = %doi, "found DOI");
                    stats.increment_found();
                    found.push((*index, doi));
                }
                Ok(None) => {
                    debug!(worker, put_code = %put_code, "no DOI for work");
                }
                Err(e) => {
                    warn!(worker, put_code = %put_code, error = %e, "DOI lookup failed; skipping");
                    stats.increment_failed();
                }
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        found
    }
}
