use crate::error::Result;
use crate::expand::expand;
use crate::frontier::{Frontier, SkipPredicate};
use crate::pagination::ProfileFetcher;
use crate::result::{CrawlOutcome, CrawlReport, GenerationSummary, ProfileHarvest, Termination};
use crate::source::PageSource;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_DEPTH: u32 = 1;
pub const DEFAULT_WORKERS: usize = 10;

/// Called with `(worker_id, identifier)` when a worker picks up an identifier.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called once per identifier as soon as it reaches a terminal outcome.
pub type OutcomeCallback = Arc<dyn Fn(&CrawlOutcome) + Send + Sync>;
/// Receives every successful harvest. Must not block: the worker moves on as
/// soon as it returns.
pub type HarvestCallback = Arc<dyn Fn(ProfileHarvest) + Send + Sync>;

/// Result of draining one work list.
#[derive(Debug, Default)]
pub struct GenerationRun {
    pub outcomes: Vec<CrawlOutcome>,
    pub discovered: Vec<String>,
}

pub struct Crawler {
    fetcher: Arc<ProfileFetcher>,
    max_depth: u32,
    workers: usize,
    skip_predicate: Option<SkipPredicate>,
    progress_callback: Option<ProgressCallback>,
    outcome_callback: Option<OutcomeCallback>,
    harvest_callback: Option<HarvestCallback>,
}

impl Crawler {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            fetcher: Arc::new(ProfileFetcher::new(source)),
            max_depth: DEFAULT_MAX_DEPTH,
            workers: DEFAULT_WORKERS,
            skip_predicate: None,
            progress_callback: None,
            outcome_callback: None,
            harvest_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Concurrency limit per generation. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_skip_predicate(mut self, predicate: SkipPredicate) -> Self {
        self.skip_predicate = Some(predicate);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_outcome_callback(mut self, callback: OutcomeCallback) -> Self {
        self.outcome_callback = Some(callback);
        self
    }

    pub fn with_harvest_callback(mut self, callback: HarvestCallback) -> Self {
        self.harvest_callback = Some(callback);
        self
    }

    /// Traverse the graph from `seeds`, one generation at a time.
    ///
    /// Generation `g` runs with `max_depth - g` remaining depth; identifiers are
    /// only discovered while that is positive, so the last generation is crawled
    /// without growing the frontier. Per-identifier failures end up in the
    /// report; only a panicking worker is an error.
    pub async fn crawl<I, S>(&self, seeds: I) -> Result<CrawlReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let frontier = Arc::new(Frontier::new(self.skip_predicate.clone()));
        let mut work = frontier.seed(seeds);
        info!(
            "Starting crawl of {} identifier(s) with {} workers, max depth {}",
            work.len(),
            self.workers,
            self.max_depth
        );

        let mut remaining_depth = self.max_depth;
        let mut generation = 0;
        let mut outcomes = Vec::new();
        let mut generations = Vec::new();

        let termination = loop {
            let queued = work.len();
            let run = self
                .run_generation(&frontier, work, generation, remaining_depth)
                .await?;

            let failed = run.outcomes.iter().filter(|o| !o.is_ok()).count();
            info!(
                "Generation {} complete: {} processed, {} failed, {} discovered",
                generation,
                queued,
                failed,
                run.discovered.len()
            );
            generations.push(GenerationSummary {
                index: generation,
                remaining_depth,
                processed: queued,
                failed,
                discovered: run.discovered.len(),
            });
            outcomes.extend(run.outcomes);

            let Some(next_depth) = remaining_depth.checked_sub(1) else {
                break Termination::MaxDepthReached;
            };
            if run.discovered.is_empty() {
                break Termination::FrontierExhausted;
            }

            remaining_depth = next_depth;
            generation += 1;
            work = run.discovered;
        };

        info!("Crawl finished ({})", termination);
        Ok(CrawlReport {
            outcomes,
            generations,
            identifiers_seen: frontier.seen().len(),
            termination,
        })
    }

    /// Drain `work` with at most `self.workers` identifiers in flight.
    ///
    /// Returns once every identifier has reached an outcome. A failed
    /// identifier is recorded and never stops its siblings.
    pub async fn run_generation(
        &self,
        frontier: &Arc<Frontier>,
        work: Vec<String>,
        generation: u32,
        remaining_depth: u32,
    ) -> Result<GenerationRun> {
        let worker_count = self.workers.min(work.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(work)));

        let mut worker_handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = queue.clone();
            let fetcher = self.fetcher.clone();
            let frontier = frontier.clone();
            let progress_cb = self.progress_callback.clone();
            let outcome_cb = self.outcome_callback.clone();
            let harvest_cb = self.harvest_callback.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started (generation {})", worker_id, generation);
                let mut processed = Vec::new();

                while let Some(identifier) = Self::next_identifier(&queue) {
                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, identifier.clone());
                    }

                    let (outcome, discovered) = Self::process_identifier(
                        &fetcher,
                        &frontier,
                        identifier,
                        generation,
                        remaining_depth,
                        harvest_cb.as_ref(),
                    )
                    .await;

                    if let Some(ref callback) = outcome_cb {
                        callback(&outcome);
                    }
                    processed.push((outcome, discovered));
                }

                debug!("Worker {} finished", worker_id);
                processed
            });

            worker_handles.push(handle);
        }

        let mut run = GenerationRun::default();
        for handle in worker_handles {
            for (outcome, discovered) in handle.await? {
                run.outcomes.push(outcome);
                run.discovered.extend(discovered);
            }
        }
        Ok(run)
    }

    fn next_identifier(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    async fn process_identifier(
        fetcher: &ProfileFetcher,
        frontier: &Frontier,
        identifier: String,
        generation: u32,
        remaining_depth: u32,
        harvest_callback: Option<&HarvestCallback>,
    ) -> (CrawlOutcome, Vec<String>) {
        match fetcher.fetch(&identifier).await {
            Ok(harvest) => {
                let discovered = expand(&harvest, remaining_depth, frontier);
                let outcome = CrawlOutcome::harvested(
                    identifier,
                    generation,
                    harvest.items.len(),
                    discovered.len(),
                );
                if let Some(callback) = harvest_callback {
                    callback(harvest);
                }
                (outcome, discovered)
            }
            Err(e) => {
                warn!("Crawl error for {}: {}", identifier, e);
                (
                    CrawlOutcome::failed(identifier, generation, e.to_string()),
                    Vec::new(),
                )
            }
        }
    }
}
