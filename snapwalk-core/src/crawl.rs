use crate::report::{CrawlRun, describe_outcome};
use crate::store::{ProfileStore, profile_dir};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use snapwalk_scanner::source::DEFAULT_BASE_URL;
use snapwalk_scanner::{
    CrawlOutcome, Crawler, DEFAULT_MAX_DEPTH, DEFAULT_WORKERS, HttpPageSource, SkipPredicate,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub identifiers: Vec<String>,
    pub workers: usize,
    pub max_depth: u32,
    pub output_dir: PathBuf,
    /// Skip identifiers that already have a directory under `output_dir`.
    pub skip_crawled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            identifiers: Vec::new(),
            workers: DEFAULT_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: PathBuf::from("."),
            skip_crawled: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Skip predicate matching identifiers already saved under `output_dir`.
pub fn already_crawled(output_dir: &Path) -> SkipPredicate {
    let output_dir = output_dir.to_path_buf();
    Arc::new(move |identifier: &str| {
        profile_dir(&output_dir, identifier)
            .map(|dir| dir.exists())
            .unwrap_or(false)
    })
}

/// Execute a crawl with the given options
///
/// Every identifier's outcome is passed to `progress_callback` as one line as
/// soon as it is known. Returns once the traversal has terminated and every
/// harvested profile has been written.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlRun, String> {
    let CrawlOptions {
        identifiers,
        workers,
        max_depth,
        output_dir,
        skip_crawled,
        base_url,
        timeout_secs,
        show_progress_bars,
    } = options;

    if identifiers.is_empty() {
        return Err("No identifiers provided".to_string());
    }

    let source = HttpPageSource::with_timeout(&base_url, timeout_secs)
        .map_err(|e| format!("Failed to create page source: {}", e))?;
    let store = ProfileStore::new(output_dir.clone(), timeout_secs)
        .map_err(|e| format!("Failed to create profile store: {:#}", e))?;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| e.to_string())?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_progress_callback: snapwalk_scanner::ProgressCallback =
        Arc::new(move |_worker_id: usize, identifier: String| {
            if let Some(ref pb) = pb_clone {
                let count = count_clone.load(Ordering::Relaxed);
                pb.set_message(format!("Crawling {}... {} processed", identifier, count));
            }
        });

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let outcome_callback: snapwalk_scanner::OutcomeCallback =
        Arc::new(move |outcome: &CrawlOutcome| {
            count_clone.fetch_add(1, Ordering::Relaxed);
            if let Some(ref callback) = progress_callback {
                let line = describe_outcome(outcome);
                match pb_clone {
                    Some(ref pb) => pb.suspend(|| callback(line)),
                    None => callback(line),
                }
            }
        });

    let mut crawler = Crawler::new(Arc::new(source))
        .with_max_depth(max_depth)
        .with_workers(workers)
        .with_progress_callback(internal_progress_callback)
        .with_outcome_callback(outcome_callback)
        .with_harvest_callback(store.sink());
    if skip_crawled {
        crawler = crawler.with_skip_predicate(already_crawled(&output_dir));
    }

    let started_at = Utc::now();
    let crawl_result = crawler.crawl(&identifiers).await;
    // The crawler holds the store's sink; release it so the writer can drain.
    drop(crawler);

    let report = crawl_result.map_err(|e| format!("Crawl failed: {}", e))?;

    if let Some(ref pb) = progress_bar {
        pb.set_message("Saving profiles...");
    }
    let store_summary = store
        .finish()
        .await
        .map_err(|e| format!("Failed to save profiles: {:#}", e))?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} profiles processed", total));
    }

    Ok(CrawlRun {
        started_at,
        finished_at: Utc::now(),
        report,
        store: store_summary,
    })
}
