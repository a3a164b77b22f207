// Crawl summaries for the terminal and for machine consumption

use crate::store::StoreSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapwalk_scanner::{CrawlOutcome, CrawlReport, OutcomeStatus, Termination};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// A finished crawl: the traversal report plus what was written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub report: CrawlReport,
    pub store: StoreSummary,
}

impl CrawlRun {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// One progress line per identifier.
pub fn describe_outcome(outcome: &CrawlOutcome) -> String {
    match &outcome.status {
        OutcomeStatus::Harvested { items, discovered } => format!(
            ">> {} success ({} items, {} discovered)",
            outcome.identifier, items, discovered
        ),
        OutcomeStatus::Failed { reason } => {
            format!(">> error during {} crawl: {}", outcome.identifier, reason)
        }
    }
}

pub fn termination_line(termination: Termination) -> String {
    format!("Finished ({})", termination)
}

pub fn generate_crawl_report(run: &CrawlRun) -> String {
    let report = &run.report;

    let mut out = String::new();
    out.push_str(DIVIDER);
    out.push_str("\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Profiles crawled: {}\n", report.outcomes.len()));
    out.push_str(&format!("  Succeeded: {}\n", report.succeeded().count()));
    out.push_str(&format!("  Failed: {}\n", report.failed().count()));
    out.push_str(&format!("  Identifiers seen: {}\n", report.identifiers_seen));
    out.push_str(&format!("  Total items: {}\n", report.total_items()));
    out.push_str(&format!(
        "  Images downloaded: {}\n",
        run.store.images_downloaded
    ));
    if run.store.failures > 0 {
        out.push_str(&format!("  Profiles not saved: {}\n", run.store.failures));
    }
    out.push_str(&format!("  Duration: {:.2}s\n", run.duration_secs()));

    out.push('\n');
    out.push_str(DIVIDER);
    out.push_str("\n\n");

    for generation in &report.generations {
        out.push_str(&format!(
            "## Generation {} (remaining depth {})\n",
            generation.index, generation.remaining_depth
        ));
        out.push_str(&format!(
            "  {} processed, {} failed, {} discovered\n\n",
            generation.processed, generation.failed, generation.discovered
        ));

        for outcome in report
            .outcomes
            .iter()
            .filter(|o| o.generation == generation.index)
        {
            match &outcome.status {
                OutcomeStatus::Harvested { items, discovered } => out.push_str(&format!(
                    "  \x1b[32m✓\x1b[0m {} \x1b[90m{} items, {} discovered\x1b[0m\n",
                    outcome.identifier, items, discovered
                )),
                OutcomeStatus::Failed { reason } => out.push_str(&format!(
                    "  \x1b[31m✗\x1b[0m {} \x1b[90m{}\x1b[0m\n",
                    outcome.identifier, reason
                )),
            }
        }
        out.push('\n');
    }

    out.push_str(&termination_line(report.termination));
    out.push('\n');
    out
}

pub fn generate_json_report(run: &CrawlRun) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "snapwalk",
                "version": env!("CARGO_PKG_VERSION"),
                "format": "json"
            },
            "started_at": run.started_at.to_rfc3339(),
            "finished_at": run.finished_at.to_rfc3339(),
            "duration_seconds": run.duration_secs(),
            "summary": {
                "profiles_crawled": run.report.outcomes.len(),
                "succeeded": run.report.succeeded().count(),
                "failed": run.report.failed().count(),
                "identifiers_seen": run.report.identifiers_seen,
                "total_items": run.report.total_items(),
                "termination": run.report.termination,
            },
            "store": run.store,
            "generations": run.report.generations,
            "outcomes": run.report.outcomes,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn render_report(run: &CrawlRun, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(run)),
        ReportFormat::Json => generate_json_report(run).map_err(|e| e.to_string()),
    }
}
