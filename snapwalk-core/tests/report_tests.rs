// Tests for crawl report generation

use chrono::{Duration, TimeZone, Utc};
use snapwalk_core::report::{
    CrawlRun, ReportFormat, describe_outcome, generate_crawl_report, generate_json_report,
    render_report, termination_line,
};
use snapwalk_core::store::StoreSummary;
use snapwalk_scanner::result::GenerationSummary;
use snapwalk_scanner::{CrawlOutcome, CrawlReport, Termination};

fn sample_run() -> CrawlRun {
    let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    CrawlRun {
        started_at,
        finished_at: started_at + Duration::milliseconds(2500),
        report: CrawlReport {
            outcomes: vec![
                CrawlOutcome::harvested("alice".to_string(), 0, 3, 1),
                CrawlOutcome::harvested("bob".to_string(), 1, 0, 0),
                CrawlOutcome::failed("carol".to_string(), 1, "profile not found".to_string()),
            ],
            generations: vec![
                GenerationSummary {
                    index: 0,
                    remaining_depth: 1,
                    processed: 1,
                    failed: 0,
                    discovered: 2,
                },
                GenerationSummary {
                    index: 1,
                    remaining_depth: 0,
                    processed: 2,
                    failed: 1,
                    discovered: 0,
                },
            ],
            identifiers_seen: 3,
            termination: Termination::MaxDepthReached,
        },
        store: StoreSummary {
            profiles_written: 2,
            images_downloaded: 3,
            failures: 0,
        },
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("txt"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("Json"), Some(ReportFormat::Json));
}

#[test]
fn test_report_format_from_str_unknown() {
    assert_eq!(ReportFormat::from_str("html"), None);
    assert_eq!(ReportFormat::from_str(""), None);
}

// ============================================================================
// Progress Line Tests
// ============================================================================

#[test]
fn test_describe_success() {
    let outcome = CrawlOutcome::harvested("alice".to_string(), 0, 12, 4);
    assert_eq!(
        describe_outcome(&outcome),
        ">> alice success (12 items, 4 discovered)"
    );
}

#[test]
fn test_describe_failure() {
    let outcome = CrawlOutcome::failed("bob".to_string(), 2, "no data found in profile".to_string());
    assert_eq!(
        describe_outcome(&outcome),
        ">> error during bob crawl: no data found in profile"
    );
}

#[test]
fn test_termination_lines() {
    assert_eq!(
        termination_line(Termination::MaxDepthReached),
        "Finished (reached max depth)"
    );
    assert_eq!(
        termination_line(Termination::FrontierExhausted),
        "Finished (no more items in queue)"
    );
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_summary() {
    let report = generate_crawl_report(&sample_run());

    assert!(report.contains("# Summary:"));
    assert!(report.contains("Profiles crawled: 3"));
    assert!(report.contains("Succeeded: 2"));
    assert!(report.contains("Failed: 1"));
    assert!(report.contains("Identifiers seen: 3"));
    assert!(report.contains("Total items: 3"));
    assert!(report.contains("Images downloaded: 3"));
    assert!(report.contains("Duration: 2.50s"));
    assert!(!report.contains("Profiles not saved"));
}

#[test]
fn test_text_report_groups_by_generation() {
    let report = generate_crawl_report(&sample_run());

    let gen0 = report.find("## Generation 0").unwrap();
    let gen1 = report.find("## Generation 1").unwrap();
    let alice = report.find("alice").unwrap();
    let carol = report.find("carol").unwrap();

    assert!(gen0 < alice && alice < gen1);
    assert!(gen1 < carol);
    assert!(report.contains("profile not found"));
}

#[test]
fn test_text_report_ends_with_termination() {
    let report = generate_crawl_report(&sample_run());
    assert!(report.trim_end().ends_with("Finished (reached max depth)"));
}

#[test]
fn test_text_report_mentions_store_failures() {
    let mut run = sample_run();
    run.store.failures = 2;
    let report = generate_crawl_report(&run);
    assert!(report.contains("Profiles not saved: 2"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&sample_run()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "snapwalk");
    assert_eq!(report["summary"]["profiles_crawled"], 3);
    assert_eq!(report["summary"]["failed"], 1);
    assert_eq!(report["summary"]["termination"], "max_depth_reached");
    assert_eq!(report["store"]["images_downloaded"], 3);
    assert_eq!(report["generations"].as_array().unwrap().len(), 2);
}

#[test]
fn test_json_report_outcomes() {
    let json = generate_json_report(&sample_run()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let outcomes = value["report"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes[0]["identifier"], "alice");
    assert_eq!(outcomes[0]["status"], "harvested");
    assert_eq!(outcomes[0]["items"], 3);
    assert_eq!(outcomes[2]["status"], "failed");
    assert_eq!(outcomes[2]["reason"], "profile not found");
}

#[test]
fn test_render_report_dispatches_on_format() {
    let run = sample_run();
    let text = render_report(&run, ReportFormat::Text).unwrap();
    let json = render_report(&run, ReportFormat::Json).unwrap();

    assert!(text.contains("# Summary:"));
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
}
