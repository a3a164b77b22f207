// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_identifiers_from_file, load_identifiers_from_source, parse_identifier_line};

// Re-export crawl functionality from snapwalk-core
pub use snapwalk_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
pub use snapwalk_core::report::{CrawlRun, ReportFormat, generate_crawl_report};
