pub mod crawler;
pub mod error;
pub mod expand;
pub mod extract;
pub mod frontier;
pub mod pagination;
pub mod result;
pub mod source;

#[cfg(test)]
mod testing;

pub use crawler::{
    Crawler, DEFAULT_MAX_DEPTH, DEFAULT_WORKERS, HarvestCallback, OutcomeCallback,
    ProgressCallback,
};
pub use error::ScanError;
pub use frontier::{Frontier, IdentifierSet, SkipPredicate};
pub use result::{CrawlOutcome, CrawlReport, Item, OutcomeStatus, ProfileHarvest, Termination};
pub use source::{HttpPageSource, PageRequest, PageSource};
