use serde::{Deserialize, Serialize};
use std::fmt;

/// A single image from a profile feed, in the shape written to `images.json`.
///
/// The actor lists are only used to discover further profiles and are not
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub src: String,
    pub caption: Option<String>,
    pub link: String,
    pub likes: u64,
    pub created: String,
    #[serde(skip)]
    pub liked_by: Vec<String>,
    #[serde(skip)]
    pub commented_by: Vec<String>,
}

impl Item {
    /// Every actor referenced by this item, likers first.
    pub fn actors(&self) -> impl Iterator<Item = &str> {
        self.liked_by
            .iter()
            .chain(self.commented_by.iter())
            .map(String::as_str)
    }
}

/// Opaque metadata object describing the profile owner, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileMetadata(pub serde_json::Value);

/// Everything fetched for one identifier: its metadata and every retained item,
/// in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileHarvest {
    pub identifier: String,
    pub profile: ProfileMetadata,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Harvested { items: usize, discovered: usize },
    Failed { reason: String },
}

/// Terminal outcome of one identifier within a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub identifier: String,
    pub generation: u32,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl CrawlOutcome {
    pub fn harvested(identifier: String, generation: u32, items: usize, discovered: usize) -> Self {
        Self {
            identifier,
            generation,
            status: OutcomeStatus::Harvested { items, discovered },
        }
    }

    pub fn failed(identifier: String, generation: u32, reason: String) -> Self {
        Self {
            identifier,
            generation,
            status: OutcomeStatus::Failed { reason },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, OutcomeStatus::Harvested { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Failed { reason } => Some(reason),
            OutcomeStatus::Harvested { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub index: u32,
    pub remaining_depth: u32,
    pub processed: usize,
    pub failed: usize,
    pub discovered: usize,
}

/// Why a traversal stopped. Both are normal completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    MaxDepthReached,
    FrontierExhausted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::MaxDepthReached => write!(f, "reached max depth"),
            Termination::FrontierExhausted => write!(f, "no more items in queue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub outcomes: Vec<CrawlOutcome>,
    pub generations: Vec<GenerationSummary>,
    pub identifiers_seen: usize,
    pub termination: Termination,
}

impl CrawlReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &CrawlOutcome> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CrawlOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn total_items(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                OutcomeStatus::Harvested { items, .. } => items,
                OutcomeStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn outcome(&self, identifier: &str) -> Option<&CrawlOutcome> {
        self.outcomes.iter().find(|o| o.identifier == identifier)
    }
}
