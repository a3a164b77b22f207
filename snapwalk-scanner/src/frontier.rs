use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Predicate deciding whether an identifier was already crawled by an earlier run.
pub type SkipPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Trim an identifier, rejecting the empty string.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Every identifier ever enqueued during one traversal.
#[derive(Debug, Default)]
pub struct IdentifierSet {
    seen: Mutex<HashSet<String>>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `identifier` and returns true if it was unseen.
    ///
    /// The check and the insert happen under one lock, so across any number of
    /// concurrent callers exactly one observes `true` for a given identifier.
    pub fn mark_and_check(&self, identifier: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.contains(identifier) {
            return false;
        }
        seen.insert(identifier.to_string())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Admission gate in front of the work lists: normalization, deduplication and
/// the optional skip predicate.
pub struct Frontier {
    seen: IdentifierSet,
    skip_predicate: Option<SkipPredicate>,
}

impl Frontier {
    pub fn new(skip_predicate: Option<SkipPredicate>) -> Self {
        Self {
            seen: IdentifierSet::new(),
            skip_predicate,
        }
    }

    /// Returns the normalized identifier if it should join a work list.
    ///
    /// Skipped identifiers stay marked as seen so they are never reconsidered.
    pub fn admit(&self, raw: &str) -> Option<String> {
        let identifier = normalize_identifier(raw)?;
        if !self.seen.mark_and_check(&identifier) {
            return None;
        }
        if let Some(skip) = &self.skip_predicate
            && skip(&identifier)
        {
            debug!("Skipping {} (already crawled)", identifier);
            return None;
        }
        Some(identifier)
    }

    /// Builds the first work list from raw seed input, preserving input order.
    pub fn seed<I, S>(&self, seeds: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        seeds
            .into_iter()
            .filter_map(|raw| self.admit(raw.as_ref()))
            .collect()
    }

    pub fn seen(&self) -> &IdentifierSet {
        &self.seen
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(None)
    }
}
