use crate::frontier::Frontier;
use crate::result::{Item, ProfileHarvest};
use std::collections::BTreeSet;
use tracing::debug;

/// Admit every liker and commenter of `harvest` that the frontier has not seen.
///
/// Returns only the identifiers this call admitted. Nothing is discovered once
/// `remaining_depth` is zero.
pub fn expand(harvest: &ProfileHarvest, remaining_depth: u32, frontier: &Frontier) -> Vec<String> {
    if remaining_depth == 0 {
        return Vec::new();
    }

    let candidates: BTreeSet<&str> = harvest.items.iter().flat_map(Item::actors).collect();
    let discovered: Vec<String> = candidates
        .into_iter()
        .filter_map(|candidate| frontier.admit(candidate))
        .collect();

    debug!(
        "{}: {} new identifier(s) from {} items",
        harvest.identifier,
        discovered.len(),
        harvest.items.len()
    );
    discovered
}
