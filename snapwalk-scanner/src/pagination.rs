use crate::error::{Result, ScanError};
use crate::extract::{SeedPage, decode_page, extract_seed_data};
use crate::result::ProfileHarvest;
use crate::source::{PageRequest, PageSource};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Retrieves one identifier's complete feed: the profile page, then every media
/// page in sequence.
///
/// Either every page is fetched and decoded or the whole identifier fails; a
/// partial item list is never returned.
pub struct ProfileFetcher {
    source: Arc<dyn PageSource>,
}

impl ProfileFetcher {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, identifier: &str) -> Result<ProfileHarvest> {
        let body = self
            .source
            .fetch_page(&PageRequest::profile(identifier))
            .await?;
        let SeedPage {
            profile,
            mut items,
            mut cursor,
        } = extract_seed_data(&body)?;
        debug!("{}: profile page has {} items", identifier, items.len());

        let mut pages = 1;
        let mut requested = HashSet::new();
        while let Some(max_id) = cursor.take() {
            requested.insert(max_id.clone());
            let body = self
                .source
                .fetch_page(&PageRequest::media(identifier, &max_id))
                .await?;
            let page = decode_page(&body)?;
            pages += 1;
            debug!(
                "{}: page {} after {} has {} items (more: {})",
                identifier,
                pages,
                max_id,
                page.items.len(),
                page.more_available
            );

            items.extend(page.items);
            if page.more_available {
                // A cursor that was already requested would page around the same cycle forever.
                if let Some(next) = page.cursor.as_deref()
                    && requested.contains(next)
                {
                    return Err(ScanError::MalformedPage(format!(
                        "cursor {} after {} was already requested",
                        next, max_id
                    )));
                }
                cursor = page.cursor;
            }
        }

        debug!("{}: {} items over {} pages", identifier, items.len(), pages);
        Ok(ProfileHarvest {
            identifier: identifier.to_string(),
            profile,
            items,
        })
    }
}
