// On-disk storage of crawled profiles
//
// Layout per profile:
//   <output>/<identifier>/profile.json
//   <output>/<identifier>/<item id>.jpg
//   <output>/<identifier>/images.json

use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use snapwalk_scanner::{HarvestCallback, Item, ProfileHarvest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Concurrent image downloads per profile.
pub const IMAGE_DOWNLOAD_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub profiles_written: usize,
    pub images_downloaded: usize,
    pub failures: usize,
}

/// Background writer fed through a channel, so the crawl never waits on disk
/// or image downloads.
pub struct ProfileStore {
    sender: mpsc::UnboundedSender<ProfileHarvest>,
    writer: JoinHandle<StoreSummary>,
}

impl ProfileStore {
    /// Must be called from within a tokio runtime.
    pub fn new(output_dir: PathBuf, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("snapwalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("failed to create HTTP client for image downloads")?;

        let (sender, mut receiver) = mpsc::unbounded_channel::<ProfileHarvest>();
        let writer = tokio::spawn(async move {
            let mut summary = StoreSummary::default();
            while let Some(harvest) = receiver.recv().await {
                match write_profile(&output_dir, &client, &harvest).await {
                    Ok(images) => {
                        summary.profiles_written += 1;
                        summary.images_downloaded += images;
                    }
                    Err(e) => {
                        warn!("Failed to save {}: {:#}", harvest.identifier, e);
                        summary.failures += 1;
                    }
                }
            }
            summary
        });

        Ok(Self { sender, writer })
    }

    /// Callback handing harvests to the writer without blocking.
    pub fn sink(&self) -> HarvestCallback {
        let sender = self.sender.clone();
        Arc::new(move |harvest: ProfileHarvest| {
            let identifier = harvest.identifier.clone();
            if sender.send(harvest).is_err() {
                warn!("Profile store closed, dropping {}", identifier);
            }
        })
    }

    /// Wait for every queued profile to be written.
    ///
    /// Every callback obtained from [`ProfileStore::sink`] must be dropped first,
    /// otherwise this never returns.
    pub async fn finish(self) -> Result<StoreSummary> {
        drop(self.sender);
        self.writer.await.context("profile writer task failed")
    }
}

/// Directory holding one profile's files.
///
/// Identifiers come from remote data, so anything that is not a single plain
/// path component is refused.
pub fn profile_dir(output_dir: &Path, identifier: &str) -> Result<PathBuf> {
    let component = safe_component(identifier)
        .ok_or_else(|| anyhow!("identifier {:?} is not a valid directory name", identifier))?;
    Ok(output_dir.join(component))
}

fn safe_component(name: &str) -> Option<&str> {
    let unsafe_char = |c: char| matches!(c, '/' | '\\' | '\0') || c.is_control();
    if name.is_empty() || name == "." || name == ".." || name.contains(unsafe_char) {
        None
    } else {
        Some(name)
    }
}

/// Write one profile and its images. Returns the number of images downloaded.
///
/// A failed image download is logged and skipped; failing to write the JSON
/// files fails the profile.
pub async fn write_profile(
    output_dir: &Path,
    client: &Client,
    harvest: &ProfileHarvest,
) -> Result<usize> {
    let dir = profile_dir(output_dir, &harvest.identifier)?;
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let profile_json = serde_json::to_string_pretty(&harvest.profile)?;
    let profile_path = dir.join("profile.json");
    tokio::fs::write(&profile_path, profile_json)
        .await
        .with_context(|| format!("failed to write {}", profile_path.display()))?;

    let downloads: Vec<_> = harvest
        .items
        .iter()
        .map(|item| download_image(client, item, &dir))
        .collect();
    let downloaded = stream::iter(downloads)
        .buffer_unordered(IMAGE_DOWNLOAD_LIMIT)
        .filter_map(|result| async move {
            match result {
                Ok(()) => Some(()),
                Err(e) => {
                    warn!("{:#}", e);
                    None
                }
            }
        })
        .count()
        .await;

    let images_json = serde_json::to_string_pretty(&harvest.items)?;
    let images_path = dir.join("images.json");
    tokio::fs::write(&images_path, images_json)
        .await
        .with_context(|| format!("failed to write {}", images_path.display()))?;

    debug!(
        "Saved {} ({} of {} images)",
        harvest.identifier,
        downloaded,
        harvest.items.len()
    );
    Ok(downloaded)
}

async fn download_image(client: &Client, item: &Item, dir: &Path) -> Result<()> {
    let file_name = safe_component(&item.id)
        .map(|id| format!("{}.jpg", id))
        .ok_or_else(|| anyhow!("image id {:?} is not a valid file name", item.id))?;

    let bytes = client
        .get(&item.src)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("failed to download {}", item.src))?
        .bytes()
        .await
        .with_context(|| format!("failed to read {}", item.src))?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
