// Decoding of profile pages and media pages into items

use crate::error::{Result, ScanError};
use crate::result::{Item, ProfileMetadata};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

const SHARED_DATA_MARKER: &str = "window._sharedData";

/// Data pulled out of a profile's HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPage {
    pub profile: ProfileMetadata,
    pub items: Vec<Item>,
    /// Id of the last media entry on the page, if any.
    pub cursor: Option<String>,
}

/// One decoded page of older media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPage {
    pub items: Vec<Item>,
    pub more_available: bool,
    pub cursor: Option<String>,
}

/// Locate the `window._sharedData = {...};` script in a profile page and decode
/// the profile it describes.
pub fn extract_seed_data(body: &str) -> Result<SeedPage> {
    let blob = find_shared_data(body)?.ok_or(ScanError::MissingSharedData)?;
    let data = first_json_value(&blob)?;

    let profile = data
        .pointer("/entry_data/UserProfile/0")
        .filter(|p| p.is_object())
        .ok_or(ScanError::ProfileNotFound)?;
    let raw = RawProfile::deserialize(profile)?;

    let (items, cursor) = into_batch(raw.user_media.unwrap_or_default())?;
    Ok(SeedPage {
        profile: ProfileMetadata(raw.user),
        items,
        cursor,
    })
}

/// Decode a JSON media page. Anything but a JSON object is malformed.
pub fn decode_page(body: &str) -> Result<MediaPage> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ScanError::MalformedPage(e.to_string()))?;
    if !value.is_object() {
        return Err(ScanError::MalformedPage("expected a JSON object".to_string()));
    }
    let raw =
        RawMediaPage::deserialize(&value).map_err(|e| ScanError::MalformedPage(e.to_string()))?;

    let (items, cursor) = into_batch(raw.items.unwrap_or_default())?;
    Ok(MediaPage {
        items,
        more_available: raw.more_available,
        cursor,
    })
}

fn find_shared_data(body: &str) -> Result<Option<String>> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("script")
        .map_err(|e| ScanError::Other(format!("invalid selector: {}", e)))?;

    Ok(document.select(&selector).find_map(|script| {
        let text: String = script.text().collect();
        text.match_indices(SHARED_DATA_MARKER)
            .find_map(|(start, marker)| assigned_value(&text[start + marker.len()..]))
            .map(|value| value.trim().to_string())
    }))
}

// `= value`, but not a `==` comparison.
fn assigned_value(rest: &str) -> Option<&str> {
    let value = rest.trim_start().strip_prefix('=')?;
    if value.starts_with('=') {
        None
    } else {
        Some(value)
    }
}

// Only the first value matters; the trailing `;` and any script after it are ignored.
fn first_json_value(blob: &str) -> Result<Value> {
    match serde_json::Deserializer::from_str(blob)
        .into_iter::<Value>()
        .next()
    {
        Some(value) => Ok(value?),
        None => Err(ScanError::MissingSharedData),
    }
}

fn into_batch(entries: Vec<RawMedia>) -> Result<(Vec<Item>, Option<String>)> {
    let cursor = entries
        .last()
        .map(|media| media.id.to_string())
        .filter(|id| !id.is_empty());

    let mut items = Vec::with_capacity(entries.len());
    for media in entries {
        if let Some(item) = media.into_item()? {
            items.push(item);
        }
    }
    Ok((items, cursor))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => write!(f, "{}", s),
            RawId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    user: Value,
    #[serde(default, rename = "userMedia")]
    user_media: Option<Vec<RawMedia>>,
}

#[derive(Debug, Deserialize)]
struct RawMediaPage {
    #[serde(default)]
    items: Option<Vec<RawMedia>>,
    #[serde(default)]
    more_available: bool,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    id: RawId,
    #[serde(rename = "type", default)]
    kind: String,
    images: Option<RawImages>,
    caption: Option<RawCaption>,
    link: Option<String>,
    likes: Option<RawLikes>,
    comments: Option<RawComments>,
    created_time: Option<RawId>,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    standard_resolution: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawCaption {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLikes {
    #[serde(default)]
    count: u64,
    data: Option<Vec<RawActor>>,
}

#[derive(Debug, Deserialize)]
struct RawComments {
    data: Option<Vec<RawComment>>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    from: Option<RawActor>,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    username: Option<String>,
}

impl RawMedia {
    /// Non-image media yields `None`; it still counts for the page cursor.
    fn into_item(self) -> Result<Option<Item>> {
        if self.kind != "image" {
            return Ok(None);
        }

        let id = self.id.to_string();
        let src = self
            .images
            .and_then(|images| images.standard_resolution)
            .map(|image| image.url)
            .ok_or_else(|| {
                ScanError::MalformedPage(format!("image {} has no standard resolution url", id))
            })?;

        let (likes, liked_by) = match self.likes {
            Some(likes) => (
                likes.count,
                likes
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|actor| actor.username)
                    .collect(),
            ),
            None => (0, Vec::new()),
        };
        let commented_by = self
            .comments
            .and_then(|comments| comments.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|comment| comment.from.and_then(|actor| actor.username))
            .collect();

        Ok(Some(Item {
            id,
            src,
            caption: self.caption.and_then(|caption| caption.text),
            link: self.link.unwrap_or_default(),
            likes,
            created: self
                .created_time
                .map(|created| created.to_string())
                .unwrap_or_default(),
            liked_by,
            commented_by,
        }))
    }
}
