// Fixtures shared by the unit tests in this crate

use crate::error::{Result, ScanError};
use crate::source::{PageRequest, PageSource};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn image(id: &str, likers: &[&str], commenters: &[&str]) -> Value {
    json!({
        "id": id,
        "type": "image",
        "images": {"standard_resolution": {"url": format!("http://cdn.example.com/{}.jpg", id)}},
        "caption": {"text": format!("caption {}", id)},
        "link": format!("http://example.com/p/{}", id),
        "likes": {
            "count": likers.len(),
            "data": likers.iter().map(|u| json!({"username": u})).collect::<Vec<_>>()
        },
        "comments": {
            "data": commenters.iter().map(|u| json!({"from": {"username": u}})).collect::<Vec<_>>()
        },
        "created_time": "1400000000"
    })
}

pub(crate) fn video(id: &str) -> Value {
    json!({
        "id": id,
        "type": "video",
        "link": format!("http://example.com/p/{}", id),
        "likes": {"count": 0, "data": [{"username": "video_fan"}]},
        "created_time": "1400000001"
    })
}

pub(crate) fn profile_page(user: Value, media: Vec<Value>) -> String {
    let shared = json!({"entry_data": {"UserProfile": [{"user": user, "userMedia": media}]}});
    format!(
        r#"<!DOCTYPE html><html><head><title>profile</title>
<script type="text/javascript">window._sharedData = {};</script>
</head><body></body></html>"#,
        shared
    )
}

pub(crate) fn media_page(media: Vec<Value>, more_available: bool) -> String {
    json!({"items": media, "more_available": more_available}).to_string()
}

/// Canned responses keyed by request. A `None` body simulates a transport failure;
/// unknown requests answer 404.
#[derive(Default)]
pub(crate) struct FakeSource {
    pages: HashMap<PageRequest, Option<String>>,
    requests: Mutex<Vec<PageRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_profile(mut self, identifier: &str, media: Vec<Value>) -> Self {
        let body = profile_page(json!({"username": identifier}), media);
        self.pages
            .insert(PageRequest::profile(identifier), Some(body));
        self
    }

    pub(crate) fn with_media(
        mut self,
        identifier: &str,
        max_id: &str,
        media: Vec<Value>,
        more_available: bool,
    ) -> Self {
        self.pages.insert(
            PageRequest::media(identifier, max_id),
            Some(media_page(media, more_available)),
        );
        self
    }

    pub(crate) fn with_body(mut self, request: PageRequest, body: &str) -> Self {
        self.pages.insert(request, Some(body.to_string()));
        self
    }

    pub(crate) fn failing(mut self, request: PageRequest) -> Self {
        self.pages.insert(request, None);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(request) {
            Some(Some(body)) => Ok(body.clone()),
            Some(None) => Err(ScanError::Other(format!(
                "connection reset while fetching {}",
                request.identifier()
            ))),
            None => Err(ScanError::HttpStatus {
                status: 404,
                url: format!("fake://{}", request.identifier()),
            }),
        }
    }
}
