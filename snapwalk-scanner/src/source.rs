use crate::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://instagram.com/";

/// One request against the remote profile resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageRequest {
    /// The HTML profile page carrying the embedded data blob.
    Profile { identifier: String },
    /// A JSON page of older media, starting after `max_id`.
    Media { identifier: String, max_id: String },
}

impl PageRequest {
    pub fn profile(identifier: &str) -> Self {
        PageRequest::Profile {
            identifier: identifier.to_string(),
        }
    }

    pub fn media(identifier: &str, max_id: &str) -> Self {
        PageRequest::Media {
            identifier: identifier.to_string(),
            max_id: max_id.to_string(),
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            PageRequest::Profile { identifier } | PageRequest::Media { identifier, .. } => {
                identifier
            }
        }
    }
}

/// Transport for page requests. Returns the raw response body.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String>;
}

/// `PageSource` backed by a pooled reqwest client.
pub struct HttpPageSource {
    client: Client,
    base_url: Url,
}

impl HttpPageSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, 10)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ScanError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("snapwalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Resolve a request against the base URL.
    ///
    /// Identifiers are pushed as path segments, so they are percent-encoded and
    /// can never escape the base path.
    pub fn request_url(&self, request: &PageRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ScanError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(request.identifier());
            if matches!(request, PageRequest::Media { .. }) {
                segments.push("media");
            }
        }
        if let PageRequest::Media { max_id, .. } = request {
            url.query_pairs_mut().append_pair("max_id", max_id);
        }
        Ok(url)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        let url = self.request_url(request)?;
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes in {:?})", url, body.len(), start.elapsed());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[test]
    fn test_profile_url() {
        let source = HttpPageSource::new("http://example.com/").unwrap();
        let url = source.request_url(&PageRequest::profile("alice")).unwrap();
        assert_eq!(url.as_str(), "http://example.com/alice");
    }

    #[test]
    fn test_media_url() {
        let source = HttpPageSource::new("http://example.com").unwrap();
        let url = source
            .request_url(&PageRequest::media("alice", "123_456"))
            .unwrap();
        assert_eq!(url.as_str(), "http://example.com/alice/media?max_id=123_456");
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let source = HttpPageSource::new("http://example.com/mirror/").unwrap();
        let url = source.request_url(&PageRequest::profile("bob")).unwrap();
        assert_eq!(url.as_str(), "http://example.com/mirror/bob");
    }

    #[test]
    fn test_identifier_cannot_escape_base_path() {
        let source = HttpPageSource::new("http://example.com/").unwrap();
        let url = source
            .request_url(&PageRequest::profile("../admin?x=1"))
            .unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(1));
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpPageSource::new("not a url"),
            Err(ScanError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpPageSource::new("mailto:someone@example.com"),
            Err(ScanError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alice/media"))
            .and(query_param("max_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items":[]}"#))
            .mount(&mock_server)
            .await;

        let source = HttpPageSource::new(&mock_server.uri()).unwrap();
        let body = source
            .fetch_page(&PageRequest::media("alice", "42"))
            .await
            .unwrap();
        assert_eq!(body, r#"{"items":[]}"#);
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = HttpPageSource::new(&mock_server.uri()).unwrap();
        let err = source
            .fetch_page(&PageRequest::profile("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::HttpStatus { status: 404, .. }));
    }
}
