//! HTTP client for the help centre news feeds and the on-prem release catalog.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};
use whatsnew_core::{FeedKind, OnPremRelease, RawArticle, RawFeed, gather_feeds};

/// Help centre serving the news feeds.
pub const DEFAULT_FEED_BASE_URL: &str = "https://support.deskpro.com";

/// Public list of deployable on-prem packages.
pub const DEFAULT_CATALOG_URL: &str = "https://get.deskpro.com/onprem.json";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the JSON rendition of each feed.
pub fn feed_path(kind: FeedKind) -> &'static str {
    match kind {
        FeedKind::NewsAgent => "/en/news/product-agent.json",
        FeedKind::NewsAdmin => "/en/news/product-admin.json",
        FeedKind::Release => "/en/news/deskpro-releases.json",
    }
}

#[derive(Deserialize)]
struct FeedDocument {
    #[serde(default)]
    items: Vec<RawArticle>,
}

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    releases: Vec<OnPremRelease>,
}

/// Fetches feeds and the release catalog.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    catalog_url: String,
}

impl FeedClient {
    /// Create a client for the given help centre base URL.
    ///
    /// `base_url` should be like `https://support.deskpro.com` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }

    pub fn with_catalog_url(mut self, catalog_url: String) -> Self {
        self.catalog_url = catalog_url;
        self
    }

    /// Fetch one feed and tag it with its kind.
    pub async fn fetch_feed(&self, kind: FeedKind) -> Result<RawFeed, SyncError> {
        let url = format!("{}{}", self.base_url, feed_path(kind));
        info!(url = %url, kind = kind.as_str(), "fetching feed");
        let doc: FeedDocument = self.get_json(&url).await?;
        info!(count = doc.items.len(), kind = kind.as_str(), "fetched feed");
        Ok(RawFeed::new(kind, doc.items))
    }

    /// Fetch the agent and release feeds, plus the admin feed for
    /// administrators, concurrently. Failed or empty feeds come back as `None`.
    pub async fn fetch_feeds(&self, include_admin: bool) -> Vec<Option<RawFeed>> {
        let mut kinds = vec![FeedKind::NewsAgent, FeedKind::Release];
        if include_admin {
            kinds.push(FeedKind::NewsAdmin);
        }
        gather_feeds(kinds.into_iter().map(|kind| self.fetch_feed(kind))).await
    }

    /// Fetch the on-prem release catalog.
    ///
    /// Any failure yields an empty catalog, so on-prem users simply get no
    /// advance notice of new releases.
    pub async fn fetch_onprem_releases(&self) -> Vec<OnPremRelease> {
        match self.get_json::<CatalogDocument>(&self.catalog_url).await {
            Ok(doc) => {
                info!(count = doc.releases.len(), "fetched on-prem release catalog");
                doc.releases
            }
            Err(e) => {
                warn!(url = %self.catalog_url, error = %e, "release catalog unavailable");
                Vec::new()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SyncError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "description": "<p>Details</p>",
            "link": "https://support.deskpro.com/en/news/posts/1",
            "published": 1_745_000_000_000i64,
            "created": 1_745_000_000_000i64
        })
    }

    async fn mount_feed(server: &MockServer, kind: FeedKind, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(feed_path(kind)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = FeedClient::new("https://support.deskpro.com/".into());
        assert_eq!(client.base_url, "https://support.deskpro.com");
    }

    #[tokio::test]
    async fn fetch_feed_tags_kind() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            FeedKind::Release,
            json!({"items": [item("Deskpro Release 2025.4.0")]}),
        )
        .await;

        let client = FeedClient::new(server.uri());
        let feed = client.fetch_feed(FeedKind::Release).await.unwrap();
        assert_eq!(feed.kind, FeedKind::Release);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Deskpro Release 2025.4.0");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(feed_path(FeedKind::NewsAgent)))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = FeedClient::new(server.uri());
        let err = client.fetch_feed(FeedKind::NewsAgent).await.unwrap_err();
        assert!(matches!(err, SyncError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(feed_path(FeedKind::NewsAgent)))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
            .mount(&server)
            .await;

        let client = FeedClient::new(server.uri());
        let err = client.fetch_feed(FeedKind::NewsAgent).await.unwrap_err();
        assert!(matches!(err, SyncError::Json(_)));
    }

    #[tokio::test]
    async fn fetch_feeds_tolerates_partial_failure() {
        let server = MockServer::start().await;
        mount_feed(&server, FeedKind::NewsAgent, json!({"items": [item("Agent tip")]})).await;
        mount_feed(&server, FeedKind::NewsAdmin, json!({"items": []})).await;
        // Release feed is not mounted, so it 404s.

        let client = FeedClient::new(server.uri());
        let feeds = client.fetch_feeds(true).await;
        assert_eq!(feeds.len(), 3);
        assert!(feeds[0].is_some());
        assert!(feeds[1].is_none());
        assert!(feeds[2].is_none());
    }

    #[tokio::test]
    async fn admin_feed_only_for_admins() {
        let server = MockServer::start().await;
        mount_feed(&server, FeedKind::NewsAdmin, json!({"items": [item("Admin tip")]})).await;

        let client = FeedClient::new(server.uri());
        let feeds = client.fetch_feeds(false).await;
        assert_eq!(feeds.len(), 2);
        assert!(feeds.iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn catalog_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onprem.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "releases": [
                    {"version": "2025.4.2", "docker_tag": "2025.4.2-1", "date": "2025-04-20"},
                    {"version": "2025.3.9", "docker_tag": "2025.3.9-1", "date": "2025-03-28"}
                ]
            })))
            .mount(&server)
            .await;

        let client = FeedClient::new(server.uri())
            .with_catalog_url(format!("{}/onprem.json", server.uri()));
        let releases = client.fetch_onprem_releases().await;
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].version, "2025.4.2");
    }

    #[tokio::test]
    async fn catalog_failure_is_empty() {
        let server = MockServer::start().await;
        let client = FeedClient::new(server.uri())
            .with_catalog_url(format!("{}/onprem.json", server.uri()));
        assert!(client.fetch_onprem_releases().await.is_empty());
    }
}
