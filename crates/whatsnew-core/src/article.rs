//! Feed and release types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Which feed an article came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    /// Product news aimed at agents.
    #[serde(rename = "product-agent")]
    NewsAgent,
    /// Product news aimed at administrators.
    #[serde(rename = "product-admin")]
    NewsAdmin,
    /// Versioned release notes.
    #[serde(rename = "release")]
    Release,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewsAgent => "product-agent",
            Self::NewsAdmin => "product-admin",
            Self::Release => "release",
        }
    }
}

/// Media attached to a feed item. The first one is used as the cover image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A feed item as parsed from the source, before decoding and tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    /// Epoch milliseconds.
    pub published: i64,
    /// Epoch milliseconds.
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosures: Option<Vec<Enclosure>>,
}

/// A successfully fetched and parsed feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeed {
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub items: Vec<RawArticle>,
}

impl RawFeed {
    pub fn new(kind: FeedKind, items: Vec<RawArticle>) -> Self {
        Self { kind, items }
    }
}

/// A decoded article tagged with its feed kind.
///
/// Produced fresh by every aggregation pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Epoch milliseconds.
    pub published: i64,
    /// Epoch milliseconds.
    pub created: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enclosures: Vec<Enclosure>,
    #[serde(rename = "type")]
    pub kind: FeedKind,
}

impl Article {
    pub fn is_release(&self) -> bool {
        self.kind == FeedKind::Release
    }
}

/// A deployable on-prem package from the public release catalog.
///
/// Only `version` takes part in filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnPremRelease {
    pub version: String,
    #[serde(default)]
    pub docker_tag: String,
    #[serde(default)]
    pub date: String,
}

impl OnPremRelease {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            docker_tag: String::new(),
            date: String::new(),
        }
    }
}

/// Pointer to the newest release an on-prem installation could upgrade to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestRelease {
    pub title: String,
    /// Normalised, always greater than the installed version.
    pub version: String,
    pub url: String,
}

/// Output of the release note filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    pub filtered_articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<LatestRelease>,
}
