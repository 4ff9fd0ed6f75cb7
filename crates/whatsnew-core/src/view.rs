//! Presentation helpers: tab partitioning, paging, and card metadata.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use crate::article::Article;

/// Cover shown when an article has no enclosure.
pub const DEFAULT_COVER: &str = "/news-app-cover.png";

/// Articles revealed per page.
pub const ITEMS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    News,
    ReleaseNotes,
}

impl Tab {
    pub fn includes(&self, article: &Article) -> bool {
        match self {
            Self::News => !article.is_release(),
            Self::ReleaseNotes => article.is_release(),
        }
    }

    /// Articles shown under this tab, in their original order.
    pub fn select<'a>(&self, articles: &'a [Article]) -> Vec<&'a Article> {
        articles.iter().filter(|a| self.includes(a)).collect()
    }

    /// Message for an empty tab.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::News => "No news article available",
            Self::ReleaseNotes => "No release note found for your installed version",
        }
    }
}

/// Infinite-scroll style paging: reaching the last visible item reveals more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    shown: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            shown: ITEMS_PER_PAGE,
        }
    }
}

impl Paginator {
    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown.min(items.len())]
    }

    /// Whether the item at `idx` is the last slot of the current page.
    pub fn is_last_slot(&self, idx: usize) -> bool {
        idx + 1 == self.shown
    }

    /// Called once the last slot scrolls into view.
    pub fn reveal_more(&mut self) {
        self.shown += ITEMS_PER_PAGE;
    }
}

/// First enclosure URL, or the default cover.
pub fn cover_image(article: &Article) -> &str {
    article
        .enclosures
        .first()
        .map(|e| e.url.as_str())
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_COVER)
}

/// Card date as `("APR 07", 2025)`. Timestamps outside chrono's range yield `None`.
pub fn date_label(published_ms: i64) -> Option<(String, i32)> {
    let dt = DateTime::from_timestamp_millis(published_ms)?;
    Some((dt.format("%b %d").to_string().to_uppercase(), dt.year()))
}
