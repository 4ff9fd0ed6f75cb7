//! Feed aggregation: merge independently fetched feeds into one article list.
//!
//! Every source is optional. A failed or empty fetch contributes nothing and
//! never aborts the pass.

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, NaiveDate};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::article::{Article, RawFeed};
use crate::content::{decode_entities, prepare_description};

/// Host that root-relative article references are resolved against.
pub const DEFAULT_CONTENT_HOST: &str = "https://support.deskpro.com";

/// Settings for one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub content_host: String,
    /// Build timestamp in epoch seconds. When set (and positive), articles
    /// published after the build day are hidden.
    pub build_time: Option<i64>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            content_host: DEFAULT_CONTENT_HOST.to_string(),
            build_time: None,
        }
    }
}

impl AggregateOptions {
    pub fn with_build_time(mut self, build_time: Option<i64>) -> Self {
        self.build_time = build_time;
        self
    }

    pub fn with_content_host(mut self, host: impl Into<String>) -> Self {
        self.content_host = host.into();
        self
    }
}

/// Await all feed fetches together.
///
/// Each fetch resolves independently: an error is logged and becomes `None`
/// without affecting the others. A feed with no items is also `None`.
pub async fn gather_feeds<I, F, E>(fetches: I) -> Vec<Option<RawFeed>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<RawFeed, E>>,
    E: Display,
{
    join_all(fetches)
        .await
        .into_iter()
        .map(|result| match result {
            Ok(feed) if feed.items.is_empty() => {
                debug!(kind = feed.kind.as_str(), "feed returned no items");
                None
            }
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!(error = %e, "feed fetch failed");
                None
            }
        })
        .collect()
}

/// Merge feeds into one decoded, tagged list sorted by `created`, newest first.
pub fn aggregate_feeds<I>(feeds: I, opts: &AggregateOptions) -> Vec<Article>
where
    I: IntoIterator<Item = Option<RawFeed>>,
{
    let mut articles: Vec<Article> = feeds
        .into_iter()
        .flatten()
        .flat_map(|feed| {
            let kind = feed.kind;
            feed.items.into_iter().map(move |item| Article {
                title: decode_entities(&item.title),
                description: prepare_description(&item.description, &opts.content_host),
                link: item.link,
                published: item.published,
                created: item.created,
                enclosures: item.enclosures.unwrap_or_default(),
                kind,
            })
        })
        .collect();

    if let Some(build_day) = opts.build_time.filter(|t| *t > 0).and_then(day_of_build) {
        let before = articles.len();
        articles.retain(|a| published_day(a.published).is_some_and(|day| day <= build_day));
        if articles.len() < before {
            info!(
                hidden = before - articles.len(),
                %build_day,
                "hid articles published after the build"
            );
        }
    }

    articles.sort_by(|a, b| b.created.cmp(&a.created));
    articles
}

fn day_of_build(build_time_secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(build_time_secs, 0).map(|dt| dt.date_naive())
}

fn published_day(published_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(published_ms).map(|dt| dt.date_naive())
}
