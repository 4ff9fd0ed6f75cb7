//! Release and news reconciliation engine.
//!
//! Raw feeds go through [`aggregate_feeds`], then [`filter_release_notes`]
//! decides what an installation sees. Everything here is pure: no network,
//! no clock, no persisted state.

pub mod aggregate;
pub mod article;
pub mod content;
pub mod environment;
pub mod payload;
pub mod release_filter;
pub mod version;
pub mod view;

pub use aggregate::{AggregateOptions, DEFAULT_CONTENT_HOST, aggregate_feeds, gather_feeds};
pub use article::{
    Article, Enclosure, FeedKind, FilterResult, LatestRelease, OnPremRelease, RawArticle, RawFeed,
};
pub use environment::Environment;
pub use payload::ParentFeedPayload;
pub use release_filter::{
    Channel, DEFAULT_RELEASE_THRESHOLD, FilterOptions, filter_release_notes,
    release_title_version,
};
pub use version::{UNKNOWN_VERSION, Version, extract_version, normalize_version};
