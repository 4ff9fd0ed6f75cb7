//! Feed retrieval: the news feeds and the on-prem release catalog over HTTP.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{DEFAULT_CATALOG_URL, DEFAULT_FEED_BASE_URL, FeedClient, SyncError, feed_path};
