//! `whatsnew check`: run one activation end to end.
//!
//! Feeds → aggregate → filter → upgrade tracker, with state persisted in a
//! JSON file between runs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;
use whatsnew_core::{
    AggregateOptions, Article, Channel, DEFAULT_CONTENT_HOST, DEFAULT_RELEASE_THRESHOLD,
    Environment, FilterOptions, FilterResult, OnPremRelease, ParentFeedPayload, RawFeed,
    aggregate_feeds, filter_release_notes, gather_feeds,
};
use whatsnew_store::{Activation, JsonFileStore, Notification, Surface, UpgradeTracker};
use whatsnew_sync::{DEFAULT_CATALOG_URL, DEFAULT_FEED_BASE_URL, FeedClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurfaceArg {
    Modal,
    Global,
}

impl From<SurfaceArg> for Surface {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Modal => Surface::Modal,
            SurfaceArg::Global => Surface::Global,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Feed files (JSON `{"type": ..., "items": [...]}`). Unreadable files count as absent feeds.
    #[arg(long = "feed", value_name = "FILE")]
    pub feeds: Vec<PathBuf>,

    /// Fetch feeds and the release catalog over HTTP instead of reading files.
    #[arg(long)]
    pub fetch: bool,

    /// Help centre serving the feeds.
    #[arg(long, env = "WHATSNEW_FEED_BASE_URL", default_value = DEFAULT_FEED_BASE_URL)]
    pub feed_base_url: String,

    /// On-prem release catalog URL, used with --fetch.
    #[arg(long, env = "WHATSNEW_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// On-prem release catalog file (`{"releases": [...]}` or a bare array).
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Installed version as reported by the host.
    #[arg(long = "installed-version", env = "WHATSNEW_VERSION", default_value = "")]
    pub installed_version: String,

    /// Build timestamp in epoch seconds; hides articles newer than the build.
    #[arg(long, env = "WHATSNEW_BUILD_TIME")]
    pub build_time: Option<i64>,

    /// The installation is cloud hosted.
    #[arg(long, env = "WHATSNEW_CLOUD")]
    pub cloud: bool,

    /// The account is a demo account.
    #[arg(long)]
    pub demo: bool,

    /// The current user is an administrator, who also gets the admin news feed.
    #[arg(long)]
    pub admin: bool,

    /// Surface running this activation. Only `modal` persists state.
    #[arg(long, value_enum, default_value_t = SurfaceArg::Modal)]
    pub surface: SurfaceArg,

    /// Per-user state file.
    #[arg(long, env = "WHATSNEW_STATE_FILE", default_value = "whatsnew-state.json")]
    pub state: PathBuf,

    /// Earliest version whose release notes are shown.
    #[arg(long, env = "WHATSNEW_RELEASE_THRESHOLD", default_value = DEFAULT_RELEASE_THRESHOLD)]
    pub threshold: String,

    /// Host for root-relative links in article bodies.
    #[arg(long, env = "WHATSNEW_CONTENT_HOST", default_value = DEFAULT_CONTENT_HOST)]
    pub content_host: String,

    /// Evaluate as of this RFC 3339 instant instead of the current time.
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// App name used in the host payload.
    #[arg(long, default_value = "whats-new")]
    pub app_name: String,

    /// Pages of cards to print, five cards per page.
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Everything one activation decided.
#[derive(Debug, Serialize)]
pub struct Report {
    pub current_version: String,
    pub channel: Channel,
    pub filter: FilterResult,
    pub notification: Notification,
    pub payload: Option<ParentFeedPayload>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Document { releases: Vec<OnPremRelease> },
    List(Vec<OnPremRelease>),
}

pub async fn run_check(args: &CheckArgs) -> anyhow::Result<Report> {
    let env = Environment {
        raw_version: args.installed_version.clone(),
        build_time: args.build_time,
        channel: Channel::from_is_cloud(args.cloud),
        is_demo_account: args.demo,
        is_admin: args.admin,
    };
    let now = args.now.unwrap_or_else(Utc::now);

    let (feeds, catalog) = if args.fetch {
        let client = FeedClient::new(args.feed_base_url.clone())
            .with_catalog_url(args.catalog_url.clone());
        let feeds = client.fetch_feeds(env.is_admin).await;
        let catalog = if env.channel.is_cloud() {
            Vec::new()
        } else {
            client.fetch_onprem_releases().await
        };
        (feeds, catalog)
    } else {
        let feeds = gather_feeds(args.feeds.iter().map(|p| load_feed(p))).await;
        let catalog = match &args.catalog {
            Some(path) => load_catalog(path).await?,
            None => Vec::new(),
        };
        (feeds, catalog)
    };

    let aggregate_opts = AggregateOptions::default()
        .with_content_host(args.content_host.clone())
        .with_build_time(env.build_time);
    let articles = aggregate_feeds(feeds, &aggregate_opts);

    let current_version = env.current_version();
    let filter_opts = FilterOptions::new(now).with_threshold(args.threshold.clone());
    let filter = filter_release_notes(
        &current_version,
        &articles,
        &catalog,
        env.channel,
        &filter_opts,
    );
    info!(
        articles = articles.len(),
        shown = filter.filtered_articles.len(),
        latest = filter.latest_release.as_ref().map(|r| r.version.as_str()),
        "filtered release notes"
    );

    let extracted = env.extracted_version();
    let tracker = UpgradeTracker::new(JsonFileStore::open_persistent(&args.state));
    let notification = tracker
        .activate(&Activation {
            current_version: &extracted,
            filter_result: &filter,
            articles: &filter.filtered_articles,
            channel: env.channel,
            surface: args.surface.into(),
            is_demo_account: env.is_demo_account,
        })
        .await;

    let payload = ParentFeedPayload::build(args.app_name.clone(), &filter.filtered_articles);

    Ok(Report {
        current_version,
        channel: env.channel,
        filter,
        notification,
        payload,
    })
}

async fn load_feed(path: &Path) -> anyhow::Result<RawFeed> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading feed {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing feed {}", path.display()))
}

async fn load_catalog(path: &Path) -> anyhow::Result<Vec<OnPremRelease>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading release catalog {}", path.display()))?;
    let catalog: CatalogFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing release catalog {}", path.display()))?;
    Ok(match catalog {
        CatalogFile::Document { releases } => releases,
        CatalogFile::List(releases) => releases,
    })
}

/// Articles the report shows under its initial tab.
pub fn initial_tab_articles(report: &Report) -> Vec<&Article> {
    report
        .notification
        .initial_tab()
        .select(&report.filter.filtered_articles)
}
