//! Release note eligibility.
//!
//! Decides which release notes an installation should see and whether a newer
//! deployable release exists. Non-release articles always pass through.
//!
//! # Rules, applied in order to each release article
//!
//! 1. Title must read `Deskpro Release <v>` or `Deskpro Horizon Release <v>`
//!    where `<v>` is `YYYY.N` or `YYYY.N.N`.
//! 2. The normalised version must be strictly valid.
//! 3. Versions below the threshold are never shown.
//! 4. Notes published more than a year before `now` are dropped.
//! 5. Versions at or below the installed version are kept. Newer versions are
//!    never kept; on-prem installations may get one of them back as the
//!    latest release, but only when a package exists for its `major.minor`.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::article::{Article, FilterResult, LatestRelease, OnPremRelease};
use crate::version::{Version, normalize_version};

/// Earliest version whose release notes are shown at all.
pub const DEFAULT_RELEASE_THRESHOLD: &str = "2025.3.0";

static RELEASE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Deskpro (?:Horizon )?Release (?P<version>[0-9]{4}\.[0-9]+(?:\.[0-9]+)?)")
        .expect("valid release title regex")
});

/// How an installation receives upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Upgraded automatically, so no advance notice is given.
    Cloud,
    /// Upgraded by the customer once a package is published.
    OnPrem,
}

impl Channel {
    pub fn from_is_cloud(is_cloud: bool) -> Self {
        if is_cloud { Self::Cloud } else { Self::OnPrem }
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, Self::Cloud)
    }
}

/// Filter settings. `now` is always supplied by the caller.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub release_threshold: String,
    pub now: DateTime<Utc>,
}

impl FilterOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            release_threshold: DEFAULT_RELEASE_THRESHOLD.to_string(),
            now,
        }
    }

    pub fn with_threshold(mut self, threshold: impl Into<String>) -> Self {
        self.release_threshold = threshold.into();
        self
    }
}

/// Outcome for a single article.
enum Verdict {
    Keep,
    Drop(&'static str),
    Newer(Version, String),
}

/// Extract the version from a well-formed release title, normalised.
///
/// Returns `None` for titles that do not follow the release naming pattern.
pub fn release_title_version(title: &str) -> Option<String> {
    RELEASE_TITLE
        .captures(title)
        .and_then(|caps| caps.name("version"))
        .map(|m| normalize_version(m.as_str()))
}

/// Filter articles for an installation running `current_version`.
///
/// The result keeps input order. At most one newer release is reported, and
/// only for on-prem installations: the greatest eligible version wins no
/// matter where it appears in `articles`.
pub fn filter_release_notes(
    current_version: &str,
    articles: &[Article],
    onprem_releases: &[OnPremRelease],
    channel: Channel,
    opts: &FilterOptions,
) -> FilterResult {
    let current = Version::lenient(current_version);
    let threshold = Version::lenient(&opts.release_threshold);
    let cutoff_ms = one_year_before(opts.now).timestamp_millis();
    let deployable = deployable_lines(onprem_releases);

    let mut filtered_articles = Vec::new();
    let mut latest: Option<(Version, LatestRelease)> = None;

    for article in articles {
        match classify(article, &current, &threshold, cutoff_ms) {
            Verdict::Keep => filtered_articles.push(article.clone()),
            Verdict::Drop(reason) => {
                debug!(title = %article.title, reason, "dropping release note");
            }
            Verdict::Newer(version, normalized) => {
                if channel.is_cloud() {
                    continue;
                }
                if !deployable.contains(&version.major_minor()) {
                    debug!(
                        title = %article.title,
                        version = %normalized,
                        "no on-prem package for release line"
                    );
                    continue;
                }
                let is_greater = latest.as_ref().is_none_or(|(best, _)| version > *best);
                if is_greater {
                    latest = Some((
                        version,
                        LatestRelease {
                            title: article.title.clone(),
                            version: normalized,
                            url: article.link.clone(),
                        },
                    ));
                }
            }
        }
    }

    FilterResult {
        filtered_articles,
        latest_release: latest.map(|(_, release)| release),
    }
}

fn classify(article: &Article, current: &Version, threshold: &Version, cutoff_ms: i64) -> Verdict {
    if !article.is_release() {
        return Verdict::Keep;
    }
    let Some(normalized) = release_title_version(&article.title) else {
        return Verdict::Drop("malformed title");
    };
    let Some(version) = Version::parse(&normalized) else {
        return Verdict::Drop("invalid version");
    };
    if version < *threshold {
        return Verdict::Drop("below threshold");
    }
    if article.published < cutoff_ms {
        return Verdict::Drop("older than a year");
    }
    if version > *current {
        return Verdict::Newer(version, normalized);
    }
    Verdict::Keep
}

/// Same instant one calendar year earlier. A leap day rolls forward to
/// 1 March instead of clamping to 28 February.
fn one_year_before(now: DateTime<Utc>) -> DateTime<Utc> {
    let year = now.year() - 1;
    now.with_year(year)
        .or_else(|| {
            now.checked_sub_days(Days::new(1))
                .and_then(|eve| eve.with_year(year))
                .and_then(|eve| eve.checked_add_days(Days::new(1)))
        })
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `major.minor` pairs that have a published on-prem package.
fn deployable_lines(releases: &[OnPremRelease]) -> HashSet<(u64, u64)> {
    releases
        .iter()
        .filter_map(|r| Version::parse(&normalize_version(&r.version)))
        .map(|v| v.major_minor())
        .collect()
}
