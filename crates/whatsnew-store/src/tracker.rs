//! One-time upgrade and new-release notifications.
//!
//! Each activation compares the running version and the latest available
//! release against what was recorded last time, and raises each signal at
//! most once. Only the privileged surface writes state; other surfaces read
//! it and react, which keeps two open surfaces from racing on the same keys.

use futures::join;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use whatsnew_core::view::Tab;
use whatsnew_core::{Article, Channel, FilterResult, UNKNOWN_VERSION, Version};

use crate::state::{HIGHEST_INSTALLED_RELEASE_VERSION, StateStore, last_shown_key};

const RELEASE_TITLE_MARKERS: [&str; 2] = ["Deskpro Release", "Deskpro Horizon Release"];

/// Where the engine is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Surface {
    /// The modal that opens on login. The only surface allowed to write state.
    Modal,
    /// The always-available sidebar view.
    Global,
}

impl Surface {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Modal)
    }
}

/// Inputs for one activation.
#[derive(Debug, Clone, Copy)]
pub struct Activation<'a> {
    /// Version extracted from the environment, as written (`"2025.5"` stays
    /// `"2025.5"` so it matches titles that omit the patch).
    pub current_version: &'a str,
    pub filter_result: &'a FilterResult,
    /// Articles searched for the installed version's release note.
    pub articles: &'a [Article],
    pub channel: Channel,
    pub surface: Surface,
    pub is_demo_account: bool,
}

/// Signals for the caller to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub has_upgrade_release_note: bool,
    /// Release note for the version the installation was upgraded to.
    pub upgrade_release_note: Option<Article>,
    pub has_newer_release: bool,
    /// Switch to the release notes tab and request focus.
    pub focus_release_notes: bool,
}

impl Notification {
    pub fn initial_tab(&self) -> Tab {
        if self.focus_release_notes {
            Tab::ReleaseNotes
        } else {
            Tab::News
        }
    }
}

/// Decides upgrade notifications against an injected [`StateStore`].
pub struct UpgradeTracker<S> {
    store: S,
}

impl<S: StateStore> UpgradeTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one activation.
    ///
    /// Store failures never fail the activation: unreadable slots count as
    /// absent and failed writes are logged, at worst repeating a notification
    /// next time.
    pub async fn activate(&self, act: &Activation<'_>) -> Notification {
        let shown_key = last_shown_key(act.channel);
        let (stored_version, last_shown) = join!(
            self.read(HIGHEST_INSTALLED_RELEASE_VERSION),
            self.read(shown_key)
        );

        let mut notification = Notification::default();
        let mut record_version = None;
        let mut record_shown = None;

        let current = Version::lenient(act.current_version);
        let highest = Version::lenient(stored_version.as_deref().unwrap_or(UNKNOWN_VERSION));
        if current > highest {
            match find_upgrade_note(act.current_version, act.articles) {
                Some(note) => {
                    info!(
                        version = act.current_version,
                        title = %note.title,
                        "installation upgraded since last activation"
                    );
                    notification.has_upgrade_release_note = true;
                    notification.upgrade_release_note = Some(note.clone());
                    record_version = Some(current.to_string());
                }
                None => {
                    info!(
                        version = act.current_version,
                        "upgrade detected but no release note published yet"
                    );
                }
            }
        }

        if let Some(latest) = &act.filter_result.latest_release
            && last_shown.as_deref() != Some(latest.title.as_str())
        {
            info!(title = %latest.title, "newer release available");
            notification.has_newer_release = true;
            record_shown = Some(latest.title.clone());
        }

        if act.surface.is_privileged() {
            join!(
                self.write(HIGHEST_INSTALLED_RELEASE_VERSION, record_version),
                self.write(shown_key, record_shown)
            );
        }

        notification.focus_release_notes = (notification.has_upgrade_release_note
            || notification.has_newer_release)
            && act.surface.is_privileged()
            && !act.is_demo_account;

        notification
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read state, treating as absent");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: Option<String>) {
        let Some(value) = value else {
            return;
        };
        if let Err(e) = self.store.set(key, &value).await {
            warn!(key, error = %e, "failed to persist state");
        }
    }
}

/// Release note whose title names `version` as a whole word.
pub fn find_upgrade_note<'a>(version: &str, articles: &'a [Article]) -> Option<&'a Article> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(version))).ok()?;
    articles.iter().find(|a| {
        a.is_release()
            && RELEASE_TITLE_MARKERS.iter().any(|m| a.title.contains(m))
            && pattern.is_match(&a.title)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LAST_ONPREM_RELEASE_NOTE_TITLE_SHOWN, LAST_RELEASE_NOTE_TITLE_SHOWN, MemoryStore};
    use crate::StoreError;
    use async_trait::async_trait;
    use whatsnew_core::{FeedKind, LatestRelease};

    fn release(title: &str) -> Article {
        Article {
            title: title.into(),
            description: String::new(),
            link: format!("https://example.com/{}", title.replace(' ', "-")),
            published: 0,
            created: 0,
            enclosures: Vec::new(),
            kind: FeedKind::Release,
        }
    }

    fn latest(title: &str, version: &str) -> FilterResult {
        FilterResult {
            filtered_articles: Vec::new(),
            latest_release: Some(LatestRelease {
                title: title.into(),
                version: version.into(),
                url: "https://example.com/latest".into(),
            }),
        }
    }

    fn activation<'a>(
        current_version: &'a str,
        filter_result: &'a FilterResult,
        articles: &'a [Article],
        surface: Surface,
    ) -> Activation<'a> {
        Activation {
            current_version,
            filter_result,
            articles,
            channel: Channel::OnPrem,
            surface,
            is_demo_account: false,
        }
    }

    /// Store whose writes always fail.
    #[derive(Default)]
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl StateStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Other("read-only".into()))
        }
    }

    #[tokio::test]
    async fn upgrade_with_release_note_is_signalled_once() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        tracker
            .store()
            .set(HIGHEST_INSTALLED_RELEASE_VERSION, "2025.4.0")
            .await
            .unwrap();
        let articles = vec![release("Deskpro Release 2025.5.0")];
        let empty = FilterResult::default();
        let act = activation("2025.5.0", &empty, &articles, Surface::Modal);

        let first = tracker.activate(&act).await;
        assert!(first.has_upgrade_release_note);
        assert_eq!(
            first.upgrade_release_note.as_ref().unwrap().title,
            "Deskpro Release 2025.5.0"
        );
        assert!(first.focus_release_notes);
        assert_eq!(first.initial_tab(), Tab::ReleaseNotes);

        let second = tracker.activate(&act).await;
        assert!(!second.has_upgrade_release_note);
        assert!(!second.focus_release_notes);
        assert_eq!(second.initial_tab(), Tab::News);
    }

    #[tokio::test]
    async fn upgrade_without_note_leaves_state_untouched() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        let empty = FilterResult::default();
        let act = activation("2025.5.0", &empty, &[], Surface::Modal);

        let first = tracker.activate(&act).await;
        assert!(!first.has_upgrade_release_note);
        assert!(
            tracker
                .store()
                .get(HIGHEST_INSTALLED_RELEASE_VERSION)
                .await
                .unwrap()
                .is_none()
        );

        // The note is published later and the upgrade is still detected.
        let articles = vec![release("Deskpro Horizon Release 2025.5.0")];
        let act = activation("2025.5.0", &empty, &articles, Surface::Modal);
        assert!(tracker.activate(&act).await.has_upgrade_release_note);
    }

    #[tokio::test]
    async fn upgrade_note_requires_whole_version_word() {
        let articles = vec![
            release("Deskpro Release 2025.5.10"),
            release("Deskpro Update 2025.5.1"),
            release("Deskpro Release 2025.5.1"),
        ];
        let found = find_upgrade_note("2025.5.1", &articles).unwrap();
        assert_eq!(found.title, "Deskpro Release 2025.5.1");
        let longer_minor = vec![release("Deskpro Release 2025.50.0")];
        assert!(find_upgrade_note("2025.5", &longer_minor).is_none());
    }

    #[tokio::test]
    async fn upgrade_note_ignores_news_articles() {
        let mut news = release("Deskpro Release 2025.5.0 webinar");
        news.kind = FeedKind::NewsAgent;
        assert!(find_upgrade_note("2025.5.0", &[news]).is_none());
    }

    #[tokio::test]
    async fn newer_release_is_signalled_once() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        let result = latest("Deskpro Release 2025.6.0", "2025.6.0");
        let act = activation("2025.5.0", &result, &[], Surface::Modal);

        let first = tracker.activate(&act).await;
        assert!(first.has_newer_release);
        assert!(first.focus_release_notes);
        assert_eq!(
            tracker
                .store()
                .get(LAST_ONPREM_RELEASE_NOTE_TITLE_SHOWN)
                .await
                .unwrap()
                .as_deref(),
            Some("Deskpro Release 2025.6.0")
        );

        let second = tracker.activate(&act).await;
        assert!(!second.has_newer_release);
        assert!(!second.focus_release_notes);
    }

    #[tokio::test]
    async fn last_shown_marker_is_channel_scoped() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        tracker
            .store()
            .set(LAST_RELEASE_NOTE_TITLE_SHOWN, "Deskpro Release 2025.6.0")
            .await
            .unwrap();
        let result = latest("Deskpro Release 2025.6.0", "2025.6.0");

        let mut act = activation("2025.5.0", &result, &[], Surface::Modal);
        act.channel = Channel::Cloud;
        assert!(!tracker.activate(&act).await.has_newer_release);

        act.channel = Channel::OnPrem;
        assert!(tracker.activate(&act).await.has_newer_release);
    }

    #[tokio::test]
    async fn secondary_surface_reads_but_never_writes() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        let articles = vec![release("Deskpro Release 2025.5.0")];
        let result = latest("Deskpro Release 2025.6.0", "2025.6.0");
        let act = activation("2025.5.0", &result, &articles, Surface::Global);

        let notification = tracker.activate(&act).await;
        assert!(notification.has_upgrade_release_note);
        assert!(notification.has_newer_release);
        assert!(!notification.focus_release_notes);
        assert!(tracker.store().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn demo_accounts_are_not_focused() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        let result = latest("Deskpro Release 2025.6.0", "2025.6.0");
        let mut act = activation("2025.5.0", &result, &[], Surface::Modal);
        act.is_demo_account = true;

        let notification = tracker.activate(&act).await;
        assert!(notification.has_newer_release);
        assert!(!notification.focus_release_notes);
    }

    #[tokio::test]
    async fn same_or_older_version_is_not_an_upgrade() {
        let tracker = UpgradeTracker::new(MemoryStore::new());
        tracker
            .store()
            .set(HIGHEST_INSTALLED_RELEASE_VERSION, "2025.5")
            .await
            .unwrap();
        let articles = vec![release("Deskpro Release 2025.5.0"), release("Deskpro Release 2025.4.0")];
        let empty = FilterResult::default();

        let same = activation("2025.5.0", &empty, &articles, Surface::Modal);
        assert!(!tracker.activate(&same).await.has_upgrade_release_note);

        let older = activation("2025.4.0", &empty, &articles, Surface::Modal);
        assert!(!tracker.activate(&older).await.has_upgrade_release_note);
    }

    #[tokio::test]
    async fn failed_writes_do_not_block_and_repeat_next_time() {
        let tracker = UpgradeTracker::new(ReadOnlyStore::default());
        let result = latest("Deskpro Release 2025.6.0", "2025.6.0");
        let act = activation("2025.5.0", &result, &[], Surface::Modal);

        assert!(tracker.activate(&act).await.has_newer_release);
        assert!(tracker.activate(&act).await.has_newer_release);
    }

    #[tokio::test]
    async fn records_normalised_version() {
        let store = MemoryStore::new();
        let tracker = UpgradeTracker::new(&store);
        let articles = vec![release("Deskpro Release 2025.5")];
        let empty = FilterResult::default();
        let act = activation("2025.5", &empty, &articles, Surface::Modal);

        assert!(tracker.activate(&act).await.has_upgrade_release_note);
        assert_eq!(
            store.get(HIGHEST_INSTALLED_RELEASE_VERSION).await.unwrap().as_deref(),
            Some("2025.5.0")
        );
    }
}
