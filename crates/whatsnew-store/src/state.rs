//! Key-value contract for per-user notification state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use whatsnew_core::Channel;

use crate::StoreError;

/// Highest installed version the user has been told about.
pub const HIGHEST_INSTALLED_RELEASE_VERSION: &str = "highestInstalledReleaseVersion";

/// Title of the last "new release available" note shown to a cloud user.
pub const LAST_RELEASE_NOTE_TITLE_SHOWN: &str = "lastReleaseNoteTitleShown";

/// Title of the last "new release available" note shown to an on-prem user.
pub const LAST_ONPREM_RELEASE_NOTE_TITLE_SHOWN: &str = "lastOnPremReleaseNoteTitleShown";

/// The channel-scoped "last shown" key.
pub fn last_shown_key(channel: Channel) -> &'static str {
    match channel {
        Channel::Cloud => LAST_RELEASE_NOTE_TITLE_SHOWN,
        Channel::OnPrem => LAST_ONPREM_RELEASE_NOTE_TITLE_SHOWN,
    }
}

/// Persisted string slots scoped to one user by whoever constructs the store.
///
/// No transactional guarantees: a read followed by a write may race with
/// another writer.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: StateStore + ?Sized> StateStore for &S {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}

/// In-process store. State lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every slot, for inspection.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.slots.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
