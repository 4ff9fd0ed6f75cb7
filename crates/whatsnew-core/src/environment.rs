//! The installation the engine is running for.

use serde::{Deserialize, Serialize};

use crate::release_filter::Channel;
use crate::version::{extract_version, normalize_version};

/// Facts about the current installation and user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Version string as reported by the host, e.g. `"2025.9.97"` or
    /// `"Deskpro v2025.9.97-abcdef"`.
    pub raw_version: String,
    /// Epoch seconds of the running build, if known.
    #[serde(default)]
    pub build_time: Option<i64>,
    pub channel: Channel,
    #[serde(default)]
    pub is_demo_account: bool,
    /// Administrators also receive the admin news feed.
    #[serde(default)]
    pub is_admin: bool,
}

impl Environment {
    pub fn new(raw_version: impl Into<String>, channel: Channel) -> Self {
        Self {
            raw_version: raw_version.into(),
            build_time: None,
            channel,
            is_demo_account: false,
            is_admin: false,
        }
    }

    /// First version-looking substring of the raw version, as written.
    pub fn extracted_version(&self) -> String {
        extract_version(&self.raw_version)
    }

    /// The installed version, normalised for comparisons.
    pub fn current_version(&self) -> String {
        normalize_version(&self.extracted_version())
    }
}
