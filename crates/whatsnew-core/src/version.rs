//! Version normalisation, extraction and comparison.
//!
//! Release versions are calendar-style dotted numbers ("2025.3.0",
//! "2025.10"). Everything here works on plain strings so that an unknown or
//! malformed version degrades to the sentinel [`UNKNOWN_VERSION`], which loses
//! every "greater than" comparison.
//!
//! # Comparison
//!
//! [`Version`] compares segment by segment as non-negative integers, with
//! missing trailing segments treated as `0`, so `2025.3` == `2025.3.0` and
//! `3.1.4.5` > `3.1.4`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Canonical sentinel for an invalid or unknown version.
pub const UNKNOWN_VERSION: &str = "0.0.0";

const MIN_SEGMENTS: usize = 3;

/// First `x.y.z` or `x.y`, optionally prefixed with `v`.
static SEMANTIC_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v?([0-9]+\.[0-9]+\.[0-9]+|[0-9]+\.[0-9]+)").expect("valid semantic version regex")
});

/// Normalise a version string to at least three dot-separated segments.
///
/// Input must be empty or a sequence of dot-separated ASCII digit runs; any
/// other content yields `"0.0.0"`. Segments are padded with `"0"` up to three
/// and never truncated. This is a string operation, so leading zeros survive:
///
/// - `"2"` → `"2.0.0"`
/// - `"3.1.4.5"` → `"3.1.4.5"`
/// - `"01.2"` → `"01.2.0"`
/// - `"Releases 01.2"` → `"0.0.0"`
pub fn normalize_version(input: &str) -> String {
    if input.is_empty() {
        return UNKNOWN_VERSION.to_string();
    }

    let mut segments: Vec<&str> = input.split('.').collect();
    let well_formed = segments
        .iter()
        .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return UNKNOWN_VERSION.to_string();
    }

    while segments.len() < MIN_SEGMENTS {
        segments.push("0");
    }
    segments.join(".")
}

/// Extract the first version-looking substring (`x.y.z` or `x.y`) from text.
///
/// A leading `v` is dropped. Only the first match counts, so callers must not
/// assume the result is the highest version mentioned. Returns `"0.0.0"` when
/// nothing matches, including for a bare integer.
pub fn extract_version(text: &str) -> String {
    SEMANTIC_VERSION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

/// A dotted numeric version compared as an integer tuple.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    /// Parse a strictly valid version: non-empty digit segments without
    /// leading zeros (a lone `0` is fine). Any number of segments is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            if part.len() > 1 && part.starts_with('0') {
                return None;
            }
            segments.push(part.parse().ok()?);
        }
        Some(Self { segments })
    }

    /// Parse any string, falling back to `0.0.0` for anything that does not
    /// normalise. Leading zeros are tolerated and read numerically.
    pub fn lenient(s: &str) -> Self {
        let normalized = normalize_version(s);
        let segments: Option<Vec<u64>> = normalized.split('.').map(|p| p.parse().ok()).collect();
        match segments {
            Some(segments) => Self { segments },
            None => Self::unknown(),
        }
    }

    /// The `0.0.0` sentinel.
    pub fn unknown() -> Self {
        Self {
            segments: vec![0; MIN_SEGMENTS],
        }
    }

    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    /// The `(major, minor)` pair used to match deployable release lines.
    pub fn major_minor(&self) -> (u64, u64) {
        (self.major(), self.minor())
    }

    fn segment(&self, idx: usize) -> u64 {
        self.segments.get(idx).copied().unwrap_or(0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}
