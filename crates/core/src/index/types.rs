//! Index data types for notes, changes and search results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A note file known either on disk or in the index.
///
/// `path` is relative to the notebook root and `/`-separated. Sequences of
/// records are always in strictly ascending byte order of `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub modified: DateTime<Utc>,
}

/// Metadata persisted for each indexed note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    /// Path relative to the notebook root, unique.
    pub path: String,
    pub title: String,
    /// First paragraph of the body.
    pub lead: String,
    pub body: String,
    pub word_count: usize,
    /// Hex-encoded SHA-256 of the raw file content.
    pub checksum: String,
    /// Front matter fields.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Set on insertion, never updated.
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Kind of difference between the disk and the index for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// A change detected while reconciling the disk with the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
}

impl Change {
    pub fn added(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: ChangeKind::Added }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: ChangeKind::Modified }
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: ChangeKind::Removed }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.path)
    }
}

/// A search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub metadata: NoteMetadata,
    /// Matched excerpt of the body, empty unless the search had a content filter.
    pub snippet: String,
}

/// Storage representation of timestamps.
///
/// Fixed width with nanoseconds, so text order is time order and a value
/// read back compares equal to the one written.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_round_trip_with_nanoseconds() {
        let time = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let stored = format_timestamp(&time);

        assert_eq!(stored, "2023-11-14T22:13:20.123456789Z");
        assert_eq!(parse_timestamp(&stored).unwrap(), time);
    }

    #[test]
    fn timestamp_text_order_is_time_order() {
        let early = Utc.timestamp_opt(1_700_000_000, 900_000_000).unwrap();
        let late = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
        assert!(format_timestamp(&early) < format_timestamp(&late));
    }

    #[test]
    fn change_display() {
        assert_eq!(Change::removed("a/b.md").to_string(), "removed a/b.md");
    }
}
