//! Core types for the document store.

use crate::path::normalize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single stored record. Any JSON value is accepted.
pub type Record = serde_json::Value;

/// Result of scanning the store for a record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lookup {
    /// The matched record, if any.
    pub record: Option<Record>,
    /// Position of the match. Only valid until the next mutation.
    pub index: Option<usize>,
}

impl Lookup {
    /// The "nothing matched" result.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub(crate) fn found(record: Record, index: usize) -> Self {
        Self {
            record: Some(record),
            index: Some(index),
        }
    }

    pub fn is_found(&self) -> bool {
        self.index.is_some()
    }

    /// Index with `-1` standing in for "not found".
    pub fn signed_index(&self) -> i64 {
        signed(self.index)
    }
}

/// Result of a delete.
#[derive(Clone, Debug, PartialEq)]
pub struct Deleted {
    /// The record that was removed.
    pub record: Record,
    /// Index the removed record occupied.
    pub index: usize,
    /// Where the predicate matches after removal, if anywhere.
    pub recheck: Option<usize>,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Index checked again. Object at index {}.",
            signed(self.recheck)
        )
    }
}

fn signed(index: Option<usize>) -> i64 {
    index.map_or(-1, |i| i as i64)
}

/// How the record array is laid out on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Two-space indented.
    #[default]
    #[serde(rename = "prettify")]
    Pretty,
    /// No extraneous whitespace.
    #[serde(rename = "compressed")]
    Compact,
}

impl OutputFormat {
    pub(crate) fn render(self, records: &[Record]) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(records),
            OutputFormat::Compact => serde_json::to_string(records),
        }
    }
}

/// Backing file location, or the explicit "no persistence" marker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PathSetting {
    #[default]
    Disabled,
    File(PathBuf),
}

impl PathSetting {
    /// File setting for `path`. An empty path is not a location and maps to `Disabled`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            PathSetting::Disabled
        } else {
            PathSetting::File(path)
        }
    }

    /// Normalized form of this setting, as used for file work.
    pub fn resolved(&self) -> Self {
        match self {
            PathSetting::Disabled => PathSetting::Disabled,
            PathSetting::File(path) => PathSetting::file(normalize(path)),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            PathSetting::Disabled => None,
            PathSetting::File(path) => Some(path),
        }
    }
}

impl From<PathBuf> for PathSetting {
    fn from(path: PathBuf) -> Self {
        PathSetting::file(path)
    }
}

impl From<&Path> for PathSetting {
    fn from(path: &Path) -> Self {
        PathSetting::file(path)
    }
}

impl From<&str> for PathSetting {
    fn from(path: &str) -> Self {
        PathSetting::file(path)
    }
}

impl From<String> for PathSetting {
    fn from(path: String) -> Self {
        PathSetting::file(path)
    }
}

impl From<Option<PathBuf>> for PathSetting {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(PathSetting::Disabled, PathSetting::file)
    }
}

/// On the wire a path is a string; `false`, `null` and `""` mean disabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPath {
    Path(PathBuf),
    Flag(bool),
    Null(()),
}

impl<'de> Deserialize<'de> for PathSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawPath::deserialize(deserializer)? {
            RawPath::Path(path) => Ok(PathSetting::file(path)),
            RawPath::Null(()) | RawPath::Flag(false) => Ok(PathSetting::Disabled),
            RawPath::Flag(true) => Err(serde::de::Error::custom(
                "`path` must be a string or false",
            )),
        }
    }
}

impl Serialize for PathSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSetting::Disabled => serializer.serialize_bool(false),
            PathSetting::File(path) => path.serialize(serializer),
        }
    }
}
