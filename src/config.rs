//! Store configuration and per-call overrides.

use crate::error::{Result, StoreError};
use crate::types::{OutputFormat, PathSetting, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Replacement function applied to a matched record.
pub type Transform = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing file. `Disabled` keeps the store in memory only.
    pub path: PathSetting,

    /// Initial content as a JSON array. Takes precedence over loading `path`.
    #[serde(rename = "rawJSON")]
    pub raw_json: Option<String>,

    /// Make `add` update a matching record instead of appending.
    #[serde(rename = "alwaysUpdateFirst")]
    pub always_update_first: bool,

    /// Persist after every mutation.
    pub autoapply: bool,

    /// Layout of the persisted file.
    #[serde(rename = "jsonFormatter")]
    pub json_formatter: OutputFormat,

    /// Reserved. Accepted and ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manipulate: Option<serde_json::Value>,
}

impl StoreConfig {
    /// Configuration backed by the file at `path`.
    pub fn at(path: impl Into<PathSetting>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Configuration seeded from a JSON array string.
    pub fn raw(json: impl Into<String>) -> Self {
        Self {
            raw_json: Some(json.into()),
            ..Default::default()
        }
    }

    /// Parse a configuration document using the external field names.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }
}

/// Overrides for a single call. Unset fields fall back to the store's configuration.
#[derive(Clone, Default)]
pub struct WriteOptions {
    pub autoapply: Option<bool>,
    pub path: Option<PathSetting>,
    pub always_update_first: Option<bool>,
    /// Applied to the existing record when `add` runs in update-first mode.
    pub transform: Option<Transform>,
    /// In update-first mode, match any record holding this value in one of its fields
    /// instead of matching the added record as a whole.
    pub match_value: Option<serde_json::Value>,
}

impl WriteOptions {
    pub fn autoapply(mut self, autoapply: bool) -> Self {
        self.autoapply = Some(autoapply);
        self
    }

    pub fn path(mut self, path: impl Into<PathSetting>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn update_first<F>(mut self, transform: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.always_update_first = Some(true);
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn match_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.match_value = Some(value.into());
        self
    }
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions")
            .field("autoapply", &self.autoapply)
            .field("path", &self.path)
            .field("always_update_first", &self.always_update_first)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("match_value", &self.match_value)
            .finish()
    }
}

/// Configuration in force for one call.
#[derive(Clone)]
pub struct Effective {
    pub autoapply: bool,
    pub path: PathSetting,
    pub always_update_first: bool,
    pub json_formatter: OutputFormat,
    pub transform: Option<Transform>,
    pub match_value: Option<serde_json::Value>,
}

/// Overlay call-site options onto the instance configuration. Call-site values win.
///
/// Defaults are not a separate input: every `StoreConfig` field is already
/// filled, from `StoreConfig::default()` unless set, so the instance
/// configuration carries them.
pub fn merge(config: &StoreConfig, options: &WriteOptions) -> Effective {
    Effective {
        autoapply: options.autoapply.unwrap_or(config.autoapply),
        path: options.path.clone().unwrap_or_else(|| config.path.clone()),
        always_update_first: options
            .always_update_first
            .unwrap_or(config.always_update_first),
        json_formatter: config.json_formatter,
        transform: options.transform.clone(),
        match_value: options.match_value.clone(),
    }
}
