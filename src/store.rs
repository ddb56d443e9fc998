//! Main DocumentStore struct tying all components together.

use crate::config::{merge, Effective, StoreConfig, WriteOptions};
use crate::error::{Result, StoreError};
use crate::predicate::Predicate;
use crate::types::{Deleted, Lookup, OutputFormat, PathSetting, Record};
use crate::writer::PersistQueue;
use parking_lot::RwLock;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Content written to a fresh or blank backing file.
const EMPTY_ARRAY: &str = "[]";

/// An ordered array of JSON records backed by a single file.
///
/// The in-memory array is the source of truth. The file only reflects it
/// after [`persist`](Self::persist), or after every mutation when
/// `autoapply` is in effect.
pub struct DocumentStore {
    /// Store configuration.
    config: RwLock<StoreConfig>,

    /// The records, in insertion order.
    records: RwLock<Vec<Record>>,

    /// Serializes writes to disk.
    writer: PersistQueue,
}

impl DocumentStore {
    /// Build a store from `config`.
    ///
    /// - `raw_json` set: parse it as the initial records (errors are fatal). If
    ///   `path` is absolute and missing, an empty file is created there.
    /// - only `path` set: load the file, creating or resetting it to `[]` when it
    ///   is missing or blank. Load failures are logged and leave the store empty.
    /// - neither: start empty with persistence disabled.
    pub fn open(mut config: StoreConfig) -> Result<Self> {
        let requested = std::mem::take(&mut config.path);
        config.path = requested.resolved();
        // Raw mode warns from prepare_backing_file.
        if requested != PathSetting::Disabled
            && config.path == PathSetting::Disabled
            && config.raw_json.is_none()
        {
            tracing::warn!(
                "empty path given, persistence is disabled until one is set with set_path"
            );
        }

        let records = match config.raw_json.as_deref() {
            Some(raw) => {
                let records = parse_records(raw)?;
                Self::prepare_backing_file(&config.path)?;
                records
            }
            None => match config.path.as_path() {
                Some(path) => Self::load_file(path),
                None => Vec::new(),
            },
        };

        Ok(Self {
            config: RwLock::new(config),
            records: RwLock::new(records),
            writer: PersistQueue::spawn()?,
        })
    }

    /// Load records from `path`, normalizing a missing or blank file to `[]`.
    fn load_file(path: &Path) -> Vec<Record> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => contents,
            Ok(_) => {
                Self::write_empty(path, "JSON file was empty, initialized as an empty array");
                return Vec::new();
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Self::write_empty(path, "no JSON file existed, initialized as an empty array");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read records");
                return Vec::new();
            }
        };

        match parse_records(&contents) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse records, starting empty"
                );
                Vec::new()
            }
        }
    }

    fn write_empty(path: &Path, notice: &str) {
        match fs::write(path, EMPTY_ARRAY) {
            Ok(()) => tracing::info!(path = %path.display(), "{}", notice),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to initialize file")
            }
        }
    }

    /// Make sure an absolute backing path exists when seeding from raw JSON.
    fn prepare_backing_file(setting: &PathSetting) -> Result<()> {
        let Some(path) = setting.as_path() else {
            tracing::warn!(
                "no valid path given, persistence is disabled until one is set with set_path"
            );
            return Ok(());
        };

        if path.is_absolute() && !path.exists() {
            fs::write(path, EMPTY_ARRAY)?;
            tracing::info!(path = %path.display(), "created empty backing file");
        }
        Ok(())
    }

    // --- Lookup ---

    /// Find the first record matching `predicate`, scanning from index 0.
    ///
    /// The predicate runs while the store is locked and must not call back
    /// into it.
    pub fn lookup(&self, predicate: &Predicate<'_>) -> Lookup {
        let records = self.records.read();
        match scan(&records, predicate) {
            Some(index) => Lookup::found(records[index].clone(), index),
            None => Lookup::not_found(),
        }
    }

    /// Record at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<Record> {
        self.records.read().get(index).cloned()
    }

    // --- Mutations ---

    /// Replace the first record matching `predicate` with `transform(record)`.
    ///
    /// Returns [`Lookup::not_found`] and leaves the store untouched when nothing
    /// matches.
    pub fn update<F>(
        &self,
        predicate: &Predicate<'_>,
        transform: F,
        options: &WriteOptions,
    ) -> Result<Lookup>
    where
        F: FnOnce(Record) -> Record,
    {
        self.try_update(predicate, |record| Ok(transform(record)), options)
    }

    /// Like [`update`](Self::update) with a fallible transform. A transform
    /// error is returned unchanged and the store is not modified.
    pub fn try_update<F>(
        &self,
        predicate: &Predicate<'_>,
        transform: F,
        options: &WriteOptions,
    ) -> Result<Lookup>
    where
        F: FnOnce(Record) -> Result<Record>,
    {
        self.update_or_else(predicate, transform, options, |_| Ok(Lookup::not_found()))
    }

    /// Update the first match, or hand over to `fallback` when nothing matches.
    ///
    /// The predicate and transform run while the store is locked and must not
    /// call back into it. The fallback runs after the lock is released.
    pub fn update_or_else<F, G>(
        &self,
        predicate: &Predicate<'_>,
        transform: F,
        options: &WriteOptions,
        fallback: G,
    ) -> Result<Lookup>
    where
        F: FnOnce(Record) -> Result<Record>,
        G: FnOnce(&Self) -> Result<Lookup>,
    {
        let effective = self.effective(options);

        let updated = {
            let mut records = self.records.write();
            match scan(&records, predicate) {
                Some(index) => {
                    let replacement = transform(records[index].clone())?;
                    records[index] = replacement.clone();
                    Some(Lookup::found(replacement, index))
                }
                None => None,
            }
        };

        match updated {
            Some(lookup) => {
                if effective.autoapply {
                    self.persist_effective(&effective);
                }
                Ok(lookup)
            }
            None => fallback(self),
        }
    }

    /// Append `record` and return it.
    ///
    /// With `always_update_first` in effect, a matching record is transformed
    /// in place instead and nothing is appended. The match is structural
    /// equality with `record`, or any record holding `match_value` in one of
    /// its fields when that option is set. Matching and the update or append
    /// happen under one lock, so concurrent adds of the same record cannot
    /// both append.
    pub fn add(&self, record: Record, options: &WriteOptions) -> Result<Record> {
        let effective = self.effective(options);

        if effective.always_update_first {
            let transform = effective.transform.clone().ok_or_else(|| {
                StoreError::InvalidConfig(
                    "a transform is required when always_update_first is set".to_string(),
                )
            })?;

            let predicate = match &effective.match_value {
                Some(value) => Predicate::has_value(value.clone()),
                None => Predicate::equals(record.clone()),
            };

            {
                let mut records = self.records.write();
                match scan(&records, &predicate) {
                    Some(index) => {
                        let replacement = transform(records[index].clone());
                        records[index] = replacement;
                    }
                    None => records.push(record.clone()),
                }
            }

            if effective.autoapply {
                self.persist_effective(&effective);
            }
            return Ok(record);
        }

        self.append(record.clone(), &effective);
        Ok(record)
    }

    fn append(&self, record: Record, effective: &Effective) {
        self.records.write().push(record);
        if effective.autoapply {
            self.persist_effective(effective);
        }
    }

    /// Remove the first record matching `predicate`.
    ///
    /// Fails with [`StoreError::NoMatch`] when nothing matches. After removal
    /// the predicate is evaluated again; see [`Deleted::recheck`]. The
    /// predicate runs while the store is locked and must not call back into it.
    pub fn delete(&self, predicate: &Predicate<'_>, options: &WriteOptions) -> Result<Deleted> {
        let effective = self.effective(options);

        let deleted = {
            let mut records = self.records.write();
            let index = scan(&records, predicate).ok_or(StoreError::NoMatch)?;
            let record = records.remove(index);
            let recheck = scan(&records, predicate);
            Deleted {
                record,
                index,
                recheck,
            }
        };

        if effective.autoapply {
            self.persist_effective(&effective);
        }
        Ok(deleted)
    }

    // --- Persistence ---

    /// Queue the current records for writing to the effective path.
    ///
    /// Returns without waiting for the write. Missing paths and write
    /// failures are logged, never returned.
    pub fn persist(&self, options: &WriteOptions) {
        let effective = self.effective(options);
        self.persist_effective(&effective);
    }

    /// Block until every persist issued so far has reached disk.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn persist_effective(&self, effective: &Effective) {
        let resolved = effective.path.resolved();
        let Some(path) = resolved.as_path() else {
            tracing::info!(
                "no path to a JSON file is set, nothing persisted; set one with set_path"
            );
            return;
        };

        // Submit under the read lock so queue order follows mutation order.
        let records = self.records.read();
        match effective.json_formatter.render(&records) {
            Ok(contents) => self.writer.submit(path.to_path_buf(), contents),
            Err(e) => tracing::error!(error = %e, "failed to serialize records"),
        }
    }

    fn effective(&self, options: &WriteOptions) -> Effective {
        merge(&self.config.read(), options)
    }

    // --- Accessors ---

    /// Point the store at a new backing file (or disable persistence).
    pub fn set_path(&self, path: impl Into<PathSetting>) {
        let path = path.into().resolved();
        if path == PathSetting::Disabled {
            tracing::warn!("persistence is disabled until a path is set");
        }
        self.config.write().path = path;
    }

    /// Change the on-disk layout used by later persists.
    pub fn set_output_format(&self, format: OutputFormat) {
        self.config.write().json_formatter = format;
    }

    pub fn path(&self) -> PathSetting {
        self.config.read().path.clone()
    }

    pub fn config(&self) -> StoreConfig {
        self.config.read().clone()
    }

    /// Snapshot of all records.
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Index of the first record matching `predicate`.
fn scan(records: &[Record], predicate: &Predicate<'_>) -> Option<usize> {
    if predicate.is_none() {
        return None;
    }
    records.iter().position(|record| predicate.matches(record))
}

/// Parse a JSON document that must be an array.
fn parse_records(raw: &str) -> Result<Vec<Record>> {
    match serde_json::from_str(raw)? {
        Record::Array(records) => Ok(records),
        other => Err(StoreError::Parse(format!(
            "expected a JSON array of records, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Record) -> &'static str {
    match value {
        Record::Null => "null",
        Record::Bool(_) => "a boolean",
        Record::Number(_) => "a number",
        Record::String(_) => "a string",
        Record::Array(_) => "an array",
        Record::Object(_) => "an object",
    }
}
