//! # Document Store
//!
//! A minimal embedded store that keeps an ordered array of JSON records in
//! memory and persists it to a single flat file.
//!
//! ## Core Concepts
//!
//! - **Records**: Arbitrary JSON values, addressed only by position
//! - **Predicates**: Caller-supplied tests selecting the first matching record
//! - **Persistence**: Fire-and-forget writes through a single background writer
//!
//! ## Example
//!
//! ```no_run
//! use docstore::{DocumentStore, Predicate, StoreConfig, WriteOptions};
//! use serde_json::json;
//!
//! let store = DocumentStore::open(StoreConfig::at("./inventory.json"))?;
//!
//! store.add(json!({"sku": "A-1", "qty": 10}), &WriteOptions::default())?;
//!
//! store.update(
//!     &Predicate::field_eq("sku", "A-1"),
//!     |mut item| {
//!         item["qty"] = json!(7);
//!         item
//!     },
//!     &WriteOptions::default(),
//! )?;
//!
//! store.persist(&WriteOptions::default());
//! store.flush();
//! # Ok::<(), docstore::StoreError>(())
//! ```

pub mod config;
pub mod error;
pub mod path;
pub mod predicate;
pub mod store;
pub mod types;
pub mod writer;

// Re-exports
pub use config::{merge, Effective, StoreConfig, Transform, WriteOptions};
pub use error::{Result, StoreError};
pub use predicate::Predicate;
pub use store::DocumentStore;
pub use types::*;
pub use writer::PersistQueue;
