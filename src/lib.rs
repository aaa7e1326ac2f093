//! Personal extracurricular activity tracker.
//!
//! [`ActivityStore`] keeps the activity list in memory and mirrors it to a
//! single JSON blob through a [`BlobStore`] after every change.

pub mod config;
pub mod csv_io;
pub mod error;
pub mod models;
pub mod query;
pub mod report;
pub mod seed;
pub mod storage;
pub mod store;
pub mod validation;

pub use error::{StorageError, StoreError};
pub use models::{Activity, ActivityPatch, Category, CategoryCounts, CategoryFilter, NewActivity, Stats, YearMonth};
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use store::{ActivityStore, CorruptPolicy, StoreOptions};
