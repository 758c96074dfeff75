//! Shelf Core Library
//!
//! This crate provides the core functionality for Shelf, a single-user
//! catalog of personal books with named collections and a reading list.
//!
//! # Architecture
//!
//! - **library.json**: Source of truth, rewritten after every change
//!
//! All queries are served directly from the in-memory `Library`.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add a book
//! let book = store.add_book(NewBook::new("Dune", "Frank Herbert"))?;
//!
//! // Queue it
//! store.add_to_reading_list(&book.id)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Books, ids, and the library aggregate
//! - `index`: Collections and the reading list
//! - `query`: Browsing, sorting, and search
//! - `stats`: Library statistics
//! - `storage`: Library document format and file persistence
//! - `backup`: Timestamped backups and restore
//! - `transfer`: CSV and JSON import/export
//! - `config`: Application configuration

pub mod backup;
pub mod config;
pub mod index;
pub mod models;
pub mod query;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transfer;

pub use backup::{BackupInfo, BackupManager, RestoreError, RestoreResult};
pub use config::{Config, WriteMode};
pub use index::IndexError;
pub use models::{new_book, normalize_book, Book, BookId, Library, NewBook, ValidationError};
pub use query::{MatchType, ReadFilter, SearchField, SearchQuery, SortKey, SortOrder};
pub use stats::LibraryStats;
pub use storage::{LoadDiagnostic, LoadOutcome, StorageError, StorageStats};
pub use store::{ImportSummary, Store};
pub use transfer::{Format, ImportBatch, TransferError};
