//! Storage layer
//!
//! Handles the library artifact on disk.
//!
//! ## Layout
//!
//! - **document**: JSON shape handling, legacy formats, load diagnostics
//! - **persistence**: reading and writing `library.json`
//! - **error**: typed I/O errors with recovery suggestions

pub mod document;
pub mod error;
pub mod persistence;

pub use document::{DocumentShape, LoadDiagnostic, LoadOutcome};
pub use error::{StorageError, StorageResult};
pub use persistence::{LibraryPersistence, StorageStats};
