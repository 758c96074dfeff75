//! Unified storage interface
//!
//! The `Store` owns the one live `Library` of a process and persists it to
//! `library.json` after every command that changes it. Commands that turn out
//! to be no-ops skip the write.
//!
//! When a write fails the in-memory change is kept and the store is marked
//! dirty; the next successful save (or mutating command) writes everything.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;  // Loads existing library or starts empty
//!
//! let book = store.add_book(NewBook::new("Dune", "Frank Herbert"))?;
//! store.create_collection("Favorites")?;
//! store.add_to_collection("Favorites", &book.id)?;
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::backup::{BackupInfo, BackupManager, RestoreError, RestoreResult};
use crate::config::Config;
use crate::index::IndexError;
use crate::models::{new_book, Book, BookId, Library, NewBook};
use crate::storage::{LibraryPersistence, LoadDiagnostic, StorageStats};
use crate::transfer::ImportBatch;

/// What an import added to the library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub books_added: usize,
    /// Imported books whose id was already taken and got a fresh one
    pub ids_reassigned: usize,
    pub collections_merged: usize,
    pub skipped: usize,
}

/// Unified storage interface for Shelf
pub struct Store {
    /// The live library
    library: Library,
    /// Canonical file persistence
    persistence: LibraryPersistence,
    /// Backup handling
    backups: BackupManager,
    /// Problems found when the library was loaded
    diagnostics: Vec<LoadDiagnostic>,
    /// In-memory state differs from disk after a failed write
    dirty: bool,
    /// Configuration
    config: Config,
}

impl Store {
    /// Open the store, loading the library from the configured location
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    ///
    /// A missing library file starts an empty library. A malformed one also
    /// starts empty, with the problem available from `load_diagnostics()`.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = LibraryPersistence::new(config.clone());
        let outcome = persistence
            .load()
            .context("Failed to read library file")?;

        info!(
            "Loaded {} books from {:?}",
            outcome.library.books().len(),
            persistence.path()
        );

        Ok(Self {
            library: outcome.library,
            persistence,
            backups: BackupManager::from_config(&config),
            diagnostics: outcome.diagnostics,
            dirty: false,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The live library
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Problems reported while loading the library file
    pub fn load_diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    /// Whether the last write failed and changes are not yet on disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Get storage statistics
    pub fn storage_stats(&self) -> StorageStats {
        let size = self.persistence.library_size();
        StorageStats {
            library_exists: size.is_some(),
            library_size: size.unwrap_or(0),
            backup_count: self.backups.list_backups().map(|b| b.len()).unwrap_or(0),
        }
    }

    // ==================== Book Operations ====================

    /// Create and add a new book
    pub fn add_book(&mut self, fields: NewBook) -> Result<Book> {
        let book = new_book(fields)?;
        self.library.insert_book(book.clone());
        self.save()?;
        Ok(book)
    }

    /// Replace an existing book's editable fields
    ///
    /// `id` and `date_added` keep their stored values.
    pub fn update_book(&mut self, book: &Book) -> Result<()> {
        book.validate()?;
        let stored = self
            .library
            .book(&book.id)
            .ok_or_else(|| IndexError::BookNotFound(book.id.clone()))?;

        let mut updated = book.clone();
        updated.date_added = stored.date_added.clone();
        updated.set_rating(book.rating);
        self.library.replace_book(updated);
        self.save()
    }

    /// Delete a book
    ///
    /// Collection and reading-list references to it are left in place.
    pub fn delete_book(&mut self, id: &BookId) -> Result<Book> {
        let book = self
            .library
            .remove_book(id)
            .ok_or_else(|| IndexError::BookNotFound(id.clone()))?;
        self.save()?;
        Ok(book)
    }

    /// Get a book by ID
    pub fn get_book(&self, id: &BookId) -> Option<&Book> {
        self.library.book(id)
    }

    /// Get all books
    pub fn books(&self) -> &[Book] {
        self.library.books()
    }

    // ==================== Collection Operations ====================

    /// Create an empty collection
    pub fn create_collection(&mut self, name: &str) -> Result<()> {
        self.library.create_collection(name)?;
        self.save()
    }

    /// Delete a collection; deleting a missing one is a no-op
    pub fn delete_collection(&mut self, name: &str) -> Result<bool> {
        let removed = self.library.delete_collection(name);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Add a book to a collection, returning false if already a member
    pub fn add_to_collection(&mut self, name: &str, id: &BookId) -> Result<bool> {
        self.require_book(id)?;
        let added = self.library.add_to_collection(name, id)?;
        if added {
            self.save()?;
        }
        Ok(added)
    }

    /// Remove a book from a collection, returning whether it was a member
    pub fn remove_from_collection(&mut self, name: &str, id: &BookId) -> Result<bool> {
        let removed = self.library.remove_from_collection(name, id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Remove every collection
    pub fn clear_collections(&mut self) -> Result<()> {
        if self.library.collections().is_empty() {
            return Ok(());
        }
        self.library.clear_collections();
        self.save()
    }

    // ==================== Reading List Operations ====================

    /// Queue an unread book, returning false if it is already on the reading list
    pub fn add_to_reading_list(&mut self, id: &BookId) -> Result<bool> {
        let book = self
            .library
            .book(id)
            .ok_or_else(|| IndexError::BookNotFound(id.clone()))?;
        if book.read {
            return Err(IndexError::AlreadyRead(id.clone()).into());
        }
        if self.library.is_on_reading_list(id) {
            return Ok(false);
        }
        self.library.add_to_reading_list(id.clone());
        self.save()?;
        Ok(true)
    }

    /// Take a book off the reading list, returning whether it was on it
    pub fn remove_from_reading_list(&mut self, id: &BookId) -> Result<bool> {
        let removed = self.library.remove_from_reading_list(id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Mark a book read and take it off the reading list, in one save
    pub fn mark_read(&mut self, id: &BookId) -> Result<()> {
        self.library.mark_read(id)?;
        self.save()
    }

    /// Mark every queued book read and empty the reading list
    pub fn mark_all_read(&mut self) -> Result<usize> {
        if self.library.reading_list().is_empty() {
            return Ok(0);
        }
        let marked = self.library.mark_all_read();
        self.save()?;
        Ok(marked)
    }

    /// Empty the reading list
    pub fn clear_reading_list(&mut self) -> Result<()> {
        if self.library.reading_list().is_empty() {
            return Ok(());
        }
        self.library.clear_reading_list();
        self.save()
    }

    /// Remove all books, collections, and the reading list
    pub fn reset(&mut self) -> Result<()> {
        if self.library.is_empty() {
            return Ok(());
        }
        self.library = Library::new();
        self.save()
    }

    // ==================== Import ====================

    /// Merge imported books and collections into the library
    ///
    /// Imported collections replace same-named ones. Books whose id is
    /// already taken get a fresh id, and the batch's collections follow it.
    pub fn import(&mut self, batch: ImportBatch) -> Result<ImportSummary> {
        let ImportBatch {
            books,
            mut collections,
            skipped,
        } = batch;

        let mut summary = ImportSummary {
            skipped,
            ..ImportSummary::default()
        };

        for book in books {
            if let Some(original) = self.library.insert_book(book) {
                let replacement = self
                    .library
                    .books()
                    .last()
                    .map(|b| b.id.clone())
                    .unwrap_or_else(BookId::generate);
                for members in collections.values_mut() {
                    for member in members.iter_mut().filter(|m| **m == original) {
                        *member = replacement.clone();
                    }
                }
                summary.ids_reassigned += 1;
            }
            summary.books_added += 1;
        }

        summary.collections_merged = collections.len();
        self.library.collections.extend(collections);

        info!(
            "Imported {} books ({} ids reassigned, {} collections)",
            summary.books_added, summary.ids_reassigned, summary.collections_merged
        );
        self.save()?;
        Ok(summary)
    }

    // ==================== Backup & Restore ====================

    /// Write a timestamped backup of the whole library
    pub fn backup(&self) -> Result<PathBuf> {
        self.backups
            .create_backup(&self.library)
            .context("Failed to write backup")
    }

    /// List existing backups, newest first
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        self.backups
            .list_backups()
            .context("Failed to list backups")
    }

    /// Replace the library with the contents of a backup
    ///
    /// The backup is loaded and written to the canonical file before the
    /// live library is swapped, so a failure at any step leaves the current
    /// library untouched.
    pub fn restore(&mut self, path: &Path) -> Result<RestoreResult> {
        let (outcome, result) = BackupManager::read_backup(path)?;

        self.persistence
            .save(&outcome.library)
            .map_err(RestoreError::Commit)?;

        self.library = outcome.library;
        self.dirty = false;
        info!("{} from {:?}", result.summary(), path);
        Ok(result)
    }

    // ==================== Persistence ====================

    /// Write the library to disk
    ///
    /// On failure the in-memory library is kept as is and the store is
    /// marked dirty.
    pub fn save(&mut self) -> Result<()> {
        match self.persistence.save(&self.library) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save library: {}", e);
                self.dirty = true;
                Err(e.into())
            }
        }
    }

    fn require_book(&self, id: &BookId) -> Result<(), IndexError> {
        if self.library.contains_book(id) {
            Ok(())
        } else {
            Err(IndexError::BookNotFound(id.clone()))
        }
    }
}
