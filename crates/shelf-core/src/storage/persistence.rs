//! Library file persistence
//!
//! Reads and writes the canonical `library.json`. This is the only code that
//! touches the canonical artifact.
//!
//! By default every save truncates and rewrites the file in place, so a crash
//! mid-write can leave a truncated artifact behind. Setting `atomic_writes`
//! switches to write-temp-then-rename.
//!
//! Storage location: `~/.local/share/shelf/` (configurable via `Config`)

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::document::{self, LoadOutcome};
use super::error::{StorageError, StorageResult};
use crate::config::{Config, WriteMode};
use crate::models::Library;

/// Sizes and presence of the stored files
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    /// Whether the library file exists
    pub library_exists: bool,
    /// Size of the library file in bytes
    pub library_size: u64,
    /// Number of backup files
    pub backup_count: usize,
}

impl StorageStats {
    /// Library size in human-readable form
    pub fn library_size_human(&self) -> String {
        format_size(self.library_size)
    }
}

/// Persistence layer for the canonical library file
pub struct LibraryPersistence {
    config: Config,
}

impl LibraryPersistence {
    /// Create a new persistence handler with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the canonical library file
    pub fn path(&self) -> PathBuf {
        self.config.library_path()
    }

    /// Check if a library file exists on disk
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Read the raw artifact
    ///
    /// Returns `None` if the file doesn't exist.
    pub fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        read_artifact(&self.path())
    }

    /// Load the library
    ///
    /// A missing or malformed file yields an empty library plus diagnostics.
    /// Only an unreadable file is an error.
    pub fn load(&self) -> StorageResult<LoadOutcome> {
        let bytes = self.read()?;
        Ok(document::load(bytes.as_deref()))
    }

    /// Serialize and write the whole library
    pub fn save(&self, library: &Library) -> StorageResult<()> {
        let bytes = document::save(library)?;
        let path = self.path();
        write_artifact(&path, &bytes, self.config.write_mode())?;
        debug!("Saved {} books to {:?}", library.books().len(), path);
        Ok(())
    }

    /// Size of the library file, if present
    pub fn library_size(&self) -> Option<u64> {
        fs::metadata(self.path()).ok().map(|m| m.len())
    }
}

/// Read a file, treating "not found" as absent
pub fn read_artifact(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::from_read_io(e, path.to_path_buf())),
    }
}

/// Write a whole file using the given mode
pub fn write_artifact(path: &Path, data: &[u8], mode: WriteMode) -> StorageResult<()> {
    ensure_parent(path)?;
    match mode {
        WriteMode::Overwrite => overwrite(path, data),
        WriteMode::Atomic => atomic_write(path, data),
    }
}

fn ensure_parent(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Truncate and rewrite in place
fn overwrite(path: &Path, data: &[u8]) -> StorageResult<()> {
    fs::write(path, data).map_err(|e| StorageError::from_io(e, path.to_path_buf()))
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_book, NewBook};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn library_with_book(title: &str) -> Library {
        let mut library = Library::new();
        library.insert_book(new_book(NewBook::new(title, "Author")).unwrap());
        library
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = LibraryPersistence::new(test_config(&temp_dir));

        // Initially no file, and loading gives an empty library
        assert!(!persistence.exists());
        let outcome = persistence.load().unwrap();
        assert!(outcome.library.is_empty());
        assert!(outcome.is_clean());

        let library = library_with_book("Example");
        persistence.save(&library).unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.library, library);
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = LibraryPersistence::new(test_config(&temp_dir));
        fs::write(persistence.path(), b"{\"books\": [").unwrap();

        let outcome = persistence.load().unwrap();
        assert!(outcome.library.is_empty());
        assert!(outcome.fatal().is_some());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            atomic_writes: true,
            ..test_config(&temp_dir)
        };
        let persistence = LibraryPersistence::new(config);

        persistence.save(&library_with_book("Atomic")).unwrap();

        assert!(persistence.exists());
        assert!(!persistence.path().with_extension("tmp").exists());
        assert_eq!(persistence.load().unwrap().library.books()[0].title, "Atomic");
    }

    #[test]
    fn test_save_overwrites_previous() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = LibraryPersistence::new(test_config(&temp_dir));

        persistence.save(&library_with_book("First")).unwrap();
        persistence.save(&library_with_book("Second")).unwrap();

        let loaded = persistence.load().unwrap().library;
        assert_eq!(loaded.books().len(), 1);
        assert_eq!(loaded.books()[0].title, "Second");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("file.json");

        write_artifact(&nested_path, b"[]", WriteMode::Overwrite).unwrap();
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "[]");

        write_artifact(&nested_path, b"{}", WriteMode::Atomic).unwrap();
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "{}");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the write fail
        let path = temp_dir.path().join("library.json");
        fs::create_dir(&path).unwrap();

        let err = write_artifact(&path, b"[]", WriteMode::Overwrite).unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_read_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.json");
        assert!(read_artifact(&missing).unwrap().is_none());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
