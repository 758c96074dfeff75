//! Backups
//!
//! A backup is a full current-format copy of the library written to
//! `library_backup_YYYYMMDD_HHMMSS.json` in the backup directory. Backups are
//! never deleted automatically. Two backups taken in the same second share a
//! name and the second overwrites the first.
//!
//! Restoring reads any artifact through the same loader as the canonical file,
//! so legacy shapes restore too. A backup that cannot be read or parsed is
//! rejected as a whole; committing the result is left to the `Store`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, WriteMode};
use crate::models::Library;
use crate::storage::document::{self, LoadDiagnostic, LoadOutcome};
use crate::storage::persistence::write_artifact;
use crate::storage::{StorageError, StorageResult};

/// File name prefix of backup artifacts
pub const BACKUP_PREFIX: &str = "library_backup_";

/// Timestamp embedded in backup file names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Errors that abort a restore, leaving the current library untouched
#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Cannot read backup '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Backup '{path}' is not a valid library: {diagnostic}")]
    Malformed {
        path: PathBuf,
        diagnostic: LoadDiagnostic,
    },

    #[error("Restored library could not be saved: {0}")]
    Commit(#[source] StorageError),
}

/// A backup file on disk
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// What a restore brought back
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub path: PathBuf,
    pub book_count: usize,
    pub collection_count: usize,
    pub reading_list_len: usize,
    /// Entries skipped while loading the backup
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl RestoreResult {
    fn from_outcome(path: &Path, outcome: &LoadOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            book_count: outcome.library.books().len(),
            collection_count: outcome.library.collections().len(),
            reading_list_len: outcome.library.reading_list().len(),
            diagnostics: outcome.diagnostics.clone(),
        }
    }

    /// One-line description of the restore
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Restored {} book(s), {} collection(s), {} reading-list entr{}",
            self.book_count,
            self.collection_count,
            self.reading_list_len,
            if self.reading_list_len == 1 { "y" } else { "ies" }
        );
        if !self.diagnostics.is_empty() {
            summary.push_str(&format!(" ({} entries skipped)", self.diagnostics.len()));
        }
        summary
    }
}

/// Creates, lists, and reads backups
pub struct BackupManager {
    backup_dir: PathBuf,
    write_mode: WriteMode,
}

impl BackupManager {
    pub fn new(backup_dir: PathBuf, write_mode: WriteMode) -> Self {
        Self {
            backup_dir,
            write_mode,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backup_dir(), config.write_mode())
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Backup file name for a given time
    pub fn backup_file_name(at: DateTime<Local>) -> String {
        format!("{}{}.json", BACKUP_PREFIX, at.format(BACKUP_TIMESTAMP_FORMAT))
    }

    /// Write a backup of the library, stamped with the current time
    pub fn create_backup(&self, library: &Library) -> StorageResult<PathBuf> {
        self.create_backup_at(library, Local::now())
    }

    /// Write a backup of the library, stamped with the given time
    pub fn create_backup_at(&self, library: &Library, at: DateTime<Local>) -> StorageResult<PathBuf> {
        let path = self.backup_dir.join(Self::backup_file_name(at));
        let bytes = document::save(library)?;
        write_artifact(&path, &bytes, self.write_mode)?;
        info!(
            "Backed up {} books to {:?}",
            library.books().len(),
            path
        );
        Ok(path)
    }

    /// List backups, newest first
    pub fn list_backups(&self) -> StorageResult<Vec<BackupInfo>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_read_io(e, self.backup_dir.clone())),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_read_io(e, self.backup_dir.clone()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(BACKUP_PREFIX) || !file_name.ends_with(".json") {
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|e| StorageError::from_read_io(e, entry.path()))?;
            backups.push(BackupInfo {
                path: entry.path(),
                file_name,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Local>::from),
            });
        }

        // The embedded timestamp sorts lexically
        backups.sort_by(|a, b| b.file_name.cmp(&a.file_name));
        Ok(backups)
    }

    /// Load a backup artifact without committing it
    ///
    /// Fails if the file can't be read, isn't a library document, or is a
    /// mapping without a usable `books` list.
    /// Skipped entries are carried in the outcome's diagnostics.
    pub fn read_backup(path: &Path) -> Result<(LoadOutcome, RestoreResult), RestoreError> {
        let bytes = fs::read(path).map_err(|source| RestoreError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let outcome =
            document::load_strict(&bytes).map_err(|diagnostic| RestoreError::Malformed {
                path: path.to_path_buf(),
                diagnostic,
            })?;

        let result = RestoreResult::from_outcome(path, &outcome);
        Ok((outcome, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_book, NewBook};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn manager(temp_dir: &TempDir) -> BackupManager {
        BackupManager::new(temp_dir.path().join("backups"), WriteMode::Overwrite)
    }

    fn sample_library() -> Library {
        let mut library = Library::new();
        let book = new_book(NewBook::new("Middlemarch", "George Eliot")).unwrap();
        let id = book.id.clone();
        library.insert_book(book);
        library.create_collection("Victorian").unwrap();
        library.add_to_collection("Victorian", &id).unwrap();
        library.add_to_reading_list(id);
        library
    }

    #[test]
    fn test_backup_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            BackupManager::backup_file_name(at),
            "library_backup_20240309_140507.json"
        );
    }

    #[test]
    fn test_backup_includes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);
        let library = sample_library();

        let path = manager.create_backup(&library).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(BACKUP_PREFIX));

        let (outcome, result) = BackupManager::read_backup(&path).unwrap();
        assert_eq!(outcome.library, library);
        assert_eq!(result.book_count, 1);
        assert_eq!(result.collection_count, 1);
        assert_eq!(result.reading_list_len, 1);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);
        let library = sample_library();

        let older = Local.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap();
        let newer = Local.with_ymd_and_hms(2024, 6, 30, 18, 30, 0).unwrap();
        manager.create_backup_at(&library, older).unwrap();
        manager.create_backup_at(&library, newer).unwrap();
        fs::write(manager.backup_dir().join("notes.txt"), "ignore me").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].file_name, "library_backup_20240630_183000.json");
        assert_eq!(backups[1].file_name, "library_backup_20230101_090000.json");
        assert!(backups[0].size > 0);
    }

    #[test]
    fn test_list_backups_without_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(manager(&temp_dir).list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_read_legacy_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("old.json");
        fs::write(&path, r#"[{"title": "A", "author": "B"}, 12]"#).unwrap();

        let (outcome, result) = BackupManager::read_backup(&path).unwrap();
        assert_eq!(outcome.library.books().len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.summary().contains("1 entries skipped"));
    }

    #[test]
    fn test_read_malformed_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "not json at all").unwrap();

        let err = BackupManager::read_backup(&path).unwrap_err();
        assert!(matches!(err, RestoreError::Malformed { .. }));

        fs::write(&path, "\"a string\"").unwrap();
        let err = BackupManager::read_backup(&path).unwrap_err();
        assert!(matches!(err, RestoreError::Malformed { .. }));
    }

    #[test]
    fn test_read_backup_without_book_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml.json");

        for contents in [r#"{"data_dir": "/x"}"#, r#"{"books": 5}"#, "{}"] {
            fs::write(&path, contents).unwrap();
            let err = BackupManager::read_backup(&path).unwrap_err();
            assert!(matches!(err, RestoreError::Malformed { .. }), "{}", contents);
        }
    }

    #[test]
    fn test_read_missing_backup() {
        let temp_dir = TempDir::new().unwrap();
        let err = BackupManager::read_backup(&temp_dir.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, RestoreError::Unreadable { .. }));
    }

    #[test]
    fn test_restore_summary() {
        let result = RestoreResult {
            path: PathBuf::from("b.json"),
            book_count: 3,
            collection_count: 1,
            reading_list_len: 1,
            diagnostics: Vec::new(),
        };
        assert_eq!(
            result.summary(),
            "Restored 3 book(s), 1 collection(s), 1 reading-list entry"
        );
    }
}
