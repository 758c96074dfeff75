//! Backup command handlers

use std::path::PathBuf;

use anyhow::{bail, Result};

use shelf_core::storage::persistence::format_size;
use shelf_core::Store;

use crate::editor::confirm;
use crate::output::{Output, OutputFormat};

/// Write a timestamped backup
pub fn create(store: &Store, output: &Output) -> Result<()> {
    let path = store.backup()?;

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "status": "success",
            "path": path,
            "books": store.books().len()
        })),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => println!("✓ Backup written to {}", path.display()),
    }
    Ok(())
}

/// List backups, newest first
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let backups = store.list_backups()?;

    match output.format {
        OutputFormat::Json => {
            let entries: Vec<_> = backups
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "path": b.path,
                        "size": b.size,
                        "modified": b.modified.map(|m| m.to_rfc3339())
                    })
                })
                .collect();
            output.json(&entries);
        }
        OutputFormat::Quiet => {
            for backup in &backups {
                println!("{}", backup.path.display());
            }
        }
        OutputFormat::Human => {
            if backups.is_empty() {
                println!("No backups found in {}", store.config().backup_dir().display());
                return Ok(());
            }
            for backup in &backups {
                let modified = backup
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{}  {:>10}  {}",
                    modified,
                    format_size(backup.size),
                    backup.file_name
                );
            }
            println!("\n{} backup(s)", backups.len());
        }
    }
    Ok(())
}

/// Replace the library with a backup
///
/// With no path, the newest backup is used.
pub fn restore(
    store: &mut Store,
    path: Option<PathBuf>,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => match store.list_backups()?.into_iter().next() {
            Some(latest) => latest.path,
            None => bail!("No backups found. Pass the path of a backup file."),
        },
    };

    if !yes && output.should_prompt() {
        println!("Restore from {}", path.display());
        println!("This replaces all books, collections, and the reading list.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let result = store.restore(&path)?;
    for diagnostic in &result.diagnostics {
        output.warning(&diagnostic.to_string());
    }
    output.success(&result.summary());
    Ok(())
}
