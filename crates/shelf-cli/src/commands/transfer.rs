//! Import and export command handlers

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use shelf_core::transfer::{self, Format};
use shelf_core::Store;

use crate::output::Output;

/// Export all books as JSON or CSV, to a file or stdout
pub fn export(
    store: &Store,
    format: Option<Format>,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let format = resolve_format(format, path.as_deref()).unwrap_or(Format::Json);
    let bytes = match format {
        Format::Json => transfer::export_json(store.books())?,
        Format::Csv => transfer::export_csv(store.books())?,
    };

    match path {
        Some(path) => {
            fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            output.success(&format!(
                "Exported {} book(s) to {}",
                store.books().len(),
                path.display()
            ));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            if format == Format::Json {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

/// Import books (and, from JSON, collections) from a file
pub fn import(
    store: &mut Store,
    path: PathBuf,
    format: Option<Format>,
    output: &Output,
) -> Result<()> {
    let format = resolve_format(format, Some(path.as_path())).ok_or_else(|| {
        anyhow::anyhow!(
            "Cannot tell the format of {:?}. Pass --format json or --format csv.",
            path
        )
    })?;

    let bytes =
        fs::read(&path).with_context(|| format!("Failed to read import file: {:?}", path))?;
    let batch = match format {
        Format::Json => transfer::import_json(&bytes)?,
        Format::Csv => transfer::import_csv(bytes.as_slice())?,
    };

    let summary = store.import(batch)?;

    if output.is_json() {
        output.json(&serde_json::json!({
            "status": "success",
            "books_added": summary.books_added,
            "ids_reassigned": summary.ids_reassigned,
            "collections_merged": summary.collections_merged,
            "skipped": summary.skipped
        }));
    } else {
        if summary.skipped > 0 {
            output.warning(&format!("Skipped {} unusable entries", summary.skipped));
        }
        output.success(&format!(
            "Imported {} book(s) from {}",
            summary.books_added,
            path.display()
        ));
    }
    Ok(())
}

/// Explicit format, else the one implied by the file extension
fn resolve_format(explicit: Option<Format>, path: Option<&Path>) -> Option<Format> {
    explicit.or_else(|| path.and_then(Format::from_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(None, Some(Path::new("books.csv"))),
            Some(Format::Csv)
        );
        assert_eq!(
            resolve_format(Some(Format::Json), Some(Path::new("books.csv"))),
            Some(Format::Json)
        );
        assert_eq!(resolve_format(None, Some(Path::new("books.txt"))), None);
        assert_eq!(resolve_format(None, None), None);
    }
}
