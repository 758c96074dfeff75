//! Status command handler

use anyhow::Result;

use shelf_core::query;
use shelf_core::Store;

use crate::output::{book_line, Output, OutputFormat};

/// How many recently added books the dashboard shows
const RECENT_BOOKS: usize = 5;

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let stats = store.storage_stats();
    let config = store.config();
    let library = store.library();
    let read = library.books().iter().filter(|b| b.read).count();
    let diagnostics = store.load_diagnostics();

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "library_path": config.library_path(),
            "backup_dir": config.backup_dir(),
            "storage": {
                "library_exists": stats.library_exists,
                "library_size": stats.library_size,
                "backup_count": stats.backup_count,
                "unsaved_changes": store.is_dirty()
            },
            "counts": {
                "books": library.books().len(),
                "read": read,
                "collections": library.collections().len(),
                "reading_list": library.reading_list().len()
            },
            "load_warnings": diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>()
        })),
        OutputFormat::Quiet => {
            println!("{}", config.library_path().display());
        }
        OutputFormat::Human => {
            println!("Shelf Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Location: {}", config.library_path().display());
            println!(
                "  Size:     {}",
                if stats.library_exists {
                    stats.library_size_human()
                } else {
                    "(not yet written)".to_string()
                }
            );
            println!("  Backups:  {} in {}", stats.backup_count, config.backup_dir().display());
            if store.is_dirty() {
                println!("  Unsaved changes pending");
            }
            println!();
            println!("Contents:");
            println!("  Books:        {} ({} read)", library.books().len(), read);
            println!("  Collections:  {}", library.collections().len());
            println!("  Reading list: {}", library.reading_list().len());

            let recent = query::recent(library.books(), RECENT_BOOKS);
            if !recent.is_empty() {
                println!();
                println!("Recently added:");
                for book in recent {
                    println!("  {}", book_line(book));
                }
            }

            if !diagnostics.is_empty() {
                println!();
                println!("Load warnings:");
                for diagnostic in diagnostics {
                    println!("  {}", diagnostic);
                }
            }
        }
    }

    Ok(())
}
