//! Collection command handlers

use anyhow::Result;

use shelf_core::stats::collection_summaries;
use shelf_core::Store;

use crate::commands::book::parse_book_id;
use crate::editor::confirm;
use crate::output::{Output, OutputFormat};

/// Create an empty collection
pub fn create(store: &mut Store, name: String, output: &Output) -> Result<()> {
    store.create_collection(&name)?;
    output.success(&format!("Created collection: {}", name));
    Ok(())
}

/// Delete a collection
pub fn delete(store: &mut Store, name: String, output: &Output) -> Result<()> {
    if store.delete_collection(&name)? {
        output.success(&format!("Deleted collection: {}", name));
    } else {
        output.message(&format!("No collection named '{}'", name));
    }
    Ok(())
}

/// Add a book to a collection
pub fn add(store: &mut Store, name: String, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    if store.add_to_collection(&name, &id)? {
        output.success(&format!("Added to {}", name));
    } else {
        output.message(&format!("Already in {}", name));
    }
    Ok(())
}

/// Remove a book from a collection
///
/// Accepts ids that no longer resolve, so dangling members can be cleaned up.
pub fn remove(store: &mut Store, name: String, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store).unwrap_or_else(|_| id.as_str().into());
    if store.remove_from_collection(&name, &id)? {
        output.success(&format!("Removed from {}", name));
    } else {
        output.message(&format!("Not in {}", name));
    }
    Ok(())
}

/// List collections with counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let summaries = collection_summaries(store.library());

    match output.format {
        OutputFormat::Json => output.json(&summaries),
        OutputFormat::Quiet => {
            for summary in &summaries {
                println!("{}", summary.name);
            }
        }
        OutputFormat::Human => {
            if summaries.is_empty() {
                println!("No collections found.");
                return Ok(());
            }
            for summary in &summaries {
                println!(
                    "{} ({} book(s), {:.0}% read)",
                    summary.name, summary.book_count, summary.read_percentage
                );
            }
            println!("\n{} collection(s)", summaries.len());
        }
    }
    Ok(())
}

/// Show the books in a collection
pub fn show(store: &Store, name: String, output: &Output) -> Result<()> {
    let books = store
        .library()
        .collection_books(&name)
        .ok_or_else(|| shelf_core::IndexError::CollectionNotFound(name.clone()))?;

    if output.should_prompt() {
        println!("Collection: {}\n", name);
    }
    output.print_books(&books);
    Ok(())
}

/// Remove every collection
pub fn clear(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() && !confirm("Delete all collections?")? {
        println!("Cancelled.");
        return Ok(());
    }
    store.clear_collections()?;
    output.success("All collections cleared");
    Ok(())
}
