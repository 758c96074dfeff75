//! Reading list command handlers

use anyhow::Result;

use shelf_core::Store;

use crate::commands::book::parse_book_id;
use crate::editor::confirm;
use crate::output::Output;

/// Queue a book
pub fn add(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    if store.add_to_reading_list(&id)? {
        output.success("Added to reading list");
    } else {
        output.message("Already on reading list");
    }
    Ok(())
}

/// Take a book off the reading list
pub fn remove(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store).unwrap_or_else(|_| id.as_str().into());
    if store.remove_from_reading_list(&id)? {
        output.success("Removed from reading list");
    } else {
        output.message("Not on reading list");
    }
    Ok(())
}

/// Show the reading list in queue order
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let books = store.library().reading_list_books();
    output.print_books(&books);
    Ok(())
}

/// Mark every queued book read
pub fn done_all(store: &mut Store, output: &Output) -> Result<()> {
    let marked = store.mark_all_read()?;
    output.success(&format!("Marked {} book(s) as read", marked));
    Ok(())
}

/// Empty the reading list
pub fn clear(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() && !confirm("Clear the reading list?")? {
        println!("Cancelled.");
        return Ok(());
    }
    store.clear_reading_list()?;
    output.success("Reading list cleared");
    Ok(())
}
