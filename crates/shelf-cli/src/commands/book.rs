//! Book command handlers

use anyhow::{bail, Context, Result};

use shelf_core::models::parse_tags;
use shelf_core::query::{self, ReadFilter, SearchQuery, SortKey, SortOrder};
use shelf_core::{BookId, NewBook, Store};

use crate::editor::{confirm, is_interactive, prompt_with_default};
use crate::output::{short_id, Output};

/// Field values given on the command line for add and edit
#[derive(Debug, Default, Clone)]
pub struct BookFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<u32>,
    pub genre: Option<String>,
    pub rating: Option<u8>,
    pub read: Option<bool>,
    pub notes: Option<String>,
    pub isbn: Option<String>,
    pub tags: Option<String>,
}

impl BookFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.rating.is_none()
            && self.read.is_none()
            && self.notes.is_none()
            && self.isbn.is_none()
            && self.tags.is_none()
    }
}

/// Add a new book
pub fn add(store: &mut Store, fields: BookFields, output: &Output) -> Result<()> {
    let new = NewBook {
        title: fields.title.unwrap_or_default(),
        author: fields.author.unwrap_or_default(),
        year: fields.year.unwrap_or(0),
        genre: fields.genre.unwrap_or_default(),
        read: fields.read.unwrap_or(false),
        rating: fields.rating.unwrap_or(0),
        notes: fields.notes.unwrap_or_default(),
        isbn: fields.isbn.unwrap_or_default(),
        tags: fields.tags.as_deref().map(parse_tags).unwrap_or_default(),
    };

    let book = store.add_book(new)?;

    output.success(&format!("Added book: {}", book.title));
    output.print_book(&book);
    Ok(())
}

/// List books with filter and sort
pub fn list(
    store: &Store,
    filter: ReadFilter,
    sort: SortKey,
    descending: bool,
    limit: Option<usize>,
    output: &Output,
) -> Result<()> {
    let order = if descending {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    let mut books = query::browse(store.books(), filter, sort, order);
    if let Some(limit) = limit {
        books.truncate(limit);
    }
    output.print_books(&books);
    Ok(())
}

/// Show a single book with its collections and reading-list state
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    let book = store
        .get_book(&id)
        .ok_or_else(|| anyhow::anyhow!("Book not found: {}", id))?;

    output.print_book(book);

    if output.should_prompt() {
        let collections = store.library().collections_containing(&id);
        if !collections.is_empty() {
            println!();
            println!("Collections: {}", collections.join(", "));
        }
        if store.library().is_on_reading_list(&id) {
            println!("On reading list");
        }
    }
    Ok(())
}

/// Edit a book from flags, or interactively when no flags are given
pub fn edit(store: &mut Store, id: String, fields: BookFields, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    let mut book = store
        .get_book(&id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Book not found: {}", id))?;

    let fields = if fields.is_empty() {
        if !is_interactive() {
            bail!("Nothing to change. Pass field flags such as --title or --rating.");
        }
        prompt_fields(&book)?
    } else {
        fields
    };

    if let Some(title) = fields.title {
        book.title = title.trim().to_string();
    }
    if let Some(author) = fields.author {
        book.author = author.trim().to_string();
    }
    if let Some(year) = fields.year {
        book.year = year;
    }
    if let Some(genre) = fields.genre {
        book.genre = genre.trim().to_string();
    }
    if let Some(rating) = fields.rating {
        book.set_rating(rating);
    }
    if let Some(read) = fields.read {
        book.read = read;
    }
    if let Some(notes) = fields.notes {
        book.notes = notes;
    }
    if let Some(isbn) = fields.isbn {
        book.isbn = isbn.trim().to_string();
    }
    if let Some(tags) = fields.tags {
        book.tags = parse_tags(&tags);
    }

    store.update_book(&book)?;

    output.success("Book updated");
    output.print_book(&book);
    Ok(())
}

/// Delete a book
pub fn delete(store: &mut Store, id: String, yes: bool, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    let book = store
        .get_book(&id)
        .ok_or_else(|| anyhow::anyhow!("Book not found: {}", id))?;

    if !yes && output.should_prompt() {
        println!("Delete book: {} - {}", short_id(book.id.as_str()), book.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let book = store.delete_book(&id)?;
    output.success(&format!("Deleted book: {}", book.title));
    Ok(())
}

/// Mark a book read, taking it off the reading list
pub fn mark_read(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let id = parse_book_id(&id, store)?;
    store.mark_read(&id)?;

    let title = store.get_book(&id).map(|b| b.title.as_str()).unwrap_or("");
    output.success(&format!("Marked as read: {}", title));
    Ok(())
}

/// Search books
pub fn search(store: &Store, query: SearchQuery, output: &Output) -> Result<()> {
    let books = query::search(store.books(), &query);
    output.print_books(&books);
    Ok(())
}

/// Show the most recently added books
pub fn recent(store: &Store, count: usize, output: &Output) -> Result<()> {
    let books = query::recent(store.books(), count);
    output.print_books(&books);
    Ok(())
}

/// Resolve a book id from a full id or a unique prefix
pub fn parse_book_id(id: &str, store: &Store) -> Result<BookId> {
    let exact = BookId::from(id);
    if store.get_book(&exact).is_some() {
        return Ok(exact);
    }

    let matches: Vec<_> = store
        .books()
        .iter()
        .filter(|b| b.id.as_str().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No book found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple books match '{}':", id);
            for book in &matches {
                eprintln!("  {} - {}", book.id, book.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Ask for each field, keeping the current value on empty input
fn prompt_fields(book: &shelf_core::Book) -> Result<BookFields> {
    println!("Editing book: {}", book.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let year = match prompt_with_default("Year", &book.year.to_string())? {
        Some(year) => Some(year.parse().context("Year must be a whole number")?),
        None => None,
    };
    let rating = match prompt_with_default("Rating (0-5)", &book.rating.to_string())? {
        Some(rating) => Some(rating.parse().context("Rating must be a number from 0 to 5")?),
        None => None,
    };
    let read = match prompt_with_default("Read (y/n)", if book.read { "y" } else { "n" })? {
        Some(read) => Some(matches!(read.to_lowercase().as_str(), "y" | "yes" | "true")),
        None => None,
    };

    Ok(BookFields {
        title: prompt_with_default("Title", &book.title)?,
        author: prompt_with_default("Author", &book.author)?,
        year,
        genre: prompt_with_default("Genre", &book.genre)?,
        rating,
        read,
        notes: prompt_with_default("Notes", &book.notes)?,
        isbn: prompt_with_default("ISBN", &book.isbn)?,
        tags: prompt_with_default("Tags (comma-separated)", &book.tags_joined())?,
    })
}
