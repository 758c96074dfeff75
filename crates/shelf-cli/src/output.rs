//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use shelf_core::Book;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single book with all fields
    pub fn print_book(&self, book: &Book) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", book.id);
                println!("Title:    {}", book.title);
                println!("Author:   {}", book.author);
                if book.year > 0 {
                    println!("Year:     {}", book.year);
                }
                if !book.genre.is_empty() {
                    println!("Genre:    {}", book.genre);
                }
                println!("Status:   {}", if book.read { "read" } else { "unread" });
                if book.rating > 0 {
                    println!("Rating:   {}", stars(book.rating));
                }
                if !book.isbn.is_empty() {
                    println!("ISBN:     {}", book.isbn);
                }
                if !book.tags.is_empty() {
                    println!("Tags:     {}", book.tags_joined());
                }
                println!("Added:    {}", book.date_added);
                if !book.notes.is_empty() {
                    println!();
                    println!("── Notes ──");
                    println!("{}", book.notes);
                }
            }
            OutputFormat::Json => print_json(book),
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print a list of books, one line each
    pub fn print_books(&self, books: &[&Book]) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books found.");
                    return;
                }
                for book in books {
                    println!("{}", book_line(book));
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => print_json(&books),
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print any serializable value as JSON, ignoring other formats
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        if self.is_json() {
            print_json(value);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("⚠ Failed to render JSON: {}", e),
    }
}

/// One-line summary of a book for listings
pub fn book_line(book: &Book) -> String {
    let year = if book.year > 0 {
        book.year.to_string()
    } else {
        "----".to_string()
    };
    format!(
        "{} | {} {} | {} | {} | {}",
        short_id(book.id.as_str()),
        if book.read { "✓" } else { " " },
        truncate(&book.title, 35),
        truncate(&book.author, 25),
        year,
        stars(book.rating)
    )
}

/// First eight characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Rating as filled and empty stars
fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
