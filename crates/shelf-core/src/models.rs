//! Data models for Shelf
//!
//! Defines the core data structures: Book and the root Library document.
//!
//! `normalize_book` is the one place loosely-typed input (old library files,
//! imports) is turned into a `Book`. Nothing downstream re-parses raw JSON.

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Format used for `date_added` timestamps
pub const DATE_ADDED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Highest allowed rating
pub const MAX_RATING: u8 = 5;

/// Keys of a book mapping
pub mod keys {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const YEAR: &str = "year";
    pub const GENRE: &str = "genre";
    pub const READ: &str = "read";
    pub const RATING: &str = "rating";
    pub const NOTES: &str = "notes";
    pub const ISBN: &str = "isbn";
    pub const TAGS: &str = "tags";
    pub const DATE_ADDED: &str = "date_added";

    /// All known book fields, in export order
    pub const ALL: [&str; 11] = [
        ID, TITLE, AUTHOR, YEAR, GENRE, READ, RATING, NOTES, ISBN, TAGS, DATE_ADDED,
    ];
}

/// Errors for rejected user input on book creation or edit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Author is required")]
    MissingAuthor,
}

/// Opaque book identifier
///
/// Fresh ids are random UUIDs, but ids read from disk are kept verbatim
/// whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Generate a fresh, never-before-used id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A catalogued book
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Book {
    /// Unique identifier, immutable
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Publication year, 0 when unknown
    pub year: u32,
    pub genre: String,
    /// Whether the book has been read
    pub read: bool,
    /// 0 (unrated) to 5
    pub rating: u8,
    pub notes: String,
    pub isbn: String,
    /// Tags in insertion order, duplicates allowed
    pub tags: Vec<String>,
    /// When the book was added, immutable
    pub date_added: String,
    /// Fields this version does not know about, kept so a save never drops them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    /// Check the fields required of an interactively created or edited book
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.author.trim().is_empty() {
            return Err(ValidationError::MissingAuthor);
        }
        Ok(())
    }

    /// Set the rating, clamped into 0..=5
    pub fn set_rating(&mut self, rating: u8) {
        self.rating = rating.min(MAX_RATING);
    }

    /// Tags joined for display and tabular export
    pub fn tags_joined(&self) -> String {
        self.tags.join(", ")
    }
}

/// User-supplied fields for a new book
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: u32,
    pub genre: String,
    pub read: bool,
    pub rating: u8,
    pub notes: String,
    pub isbn: String,
    pub tags: Vec<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }
}

/// Create a book from user input
///
/// Assigns a fresh id and the current time as `date_added`. Fails without
/// side effects when title or author is blank.
pub fn new_book(fields: NewBook) -> Result<Book, ValidationError> {
    let title = fields.title.trim().to_string();
    let author = fields.author.trim().to_string();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if author.is_empty() {
        return Err(ValidationError::MissingAuthor);
    }

    Ok(Book {
        id: BookId::generate(),
        title,
        author,
        year: fields.year,
        genre: fields.genre.trim().to_string(),
        read: fields.read,
        rating: fields.rating.min(MAX_RATING),
        notes: fields.notes,
        isbn: fields.isbn.trim().to_string(),
        tags: fields.tags,
        date_added: now_timestamp(),
        extra: Map::new(),
    })
}

/// Turn a loosely-typed mapping into a well-formed book
///
/// Never fails. Missing or mistyped values fall back to their defaults,
/// `year` and `rating` are coerced to integers (rating clamped into 0..=5),
/// and a fresh id is assigned when none is present. Unknown keys are kept
/// in `extra`.
pub fn normalize_book(mut raw: Map<String, Value>) -> Book {
    let id = coerce_id(raw.remove(keys::ID));
    let title = coerce_string(raw.remove(keys::TITLE));
    let author = coerce_string(raw.remove(keys::AUTHOR));
    let year = coerce_year(raw.remove(keys::YEAR).as_ref());
    let genre = coerce_string(raw.remove(keys::GENRE));
    let read = coerce_bool(raw.remove(keys::READ).as_ref());
    let rating = coerce_rating(raw.remove(keys::RATING).as_ref());
    let notes = coerce_string(raw.remove(keys::NOTES));
    let isbn = coerce_string(raw.remove(keys::ISBN));
    let tags = coerce_tags(raw.remove(keys::TAGS));

    let date_added = coerce_string(raw.remove(keys::DATE_ADDED));
    let date_added = if date_added.trim().is_empty() {
        now_timestamp()
    } else {
        date_added
    };

    Book {
        id,
        title,
        author,
        year,
        genre,
        read,
        rating,
        notes,
        isbn,
        tags,
        date_added,
        extra: raw,
    }
}

/// Split a comma-separated tag string, dropping blanks
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Current local time in `date_added` format
pub fn now_timestamp() -> String {
    Local::now().format(DATE_ADDED_FORMAT).to_string()
}

fn coerce_id(value: Option<Value>) -> BookId {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => BookId(s),
        Some(Value::Number(n)) => BookId(n.to_string()),
        _ => BookId::generate(),
    }
}

fn coerce_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_to_integer))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

fn coerce_year(value: Option<&Value>) -> u32 {
    u32::try_from(coerce_integer(value)).unwrap_or(0)
}

fn coerce_rating(value: Option<&Value>) -> u8 {
    coerce_integer(value).clamp(0, i64::from(MAX_RATING)) as u8
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "read"
        ),
        _ => false,
    }
}

fn coerce_tags(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => parse_tags(&s),
        _ => Vec::new(),
    }
}

/// The root document: books, collections, and the reading list
///
/// Book ids are unique within a library; `insert_book` enforces this.
/// Collection members and reading-list entries are plain ids and may refer
/// to books that have since been deleted.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Library {
    pub(crate) books: Vec<Book>,
    pub(crate) collections: BTreeMap<String, Vec<BookId>>,
    pub(crate) reading_list: Vec<BookId>,
}

impl Library {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// All books in insertion order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Get a book by id
    pub fn book(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub(crate) fn book_mut(&mut self, id: &BookId) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| &b.id == id)
    }

    pub fn contains_book(&self, id: &BookId) -> bool {
        self.book(id).is_some()
    }

    /// Insert a book, keeping ids unique
    ///
    /// If the id is already taken the book gets a fresh one, and the
    /// colliding id is returned.
    pub fn insert_book(&mut self, mut book: Book) -> Option<BookId> {
        let collided = if self.contains_book(&book.id) {
            let original = std::mem::replace(&mut book.id, BookId::generate());
            Some(original)
        } else {
            None
        };
        self.books.push(book);
        collided
    }

    /// Replace the stored book with the same id, returning the old one
    pub fn replace_book(&mut self, book: Book) -> Option<Book> {
        let slot = self.book_mut(&book.id)?;
        Some(std::mem::replace(slot, book))
    }

    /// Remove a book
    ///
    /// Collection and reading-list references are left in place.
    pub fn remove_book(&mut self, id: &BookId) -> Option<Book> {
        let pos = self.books.iter().position(|b| &b.id == id)?;
        Some(self.books.remove(pos))
    }

    /// Named collections and their member ids
    pub fn collections(&self) -> &BTreeMap<String, Vec<BookId>> {
        &self.collections
    }

    /// Member ids of a collection
    pub fn collection(&self, name: &str) -> Option<&[BookId]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    /// Reading list in queue order
    pub fn reading_list(&self) -> &[BookId] {
        &self.reading_list
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.collections.is_empty() && self.reading_list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_new_book() {
        let mut fields = NewBook::new("Dune", "Frank Herbert");
        fields.year = 1965;
        fields.rating = 4;
        fields.tags = vec!["sf".to_string(), "classic".to_string()];

        let book = new_book(fields).unwrap();
        assert!(!book.id.as_str().is_empty());
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.year, 1965);
        assert_eq!(book.rating, 4);
        assert!(!book.read);
        assert_eq!(book.tags, vec!["sf", "classic"]);
        assert!(chrono::NaiveDateTime::parse_from_str(&book.date_added, DATE_ADDED_FORMAT).is_ok());
    }

    #[test]
    fn test_new_book_requires_title_and_author() {
        assert_eq!(
            new_book(NewBook::new("  ", "Someone")).unwrap_err(),
            ValidationError::MissingTitle
        );
        assert_eq!(
            new_book(NewBook::new("Something", "")).unwrap_err(),
            ValidationError::MissingAuthor
        );
    }

    #[test]
    fn test_new_book_ids_are_distinct() {
        let ids: HashSet<BookId> = (0..100)
            .map(|i| new_book(NewBook::new(format!("Book {}", i), "A")).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_new_book_clamps_rating() {
        let mut fields = NewBook::new("T", "A");
        fields.rating = 9;
        assert_eq!(new_book(fields).unwrap().rating, MAX_RATING);
    }

    #[test]
    fn test_normalize_empty_mapping() {
        let book = normalize_book(Map::new());
        assert!(!book.id.as_str().is_empty());
        assert!(book.title.is_empty());
        assert_eq!(book.year, 0);
        assert_eq!(book.rating, 0);
        assert!(!book.read);
        assert!(book.tags.is_empty());
        assert!(!book.date_added.is_empty());
        assert!(book.extra.is_empty());
    }

    #[test]
    fn test_normalize_keeps_existing_id() {
        let book = normalize_book(raw(json!({"id": "abc-123", "title": "T"})));
        assert_eq!(book.id.as_str(), "abc-123");

        let book = normalize_book(raw(json!({"id": 42})));
        assert_eq!(book.id.as_str(), "42");

        let book = normalize_book(raw(json!({"id": ""})));
        assert!(!book.id.as_str().is_empty());
    }

    #[test]
    fn test_normalize_coerces_numbers() {
        let book = normalize_book(raw(json!({
            "year": "1999",
            "rating": 4.0,
        })));
        assert_eq!(book.year, 1999);
        assert_eq!(book.rating, 4);

        let book = normalize_book(raw(json!({
            "year": "unknown",
            "rating": null,
        })));
        assert_eq!(book.year, 0);
        assert_eq!(book.rating, 0);

        let book = normalize_book(raw(json!({"year": "1984.0", "rating": "3"})));
        assert_eq!(book.year, 1984);
        assert_eq!(book.rating, 3);
    }

    #[test]
    fn test_normalize_clamps_rating_and_year() {
        assert_eq!(normalize_book(raw(json!({"rating": 11}))).rating, 5);
        assert_eq!(normalize_book(raw(json!({"rating": -2}))).rating, 0);
        assert_eq!(normalize_book(raw(json!({"year": -300}))).year, 0);
    }

    #[test]
    fn test_normalize_read_flag() {
        assert!(normalize_book(raw(json!({"read": true}))).read);
        assert!(normalize_book(raw(json!({"read": "True"}))).read);
        assert!(normalize_book(raw(json!({"read": 1}))).read);
        assert!(!normalize_book(raw(json!({"read": "no"}))).read);
        assert!(!normalize_book(raw(json!({"read": []}))).read);
    }

    #[test]
    fn test_normalize_tags() {
        let book = normalize_book(raw(json!({"tags": ["a", 2, null, "a"]})));
        assert_eq!(book.tags, vec!["a", "2", "a"]);

        let book = normalize_book(raw(json!({"tags": "fantasy, epic ,"})));
        assert_eq!(book.tags, vec!["fantasy", "epic"]);

        let book = normalize_book(raw(json!({"tags": {"nested": true}})));
        assert!(book.tags.is_empty());
    }

    #[test]
    fn test_normalize_keeps_unknown_fields() {
        let book = normalize_book(raw(json!({"title": "T", "publisher": "Ace"})));
        assert_eq!(book.extra.get("publisher"), Some(&json!("Ace")));
        assert!(!book.extra.contains_key("title"));
    }

    #[test]
    fn test_normalize_null_strings() {
        let book = normalize_book(raw(json!({"title": null, "notes": null, "genre": 7})));
        assert!(book.title.is_empty());
        assert!(book.notes.is_empty());
        assert_eq!(book.genre, "7");
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("rust, systems,, "), vec!["rust", "systems"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_validate() {
        let mut book = new_book(NewBook::new("T", "A")).unwrap();
        assert!(book.validate().is_ok());
        book.author = " ".to_string();
        assert_eq!(book.validate(), Err(ValidationError::MissingAuthor));
    }

    #[test]
    fn test_insert_book_keeps_ids_unique() {
        let mut library = Library::new();
        let book = new_book(NewBook::new("T", "A")).unwrap();
        let id = book.id.clone();

        assert!(library.insert_book(book.clone()).is_none());
        let collided = library.insert_book(book);
        assert_eq!(collided, Some(id.clone()));

        assert_eq!(library.books().len(), 2);
        assert_ne!(library.books()[0].id, library.books()[1].id);
        assert_eq!(library.books()[0].id, id);
    }

    #[test]
    fn test_replace_and_remove_book() {
        let mut library = Library::new();
        let book = new_book(NewBook::new("Old", "A")).unwrap();
        let id = book.id.clone();
        library.insert_book(book.clone());

        let mut edited = book;
        edited.title = "New".to_string();
        let old = library.replace_book(edited).unwrap();
        assert_eq!(old.title, "Old");
        assert_eq!(library.book(&id).unwrap().title, "New");

        assert!(library.remove_book(&id).is_some());
        assert!(library.remove_book(&id).is_none());
        assert!(library.books().is_empty());
    }

    #[test]
    fn test_book_serialization_flattens_extra() {
        let book = normalize_book(raw(json!({"id": "x", "title": "T", "publisher": "Ace"})));
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["id"], "x");
        assert_eq!(value["publisher"], "Ace");
        assert!(value.get("extra").is_none());
    }
}
