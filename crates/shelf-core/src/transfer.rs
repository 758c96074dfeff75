//! Import and export
//!
//! Tabular (CSV) and JSON renderings of the book set. Imports go through the
//! same normalization as library files; exports only read the library.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{keys, normalize_book, Book, BookId};
use crate::storage::document::{self, DocumentShape};

/// Errors from reading or writing import/export files
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported import format: expected a list of books or a mapping with a 'books' list")]
    InvalidFormat,

    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Import/export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(format!("unknown format '{}' (expected json or csv)", other)),
        }
    }
}

/// Books and collections read from an import file
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub books: Vec<Book>,
    pub collections: BTreeMap<String, Vec<BookId>>,
    /// Entries that could not be used
    pub skipped: usize,
}

/// Read a JSON import: a list of books, or a mapping with a `books` list
/// and optional `collections`
pub fn import_json(bytes: &[u8]) -> Result<ImportBatch, TransferError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let accepted = match &value {
        Value::Array(_) => true,
        Value::Object(map) => map.get(document::keys::BOOKS).map_or(false, Value::is_array),
        _ => false,
    };
    if !accepted {
        return Err(TransferError::InvalidFormat);
    }

    let outcome = DocumentShape::from_value(value).into_outcome();
    let skipped = outcome.diagnostics.len();
    let library = outcome.library;
    Ok(ImportBatch {
        books: library.books,
        collections: library.collections,
        skipped,
    })
}

/// Read a CSV import
///
/// The header must name `title` and `author`; other recognised columns map
/// onto book fields and unknown columns are kept as extra fields. Empty
/// cells take the field's default.
pub fn import_csv<R: Read>(reader: R) -> Result<ImportBatch, TransferError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase().replace(' ', "_"))
        .collect();

    for required in [keys::TITLE, keys::AUTHOR] {
        if !headers.iter().any(|h| h == required) {
            return Err(TransferError::MissingColumn(required));
        }
    }

    let mut batch = ImportBatch::default();
    for record in rdr.records() {
        let record = record?;
        let mut raw = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            if !field.is_empty() {
                raw.insert(header.clone(), Value::String(field.to_string()));
            }
        }
        if raw.is_empty() {
            batch.skipped += 1;
            continue;
        }
        batch.books.push(normalize_book(raw));
    }
    Ok(batch)
}

/// Render books as a pretty-printed JSON list
pub fn export_json(books: &[Book]) -> Result<Vec<u8>, TransferError> {
    Ok(serde_json::to_vec_pretty(books)?)
}

/// Render books as CSV with one column per book field
pub fn export_csv(books: &[Book]) -> Result<Vec<u8>, TransferError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(keys::ALL)?;

    for book in books {
        let row = [
            book.id.to_string(),
            book.title.clone(),
            book.author.clone(),
            book.year.to_string(),
            book.genre.clone(),
            book.read.to_string(),
            book.rating.to_string(),
            book.notes.clone(),
            book.isbn.clone(),
            book.tags_joined(),
            book.date_added.clone(),
        ];
        wtr.write_record(&row)?;
    }

    wtr.into_inner()
        .map_err(|e| TransferError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_book, NewBook};

    fn sample_books() -> Vec<Book> {
        let mut fields = NewBook::new("Gödel, Escher, Bach", "Douglas Hofstadter");
        fields.year = 1979;
        fields.rating = 5;
        fields.read = true;
        fields.tags = vec!["math".to_string(), "music".to_string()];
        fields.notes = "Line one\nline \"two\"".to_string();
        vec![
            new_book(fields).unwrap(),
            new_book(NewBook::new("Solaris", "Stanisław Lem")).unwrap(),
        ]
    }

    #[test]
    fn test_csv_export_then_import() {
        let books = sample_books();
        let bytes = export_csv(&books).unwrap();
        let batch = import_csv(bytes.as_slice()).unwrap();

        assert_eq!(batch.books.len(), 2);
        assert_eq!(batch.skipped, 0);
        let first = &batch.books[0];
        assert_eq!(first.id, books[0].id);
        assert_eq!(first.title, "Gödel, Escher, Bach");
        assert_eq!(first.year, 1979);
        assert!(first.read);
        assert_eq!(first.rating, 5);
        assert_eq!(first.tags, vec!["math", "music"]);
        assert_eq!(first.notes, books[0].notes);
        assert_eq!(first.date_added, books[0].date_added);
    }

    #[test]
    fn test_csv_header_row() {
        let bytes = export_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.trim_end(),
            "id,title,author,year,genre,read,rating,notes,isbn,tags,date_added"
        );
    }

    #[test]
    fn test_csv_import_minimal_columns() {
        let csv = "Title,Author,Rating,Year,Publisher\n\
                   Neuromancer,William Gibson,9,1984.0,Ace\n\
                   Kindred,Octavia Butler,,,\n";
        let batch = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(batch.books.len(), 2);
        let first = &batch.books[0];
        assert_eq!(first.rating, 5);
        assert_eq!(first.year, 1984);
        assert_eq!(first.extra.get("publisher"), Some(&Value::from("Ace")));
        assert_ne!(batch.books[0].id, batch.books[1].id);

        let second = &batch.books[1];
        assert_eq!(second.rating, 0);
        assert_eq!(second.year, 0);
    }

    #[test]
    fn test_csv_import_requires_title_and_author() {
        let err = import_csv("title,year\nDune,1965\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TransferError::MissingColumn("author")));

        let err = import_csv("author\nHerbert\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TransferError::MissingColumn("title")));
    }

    #[test]
    fn test_json_import_list() {
        let batch = import_json(br#"[{"title": "A", "author": "B"}, "junk"]"#).unwrap();
        assert_eq!(batch.books.len(), 1);
        assert_eq!(batch.skipped, 1);
        assert!(batch.collections.is_empty());
    }

    #[test]
    fn test_json_import_document() {
        let bytes = br#"{
            "books": [{"id": "b1", "title": "A", "author": "B"}],
            "collections": {"Loved": ["b1"]},
            "reading_list": ["b1"]
        }"#;
        let batch = import_json(bytes).unwrap();
        assert_eq!(batch.books.len(), 1);
        assert_eq!(batch.collections["Loved"], vec![BookId::from("b1")]);
    }

    #[test]
    fn test_json_import_rejects_other_shapes() {
        assert!(matches!(
            import_json(br#"{"collections": {}}"#),
            Err(TransferError::InvalidFormat)
        ));
        assert!(matches!(import_json(b"7"), Err(TransferError::InvalidFormat)));
        assert!(matches!(import_json(b"{"), Err(TransferError::Json(_))));
    }

    #[test]
    fn test_json_export() {
        let books = sample_books();
        let bytes = export_json(&books).unwrap();
        let batch = import_json(&bytes).unwrap();
        assert_eq!(batch.books, books);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("x/library.CSV")), Some(Format::Csv));
        assert_eq!(Format::from_path(Path::new("export.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("export.xlsx")), None);
        assert_eq!(Format::Csv.extension(), "csv");
    }
}
