//! Library document format
//!
//! Converts between the JSON library artifact and the in-memory `Library`.
//!
//! Two top-level shapes are read:
//!
//! - a bare array of book mappings (the original format)
//! - a mapping with `books`, and optionally `collections` and `reading_list`
//!
//! Only the mapping shape is ever written. Loading never fails: structural
//! problems degrade to an empty library, bad entries are skipped, and every
//! problem is reported as a `LoadDiagnostic`.

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{normalize_book, BookId, Library};

/// Keys of the top-level document
pub mod keys {
    pub const BOOKS: &str = "books";
    pub const COLLECTIONS: &str = "collections";
    pub const READING_LIST: &str = "reading_list";
}

/// How the top level of an artifact was interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// A bare array of book entries
    LegacySequence(Vec<Value>),
    /// A mapping with `books`, `collections`, `reading_list`
    CurrentDocument(Map<String, Value>),
    /// Not usable as a library
    Malformed(LoadDiagnostic),
}

impl DocumentShape {
    /// Parse bytes and classify the root value
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(e) => DocumentShape::Malformed(LoadDiagnostic::Parse {
                details: e.to_string(),
            }),
        }
    }

    /// Classify an already parsed root value
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => DocumentShape::LegacySequence(items),
            Value::Object(map) => DocumentShape::CurrentDocument(map),
            other => DocumentShape::Malformed(LoadDiagnostic::UnexpectedRoot {
                found: kind_of(&other),
            }),
        }
    }

    /// Build the library this shape describes
    pub fn into_outcome(self) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        match self {
            DocumentShape::LegacySequence(items) => read_books(items, &mut outcome),
            DocumentShape::CurrentDocument(map) => read_current(map, &mut outcome),
            DocumentShape::Malformed(diagnostic) => outcome.diagnostics.push(diagnostic),
        }
        outcome
    }
}

/// A problem found while loading, reported rather than raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// The artifact is not valid JSON
    Parse { details: String },
    /// The root is neither an array nor a mapping
    UnexpectedRoot { found: &'static str },
    /// A `books` entry was not a mapping
    SkippedBook { index: usize, found: &'static str },
    /// A top-level section had the wrong type and was ignored
    InvalidSection {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// A collection's member list was not an array
    InvalidCollection { name: String, found: &'static str },
    /// A collection or reading-list entry was not an id
    SkippedReference {
        section: String,
        index: usize,
        found: &'static str,
    },
    /// Two books shared an id; the later one got a fresh id
    DuplicateId { original: BookId, replacement: BookId },
    /// A required top-level section was absent
    MissingSection { key: &'static str },
}

impl LoadDiagnostic {
    /// Whether this problem discarded the whole artifact
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoadDiagnostic::Parse { .. } | LoadDiagnostic::UnexpectedRoot { .. }
        )
    }
}

impl std::fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadDiagnostic::Parse { details } => {
                write!(f, "library file is not valid JSON ({}); starting with an empty library", details)
            }
            LoadDiagnostic::UnexpectedRoot { found } => write!(
                f,
                "library file contains {} instead of a list or mapping; starting with an empty library",
                found
            ),
            LoadDiagnostic::SkippedBook { index, found } => {
                write!(f, "skipped book entry {}: expected a mapping, found {}", index, found)
            }
            LoadDiagnostic::InvalidSection {
                key,
                expected,
                found,
            } => write!(f, "ignored '{}': expected {}, found {}", key, expected, found),
            LoadDiagnostic::InvalidCollection { name, found } => write!(
                f,
                "ignored collection '{}': expected a list of book ids, found {}",
                name, found
            ),
            LoadDiagnostic::SkippedReference {
                section,
                index,
                found,
            } => write!(
                f,
                "skipped entry {} of {}: expected a book id, found {}",
                index, section, found
            ),
            LoadDiagnostic::DuplicateId {
                original,
                replacement,
            } => write!(
                f,
                "duplicate book id {}; later copy reassigned to {}",
                original, replacement
            ),
            LoadDiagnostic::MissingSection { key } => write!(f, "no '{}' section", key),
        }
    }
}

/// A loaded library together with everything that went wrong
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub library: Library,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadOutcome {
    /// The diagnostic that discarded the artifact, if any
    pub fn fatal(&self) -> Option<&LoadDiagnostic> {
        self.diagnostics.iter().find(|d| d.is_fatal())
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Load a library from an artifact's bytes
///
/// `None` means no artifact exists yet and yields an empty library with no
/// diagnostics.
pub fn load(bytes: Option<&[u8]>) -> LoadOutcome {
    let Some(bytes) = bytes else {
        return LoadOutcome::default();
    };

    let outcome = DocumentShape::parse(bytes).into_outcome();
    for diagnostic in &outcome.diagnostics {
        warn!("{}", diagnostic);
    }
    outcome
}

/// Load an artifact that must be a complete library document
///
/// Unlike `load`, a mapping without a `books` list or with a mistyped
/// section is rejected along with unparseable input. Skipped entries are
/// still only reported.
pub fn load_strict(bytes: &[u8]) -> Result<LoadOutcome, LoadDiagnostic> {
    let shape = DocumentShape::parse(bytes);
    if let DocumentShape::CurrentDocument(map) = &shape {
        match map.get(keys::BOOKS) {
            Some(Value::Array(_)) => {}
            None | Some(Value::Null) => {
                return Err(LoadDiagnostic::MissingSection { key: keys::BOOKS })
            }
            Some(other) => {
                return Err(LoadDiagnostic::InvalidSection {
                    key: keys::BOOKS,
                    expected: "a list",
                    found: kind_of(other),
                })
            }
        }
    }

    let outcome = shape.into_outcome();
    if let Some(rejected) = outcome
        .diagnostics
        .iter()
        .find(|d| d.is_fatal() || matches!(d, LoadDiagnostic::InvalidSection { .. }))
    {
        return Err(rejected.clone());
    }
    for diagnostic in &outcome.diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(outcome)
}

/// Serialize a library in the current document shape
pub fn save(library: &Library) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(library)
}

fn read_current(mut map: Map<String, Value>, outcome: &mut LoadOutcome) {
    match map.remove(keys::BOOKS) {
        Some(Value::Array(items)) => read_books(items, outcome),
        None | Some(Value::Null) => {}
        Some(other) => outcome.diagnostics.push(LoadDiagnostic::InvalidSection {
            key: keys::BOOKS,
            expected: "a list",
            found: kind_of(&other),
        }),
    }

    match map.remove(keys::COLLECTIONS) {
        Some(Value::Object(collections)) => {
            for (name, members) in collections {
                match members {
                    Value::Array(items) => {
                        let section = format!("collection '{}'", name);
                        let ids = read_references(&section, items, &mut outcome.diagnostics);
                        outcome.library.collections.insert(name, ids);
                    }
                    other => outcome
                        .diagnostics
                        .push(LoadDiagnostic::InvalidCollection {
                            name,
                            found: kind_of(&other),
                        }),
                }
            }
        }
        None | Some(Value::Null) => {}
        Some(other) => outcome.diagnostics.push(LoadDiagnostic::InvalidSection {
            key: keys::COLLECTIONS,
            expected: "a mapping",
            found: kind_of(&other),
        }),
    }

    match map.remove(keys::READING_LIST) {
        Some(Value::Array(items)) => {
            outcome.library.reading_list =
                read_references(keys::READING_LIST, items, &mut outcome.diagnostics);
        }
        None | Some(Value::Null) => {}
        Some(other) => outcome.diagnostics.push(LoadDiagnostic::InvalidSection {
            key: keys::READING_LIST,
            expected: "a list",
            found: kind_of(&other),
        }),
    }
}

fn read_books(items: Vec<Value>, outcome: &mut LoadOutcome) {
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(raw) => {
                let book = normalize_book(raw);
                if let Some(original) = outcome.library.insert_book(book) {
                    let replacement = outcome
                        .library
                        .books
                        .last()
                        .map(|b| b.id.clone())
                        .unwrap_or_else(BookId::generate);
                    outcome.diagnostics.push(LoadDiagnostic::DuplicateId {
                        original,
                        replacement,
                    });
                }
            }
            other => outcome.diagnostics.push(LoadDiagnostic::SkippedBook {
                index,
                found: kind_of(&other),
            }),
        }
    }
}

fn read_references(
    section: &str,
    items: Vec<Value>,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> Vec<BookId> {
    let mut ids = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::String(s) if !s.is_empty() => ids.push(BookId::from(s)),
            Value::Number(n) => ids.push(BookId::from(n.to_string())),
            other => diagnostics.push(LoadDiagnostic::SkippedReference {
                section: section.to_string(),
                index,
                found: kind_of(&other),
            }),
        }
    }
    ids
}

/// Human-readable name of a JSON value's type
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(s) if s.is_empty() => "an empty string",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
