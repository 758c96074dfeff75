//! Library statistics
//!
//! Aggregates over the book collection: totals, distributions by genre,
//! author and year, completion rates, and growth over time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Book, Library, DATE_ADDED_FORMAT};

/// Label used for books without a genre
pub const UNKNOWN_GENRE: &str = "Unknown";

/// A label with a count, sorted by count descending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub label: String,
    pub count: usize,
}

/// Share of a genre's books that have been read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreCompletion {
    pub genre: String,
    pub total: usize,
    pub read: usize,
    pub rate: f64,
}

/// Books added and read in one month, with running totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProgress {
    /// `YYYY-MM`
    pub month: String,
    pub added: usize,
    pub read: usize,
    pub cumulative_added: usize,
    pub cumulative_read: usize,
}

/// Summary of one collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    /// Members that still exist in the library
    pub book_count: usize,
    pub read_count: usize,
    pub read_percentage: f64,
}

/// Aggregate statistics for a library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub read_books: usize,
    pub unread_books: usize,
    pub read_percentage: f64,
    /// Distinct genres, compared case-insensitively
    pub genre_count: usize,
    /// Distinct authors, compared case-insensitively
    pub author_count: usize,
    /// Mean over rated books (rating > 0)
    pub average_rating: Option<f64>,
    pub books_by_genre: Vec<Count>,
    pub top_authors: Vec<Count>,
    /// Books per publication year, ascending, unknown years excluded
    pub books_by_year: Vec<(u32, usize)>,
    pub genre_completion: Vec<GenreCompletion>,
    pub monthly_progress: Vec<MonthlyProgress>,
}

impl LibraryStats {
    /// How many authors `top_authors` keeps
    pub const TOP_AUTHORS: usize = 10;

    pub fn compute(library: &Library) -> Self {
        let books = library.books();
        let total_books = books.len();
        let read_books = books.iter().filter(|b| b.read).count();

        let genre_count = distinct_lowercase(books.iter().map(|b| b.genre.as_str()));
        let author_count = distinct_lowercase(books.iter().map(|b| b.author.as_str()));

        let ratings: Vec<u8> = books.iter().map(|b| b.rating).filter(|r| *r > 0).collect();
        let average_rating = (!ratings.is_empty())
            .then(|| ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64);

        let books_by_genre = count_by(books.iter().map(genre_label));
        let mut top_authors = count_by(
            books
                .iter()
                .map(|b| b.author.as_str())
                .filter(|a| !a.trim().is_empty()),
        );
        top_authors.truncate(Self::TOP_AUTHORS);

        let mut by_year: BTreeMap<u32, usize> = BTreeMap::new();
        for book in books.iter().filter(|b| b.year > 0) {
            *by_year.entry(book.year).or_default() += 1;
        }

        Self {
            total_books,
            read_books,
            unread_books: total_books - read_books,
            read_percentage: percentage(read_books, total_books),
            genre_count,
            author_count,
            average_rating,
            books_by_genre,
            top_authors,
            books_by_year: by_year.into_iter().collect(),
            genre_completion: genre_completion(books),
            monthly_progress: monthly_progress(books),
        }
    }
}

/// Per-collection counts, in collection name order
pub fn collection_summaries(library: &Library) -> Vec<CollectionSummary> {
    library
        .collections()
        .keys()
        .map(|name| {
            let books = library.collection_books(name).unwrap_or_default();
            let read_count = books.iter().filter(|b| b.read).count();
            CollectionSummary {
                name: name.clone(),
                book_count: books.len(),
                read_count,
                read_percentage: percentage(read_count, books.len()),
            }
        })
        .collect()
}

fn genre_label(book: &Book) -> &str {
    if book.genre.trim().is_empty() {
        UNKNOWN_GENRE
    } else {
        &book.genre
    }
}

/// Genres and authors are grouped ignoring case and surrounding whitespace
fn group_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn distinct_lowercase<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values
        .filter(|v| !v.trim().is_empty())
        .map(group_key)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Count values per group, labelled with the first spelling seen
fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> Vec<Count> {
    let mut counts: HashMap<String, Count> = HashMap::new();
    for value in values {
        counts
            .entry(group_key(value))
            .or_insert_with(|| Count {
                label: value.trim().to_string(),
                count: 0,
            })
            .count += 1;
    }
    let mut counts: Vec<Count> = counts.into_values().collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

fn genre_completion(books: &[Book]) -> Vec<GenreCompletion> {
    // key -> (label, total, read)
    let mut totals: BTreeMap<String, (String, usize, usize)> = BTreeMap::new();
    for book in books.iter().filter(|b| !b.genre.trim().is_empty()) {
        let entry = totals
            .entry(group_key(&book.genre))
            .or_insert_with(|| (book.genre.trim().to_string(), 0, 0));
        entry.1 += 1;
        if book.read {
            entry.2 += 1;
        }
    }

    let mut completion: Vec<GenreCompletion> = totals
        .into_values()
        .map(|(genre, total, read)| GenreCompletion {
            genre,
            total,
            read,
            rate: percentage(read, total),
        })
        .collect();
    completion.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.genre.cmp(&b.genre)));
    completion
}

fn monthly_progress(books: &[Book]) -> Vec<MonthlyProgress> {
    let mut months: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for book in books {
        let Ok(added) = NaiveDateTime::parse_from_str(&book.date_added, DATE_ADDED_FORMAT) else {
            continue;
        };
        let entry = months
            .entry(added.format("%Y-%m").to_string())
            .or_default();
        entry.0 += 1;
        if book.read {
            entry.1 += 1;
        }
    }

    let (mut cumulative_added, mut cumulative_read) = (0, 0);
    months
        .into_iter()
        .map(|(month, (added, read))| {
            cumulative_added += added;
            cumulative_read += read;
            MonthlyProgress {
                month,
                added,
                read,
                cumulative_added,
                cumulative_read,
            }
        })
        .collect()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
