//! Browsing and searching
//!
//! Pure functions over a slice of books: read-status filter, sorting, text
//! search, and the most recently added books.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::Book;

/// Filter on read status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadFilter {
    pub fn matches(self, book: &Book) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Read => book.read,
            ReadFilter::Unread => !book.read,
        }
    }
}

/// Field to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Title,
    Author,
    Year,
    Genre,
    DateAdded,
}

impl SortKey {
    fn compare(self, a: &Book, b: &Book) -> Ordering {
        match self {
            SortKey::Title => cmp_text(&a.title, &b.title),
            SortKey::Author => cmp_text(&a.author, &b.author),
            SortKey::Year => a.year.cmp(&b.year),
            SortKey::Genre => cmp_text(&a.genre, &b.genre),
            SortKey::DateAdded => a.date_added.cmp(&b.date_added),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "title" => Ok(SortKey::Title),
            "author" => Ok(SortKey::Author),
            "year" => Ok(SortKey::Year),
            "genre" => Ok(SortKey::Genre),
            "date_added" | "added" => Ok(SortKey::DateAdded),
            other => Err(format!(
                "unknown sort key '{}' (expected title, author, year, genre, date-added)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filter and sort books for display
///
/// The sort is stable, so books with equal keys keep library order.
pub fn browse(books: &[Book], filter: ReadFilter, key: SortKey, order: SortOrder) -> Vec<&Book> {
    let mut selected: Vec<&Book> = books.iter().filter(|b| filter.matches(b)).collect();
    selected.sort_by(|a, b| {
        let ordering = key.compare(a, b);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    selected
}

/// The `count` most recently added books, newest first
pub fn recent(books: &[Book], count: usize) -> Vec<&Book> {
    let mut sorted = browse(books, ReadFilter::All, SortKey::DateAdded, SortOrder::Descending);
    sorted.truncate(count);
    sorted
}

/// Which text a search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    Title,
    Author,
    Genre,
    Tags,
    #[default]
    All,
}

impl SearchField {
    fn haystack(self, book: &Book) -> String {
        match self {
            SearchField::Title => book.title.clone(),
            SearchField::Author => book.author.clone(),
            SearchField::Genre => book.genre.clone(),
            SearchField::Tags => book.tags.join(" "),
            SearchField::All => [
                book.title.as_str(),
                book.author.as_str(),
                book.genre.as_str(),
                book.notes.as_str(),
                &book.tags.join(" "),
            ]
            .join(" "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
}

/// A text search over books
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub term: String,
    pub field: SearchField,
    pub match_type: MatchType,
    pub case_sensitive: bool,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        let haystack = self.field.haystack(book);
        let (haystack, term) = if self.case_sensitive {
            (haystack, self.term.clone())
        } else {
            (haystack.to_lowercase(), self.term.to_lowercase())
        };

        match self.match_type {
            MatchType::Contains => haystack.contains(&term),
            MatchType::Exact => haystack == term,
        }
    }
}

/// Books matching a query, in library order
///
/// An empty term matches nothing.
pub fn search<'a>(books: &'a [Book], query: &SearchQuery) -> Vec<&'a Book> {
    if query.term.is_empty() {
        return Vec::new();
    }
    books.iter().filter(|b| query.matches(b)).collect()
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{new_book, NewBook};

    fn book(title: &str, author: &str, year: u32, read: bool, added: &str) -> Book {
        let mut fields = NewBook::new(title, author);
        fields.year = year;
        fields.read = read;
        let mut book = new_book(fields).unwrap();
        book.date_added = added.to_string();
        book
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("dune", "Herbert", 1965, true, "2024-01-03 10:00:00"),
            book("Beloved", "Morrison", 1987, false, "2024-01-01 10:00:00"),
            book("Anathem", "Stephenson", 2008, false, "2024-01-02 10:00:00"),
            book("Ubik", "Dick", 969, true, "2024-01-04 10:00:00"),
        ]
    }

    fn titles(books: &[&Book]) -> Vec<String> {
        books.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn test_sort_by_title_ignores_case() {
        let books = shelf();
        let sorted = browse(&books, ReadFilter::All, SortKey::Title, SortOrder::Ascending);
        assert_eq!(titles(&sorted), vec!["Anathem", "Beloved", "dune", "Ubik"]);
    }

    #[test]
    fn test_sort_by_year_is_numeric() {
        let books = shelf();
        let sorted = browse(&books, ReadFilter::All, SortKey::Year, SortOrder::Descending);
        assert_eq!(titles(&sorted), vec!["Anathem", "Beloved", "dune", "Ubik"]);
    }

    #[test]
    fn test_read_filter() {
        let books = shelf();
        let read = browse(&books, ReadFilter::Read, SortKey::Title, SortOrder::Ascending);
        assert_eq!(titles(&read), vec!["dune", "Ubik"]);

        let unread = browse(&books, ReadFilter::Unread, SortKey::Title, SortOrder::Ascending);
        assert_eq!(titles(&unread), vec!["Anathem", "Beloved"]);
    }

    #[test]
    fn test_recent() {
        let books = shelf();
        assert_eq!(titles(&recent(&books, 2)), vec!["Ubik", "dune"]);
        assert_eq!(recent(&books, 10).len(), 4);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("Date Added".parse::<SortKey>().unwrap(), SortKey::DateAdded);
        assert_eq!("date-added".parse::<SortKey>().unwrap(), SortKey::DateAdded);
        assert_eq!("YEAR".parse::<SortKey>().unwrap(), SortKey::Year);
        assert!("pages".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_search_contains() {
        let books = shelf();
        let query = SearchQuery {
            field: SearchField::Author,
            ..SearchQuery::new("son")
        };
        assert_eq!(titles(&search(&books, &query)), vec!["Beloved", "Anathem"]);
    }

    #[test]
    fn test_search_exact_and_case() {
        let books = shelf();
        let mut query = SearchQuery {
            field: SearchField::Title,
            match_type: MatchType::Exact,
            ..SearchQuery::new("Dune")
        };
        assert_eq!(search(&books, &query).len(), 1);

        query.case_sensitive = true;
        assert!(search(&books, &query).is_empty());
    }

    #[test]
    fn test_search_tags_and_all_fields() {
        let mut books = shelf();
        books[2].tags = vec!["clocks".to_string(), "monastery".to_string()];
        books[1].notes = "Book club pick".to_string();

        let query = SearchQuery {
            field: SearchField::Tags,
            ..SearchQuery::new("monastery")
        };
        assert_eq!(titles(&search(&books, &query)), vec!["Anathem"]);

        let query = SearchQuery::new("club");
        assert_eq!(titles(&search(&books, &query)), vec!["Beloved"]);
    }

    #[test]
    fn test_empty_search_term() {
        let books = shelf();
        assert!(search(&books, &SearchQuery::new("")).is_empty());
    }
}
