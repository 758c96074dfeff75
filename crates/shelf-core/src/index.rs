//! Collections and the reading list
//!
//! A collection is a named, ordered set of book ids; the reading list is an
//! ordered queue of ids. Both hold plain ids, so a deleted book simply leaves
//! a dangling reference behind. Lookups resolve only the ids that still
//! exist.

use thiserror::Error;

use crate::models::{Book, BookId, Library};

/// Errors from collection and reading-list operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("A collection named '{0}' already exists")]
    DuplicateName(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection name cannot be empty")]
    EmptyName,

    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error("Book is already read: {0}")]
    AlreadyRead(BookId),
}

impl Library {
    // ==================== Collections ====================

    /// Create an empty collection
    ///
    /// Names are matched exactly and case-sensitively.
    pub fn create_collection(&mut self, name: &str) -> Result<(), IndexError> {
        if name.trim().is_empty() {
            return Err(IndexError::EmptyName);
        }
        if self.collections.contains_key(name) {
            return Err(IndexError::DuplicateName(name.to_string()));
        }
        self.collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Delete a collection, returning whether it existed
    pub fn delete_collection(&mut self, name: &str) -> bool {
        self.collections.remove(name).is_some()
    }

    /// Add a book to a collection, returning false if it was already a member
    pub fn add_to_collection(&mut self, name: &str, id: &BookId) -> Result<bool, IndexError> {
        let members = self
            .collections
            .get_mut(name)
            .ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))?;

        if members.contains(id) {
            return Ok(false);
        }
        members.push(id.clone());
        Ok(true)
    }

    /// Remove a book from a collection, returning whether anything changed
    pub fn remove_from_collection(&mut self, name: &str, id: &BookId) -> bool {
        match self.collections.get_mut(name) {
            Some(members) => {
                let before = members.len();
                members.retain(|m| m != id);
                members.len() != before
            }
            None => false,
        }
    }

    /// Remove every collection
    pub fn clear_collections(&mut self) {
        self.collections.clear();
    }

    /// Books of a collection that still exist, in member order
    pub fn collection_books(&self, name: &str) -> Option<Vec<&Book>> {
        let members = self.collections.get(name)?;
        Some(members.iter().filter_map(|id| self.book(id)).collect())
    }

    /// Names of the collections containing a book
    pub fn collections_containing(&self, id: &BookId) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|(_, members)| members.contains(id))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    // ==================== Reading List ====================

    /// Append a book to the reading list
    ///
    /// The queue itself does not enforce uniqueness; callers check
    /// `is_on_reading_list` first.
    pub fn add_to_reading_list(&mut self, id: BookId) {
        self.reading_list.push(id);
    }

    /// Take a book off the reading list, returning whether it was on it
    pub fn remove_from_reading_list(&mut self, id: &BookId) -> bool {
        let before = self.reading_list.len();
        self.reading_list.retain(|entry| entry != id);
        self.reading_list.len() != before
    }

    pub fn is_on_reading_list(&self, id: &BookId) -> bool {
        self.reading_list.contains(id)
    }

    /// Empty the reading list
    pub fn clear_reading_list(&mut self) {
        self.reading_list.clear();
    }

    /// Reading-list books that still exist, in queue order
    pub fn reading_list_books(&self) -> Vec<&Book> {
        self.reading_list
            .iter()
            .filter_map(|id| self.book(id))
            .collect()
    }

    /// Mark a book read and take it off the reading list
    ///
    /// Both changes happen together; an unknown id changes nothing.
    pub fn mark_read(&mut self, id: &BookId) -> Result<(), IndexError> {
        let book = self
            .book_mut(id)
            .ok_or_else(|| IndexError::BookNotFound(id.clone()))?;
        book.read = true;
        self.remove_from_reading_list(id);
        Ok(())
    }

    /// Mark every book on the reading list read and empty the list
    ///
    /// Returns how many books were marked.
    pub fn mark_all_read(&mut self) -> usize {
        let queued = std::mem::take(&mut self.reading_list);
        let mut marked = 0;
        for id in &queued {
            if let Some(book) = self.book_mut(id) {
                if !book.read {
                    book.read = true;
                    marked += 1;
                }
            }
        }
        marked
    }
}
