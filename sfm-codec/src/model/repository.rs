//! The narrow contract the codec needs from a document repository.
//!
//! Export reads through [`ScriptureSource`]; import writes through
//! [`ScriptureSink`]. [`Scripture`] implements both so the codec can run
//! entirely in memory.

use super::nodes::{Annotation, Book, Scripture};
use super::reference::ScriptureReference;

pub trait ScriptureSource {
    fn books(&self) -> &[Book];

    /// Annotations targeting a book, ordered by begin reference.
    /// Equal references keep their stored order.
    fn annotations_for(&self, book: u16) -> Vec<&Annotation>;
}

pub trait ScriptureSink {
    /// Stores a finished book, replacing a committed book with the same code.
    fn commit_book(&mut self, book: Book);

    /// Takes a committed book out of the repository so its layers can be extended.
    fn checkout_book(&mut self, code: &str) -> Option<Book>;

    fn insert_annotation(&mut self, annotation: Annotation);

    fn find_annotation(&self, begin: ScriptureReference, discussion: &str) -> Option<&Annotation>;
}

impl ScriptureSource for Scripture {
    fn books(&self) -> &[Book] {
        &self.books
    }

    fn annotations_for(&self, book: u16) -> Vec<&Annotation> {
        let mut found: Vec<&Annotation> = self
            .annotations
            .iter()
            .filter(|a| a.target.book == book)
            .collect();
        // stable: equal begins keep insertion order
        found.sort_by_key(|a| a.begin);
        found
    }
}

impl ScriptureSink for Scripture {
    fn commit_book(&mut self, book: Book) {
        match self.books.iter_mut().find(|b| b.code == book.code) {
            Some(existing) => *existing = book,
            None => {
                let at = self
                    .books
                    .iter()
                    .position(|b| b.canonical_number > book.canonical_number)
                    .unwrap_or(self.books.len());
                self.books.insert(at, book);
            }
        }
    }

    fn checkout_book(&mut self, code: &str) -> Option<Book> {
        let at = self.books.iter().position(|b| b.code == code)?;
        Some(self.books.remove(at))
    }

    fn insert_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    fn find_annotation(&self, begin: ScriptureReference, discussion: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.begin == begin && a.discussion == discussion)
    }
}
