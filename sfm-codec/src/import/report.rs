//! What an import did, book by book.

use crate::error::SyncFailure;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum BookOutcome {
    Committed,
    /// A back-translation or annotation segment could not be placed; the
    /// book was rolled back to its state before the import.
    Aborted { failure: SyncFailure },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookReport {
    pub code: String,
    #[serde(flatten)]
    pub outcome: BookOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub file: String,
    pub books: Vec<BookReport>,
    /// Styles synthesized for unknown markers that carried content.
    pub new_styles: Vec<String>,
    pub footnotes: usize,
    pub pictures: usize,
    pub annotations: usize,
    /// The host cancelled the import before the stream ended.
    pub cancelled: bool,
}

impl ImportReport {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            ..Self::default()
        }
    }

    pub fn committed(&self) -> impl Iterator<Item = &BookReport> {
        self.books
            .iter()
            .filter(|b| b.outcome == BookOutcome::Committed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncFailure> {
        self.books.iter().filter_map(|b| match &b.outcome {
            BookOutcome::Aborted { failure } => Some(failure),
            _ => None,
        })
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn push(&mut self, code: &str, outcome: BookOutcome) {
        self.books.push(BookReport {
            code: code.to_string(),
            outcome,
        });
    }
}
