//! Format trait definition
//!
//! This module defines the Format trait that every document format implements.
//! The trait gives the registry and the CLI one interface for reading and
//! writing [`Scripture`] documents, whatever the text representation.

use crate::error::FormatError;
use crate::import::ImportReport;
use crate::model::{Scripture, ScriptureSink};
use crate::progress::{NoProgress, ProgressSink};

/// Trait for document formats
///
/// Implementors provide conversion between a text representation and the
/// [`Scripture`] model. Formats can support parsing, serialization, or both.
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, doc: &Scripture) -> Result<String, FormatError> {
///         Ok(format!("{} books", doc.books.len()))
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "usfm", "toolbox", "json")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format, without the leading dot.
    /// Used for automatic format detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (source → Scripture)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (Scripture → source)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a new document.
    ///
    /// Formats that support parsing override this, [`Format::parse_into`],
    /// or both; the defaults are written in terms of each other.
    fn parse(&self, source: &str) -> Result<Scripture, FormatError> {
        let mut doc = Scripture::default();
        self.parse_into(source, "<input>", &mut doc, &NoProgress)?;
        Ok(doc)
    }

    /// Parse source text into an existing document, committing book by book.
    ///
    /// The default implementation parses into a fresh document and commits
    /// its books and annotations, reporting every book as committed. Formats
    /// that can fail per book (marker streams) override this.
    fn parse_into(
        &self,
        source: &str,
        file: &str,
        doc: &mut Scripture,
        _progress: &dyn ProgressSink,
    ) -> Result<ImportReport, FormatError> {
        if !self.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{}' does not support parsing",
                self.name()
            )));
        }
        let parsed = self.parse(source)?;
        let mut report = ImportReport::new(file);
        for book in parsed.books {
            report.push(&book.code, crate::import::BookOutcome::Committed);
            report.footnotes += book.footnotes.len();
            report.pictures += book.pictures.len();
            doc.commit_book(book);
        }
        for annotation in parsed.annotations {
            if doc
                .find_annotation(annotation.begin, &annotation.discussion)
                .is_none()
            {
                doc.insert_annotation(annotation);
                report.annotations += 1;
            }
        }
        Ok(report)
    }

    /// Serialize a document into source text
    ///
    /// Default implementation returns NotSupported error.
    fn serialize(&self, _doc: &Scripture) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Serialize with progress reporting and cancellation. Formats without
    /// long-running output rely on the default, which ignores `progress`.
    fn serialize_with_progress(
        &self,
        doc: &Scripture,
        _progress: &dyn ProgressSink,
    ) -> Result<String, FormatError> {
        self.serialize(doc)
    }
}

