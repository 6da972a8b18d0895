//! The Scripture document model shared by export and import.
//!
//! Books, sections and paragraphs are owned by the repository; the codec only
//! reads them on export and builds fresh ones on import.

pub mod nodes;
pub mod reference;
pub mod repository;

pub use nodes::*;
pub use reference::{book_code, book_number, ScriptureReference, BOOK_CODES};
pub use repository::{ScriptureSink, ScriptureSource};
