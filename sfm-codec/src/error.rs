//! Error types for codec and format operations

use crate::model::ScriptureReference;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// A back-translation or annotation segment that has no vernacular anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{file}:{line}: {reason} at `{marker} {text}` (near {reference})")]
pub struct SyncFailure {
    pub file: String,
    pub line: usize,
    pub marker: String,
    pub text: String,
    pub reference: ScriptureReference,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// A synchronization failure outside of any book.
    #[error(transparent)]
    Sync(#[from] SyncFailure),
    #[error("no book (\\id) found in {0}")]
    NoBooks(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("export cancelled")]
    Cancelled,
}

/// Errors that can occur during format operations
#[derive(Debug, Error)]
pub enum FormatError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Format does not support the operation
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
