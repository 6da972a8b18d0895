//! Standard Format Marker codec for Scripture documents
//!
//!     This crate converts between the structured [`Scripture`] model (books, sections,
//!     paragraphs of styled runs, footnotes, pictures, back translations and annotations) and
//!     flat marker streams such as USFM and Toolbox databases.
//!
//!     This is a pure lib, that is, it powers the sfm cli but is shell agnostic: no code
//!     here supposes a shell environment, be it std print, env vars etc. Hosts observe long
//!     running work through [`ProgressSink`].
//!
//! Architecture
//!
//!     The file structure :
//!     .
//!     ├── model                   # Document model, references, source/sink traits
//!     ├── reference               # Chapter/verse number grammar and reference tracker
//!     ├── styles                  # Style catalog and the marker ↔ style mapping table
//!     ├── markup                  # Segment scanner and marker writer
//!     ├── export                  # Model → marker stream
//!     ├── import                  # Marker stream → model, back translation sync
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── formats                 # usfm, toolbox, json, tree
//!     ├── config.rs
//!     ├── progress.rs
//!     └── error.rs
//!
//! Core Algorithms
//!
//!     Export walks the model in order and drives a [`reference::ReferenceTracker`] with every
//!     chapter and verse run; annotations and interleaved back translations are written as the
//!     reference crosses their position.
//!
//!     Import is the reverse: a flat stream of segments is folded into nested paragraphs with a
//!     frame stack, while back-translation segments are synchronized onto the vernacular
//!     paragraph they translate. A book that cannot be synchronized is rolled back without
//!     affecting the other books of the stream.
//!
//!     Both directions share one [`styles::MarkerMap`], so styles without a marker get a
//!     generated one on export and the same table resolves it on import.
//!
//! Dialects
//!
//!     [`Dialect::Inline`] closes character styles and notes with end markers on the same
//!     line (USFM). [`Dialect::StandAlone`] gives every marker its own line and adds record
//!     and verse reference lines (Toolbox).
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── common/mod.rs       # document builders shared by the suites
//!     ├── usfm/
//!     └── toolbox/
//!
//!     Rust does not discover tests in subdirectories, so tests/lib.rs includes them.

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod formats;
pub mod import;
pub mod markup;
pub mod model;
pub mod progress;
pub mod reference;
pub mod registry;
pub mod styles;

pub use config::CodecConfig;
pub use error::{ExportError, FormatError, ImportError, SyncFailure};
pub use export::{export_document, export_to_file, export_with};
pub use format::Format;
pub use import::{import_file, import_str, import_with, BookOutcome, ImportReport};
pub use markup::Dialect;
pub use model::{Scripture, ScriptureReference, ScriptureSink, ScriptureSource};
pub use progress::{spawn_import, ImportControl, NoProgress, ProgressSink};
pub use registry::FormatRegistry;
