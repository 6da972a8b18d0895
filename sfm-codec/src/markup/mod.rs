//! The marker stream: dialects, tokenizing and line writing.

pub mod scanner;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use scanner::{end_markers, scan, Segment};
pub use writer::MarkerWriter;

/// The two layouts of a marker stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// USFM-like: character styles and notes are closed with `\marker*`.
    #[default]
    Inline,
    /// Toolbox-like: every marker starts a line and nothing is closed.
    StandAlone,
}

impl Dialect {
    pub fn is_inline(self) -> bool {
        self == Dialect::Inline
    }
}

/// Which parallel stream a segment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Domain {
    Main,
    BackTranslation(String),
    Annotations,
}
