//! JSON dump of the document model.
//!
//! Lossless: every field of [`Scripture`] is written, including back
//! translations and annotation targets, so a document can be stored and
//! reloaded without going through a marker stream.

use crate::error::FormatError;
use crate::format::Format;
use crate::model::Scripture;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Document model as pretty-printed JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Scripture, FormatError> {
        serde_json::from_str(source).map_err(|e| FormatError::ParseError(e.to_string()))
    }

    fn serialize(&self, doc: &Scripture) -> Result<String, FormatError> {
        serde_json::to_string_pretty(doc).map_err(|e| FormatError::SerializationError(e.to_string()))
    }
}
