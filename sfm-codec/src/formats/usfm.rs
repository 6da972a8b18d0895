//! USFM-style marker streams: character styles and notes closed inline.

use super::markers;
use crate::config::CodecConfig;
use crate::error::FormatError;
use crate::format::Format;
use crate::import::ImportReport;
use crate::markup::Dialect;
use crate::model::Scripture;
use crate::progress::{NoProgress, ProgressSink};

#[derive(Debug, Clone, Default)]
pub struct UsfmFormat {
    config: CodecConfig,
}

impl UsfmFormat {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }
}

impl Format for UsfmFormat {
    fn name(&self) -> &str {
        "usfm"
    }

    fn description(&self) -> &str {
        "USFM marker stream (inline character styles and notes)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["usfm", "sfm", "ptx"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse_into(
        &self,
        source: &str,
        file: &str,
        doc: &mut Scripture,
        progress: &dyn ProgressSink,
    ) -> Result<ImportReport, FormatError> {
        markers::parse_into(&self.config, Dialect::Inline, source, file, doc, progress)
    }

    fn serialize(&self, doc: &Scripture) -> Result<String, FormatError> {
        self.serialize_with_progress(doc, &NoProgress)
    }

    fn serialize_with_progress(
        &self,
        doc: &Scripture,
        progress: &dyn ProgressSink,
    ) -> Result<String, FormatError> {
        markers::serialize(&self.config, Dialect::Inline, doc, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARK: &str = "\\id MRK\n\\s Heading\n\\c 1\n\\p\n\\v 1 First\n\\v 2 Second\n";

    #[test]
    fn test_parse_and_serialize_are_inverse() {
        let format = UsfmFormat::default();
        let doc = format.parse(MARK).unwrap();
        let out = format.serialize(&doc).unwrap();
        assert_eq!(out, MARK);
        assert_eq!(format.parse(&out).unwrap(), doc);
    }

    #[test]
    fn test_detects_by_extension() {
        let format = UsfmFormat::default();
        assert!(format.file_extensions().contains(&"sfm"));
    }

    #[test]
    fn test_parse_into_existing_document_replaces_book() {
        let format = UsfmFormat::default();
        let mut doc = format.parse(MARK).unwrap();
        let report = format
            .parse_into("\\id MRK\n\\p replaced\n", "mrk.usfm", &mut doc, &NoProgress)
            .unwrap();
        assert_eq!(report.committed().count(), 1);
        assert_eq!(doc.books.len(), 1);
        assert_eq!(doc.books[0].sections[0].content[0].text(), "replaced");
    }
}
