//! Toolbox-style marker streams: one marker per line, record and verse
//! reference lines, pictures as separate field markers.

use super::markers;
use crate::config::CodecConfig;
use crate::error::FormatError;
use crate::format::Format;
use crate::import::ImportReport;
use crate::markup::Dialect;
use crate::model::Scripture;
use crate::progress::{NoProgress, ProgressSink};

#[derive(Debug, Clone, Default)]
pub struct ToolboxFormat {
    config: CodecConfig,
}

impl ToolboxFormat {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }
}

impl Format for ToolboxFormat {
    fn name(&self) -> &str {
        "toolbox"
    }

    fn description(&self) -> &str {
        "Toolbox database (stand-alone markers, record lines)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["db", "toolbox"]
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
        markers::parse_into(&self.config, Dialect::StandAlone, source, file, doc, progress)
    }

    fn serialize(&self, doc: &Scripture) -> Result<String, FormatError> {
        self.serialize_with_progress(doc, &NoProgress)
    }

    fn serialize_with_progress(
        &self,
        doc: &Scripture,
        progress: &dyn ProgressSink,
    ) -> Result<String, FormatError> {
        markers::serialize(&self.config, Dialect::StandAlone, doc, progress)
    }
}
