//! Shared plumbing of the two marker-stream formats.

use crate::config::CodecConfig;
use crate::error::FormatError;
use crate::export::export_with;
use crate::import::{import_with, ImportReport};
use crate::markup::Dialect;
use crate::model::Scripture;
use crate::progress::ProgressSink;

pub(super) fn parse_into(
    config: &CodecConfig,
    dialect: Dialect,
    source: &str,
    file: &str,
    doc: &mut Scripture,
    progress: &dyn ProgressSink,
) -> Result<ImportReport, FormatError> {
    let mut map = config.marker_map();
    let report = import_with(source, file, doc, config, dialect, &mut map, progress)?;
    for failure in report.failures() {
        tracing::warn!(%failure, "book not imported");
    }
    Ok(report)
}

pub(super) fn serialize(
    config: &CodecConfig,
    dialect: Dialect,
    doc: &Scripture,
    progress: &dyn ProgressSink,
) -> Result<String, FormatError> {
    let mut map = config.marker_map();
    Ok(export_with(doc, config, dialect, &mut map, progress)?)
}
