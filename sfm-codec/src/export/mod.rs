//! Document → marker stream.
//!
//! One [`BookWriter`] per book walks title, sections and paragraphs in order.
//! Chapter and verse runs drive the [`ReferenceTracker`]; every time the
//! reference moves, queued annotations that begin before the new position are
//! written, and (inline dialect, verse-text paragraphs) back-translation
//! segments are interleaved in front of the matching vernacular verse.
//!
//! Both dialects share one code path; [`Dialect`] only changes whether
//! character styles and notes are closed inline or start their own lines.

pub mod annotations;
pub mod back_translation;
mod notes;
mod paragraph;

use crate::config::CodecConfig;
use crate::error::ExportError;
use crate::markup::{Dialect, MarkerWriter};
use crate::model::{Annotation, Book, ScriptureSource};
use crate::progress::{NoProgress, ProgressSink};
use crate::reference::{NumberGrammar, ReferenceTracker};
use crate::styles::mapping::{ANNOTATION, ANNOTATION_CITED, ANNOTATION_REF, BOOK_ID, RECORD};
use crate::styles::MarkerMap;
use annotations::AnnotationQueue;
use paragraph::ParagraphRole;
use std::path::Path;

/// Exports with a fresh mapping table and no progress reporting.
pub fn export_document<S>(
    source: &S,
    config: &CodecConfig,
    dialect: Dialect,
) -> Result<String, ExportError>
where
    S: ScriptureSource + ?Sized,
{
    let mut map = config.marker_map();
    export_with(source, config, dialect, &mut map, &NoProgress)
}

/// Exports every book of `source`. Markers generated for unmapped styles are
/// added to `map` so a later import with the same table resolves them.
pub fn export_with<S>(
    source: &S,
    config: &CodecConfig,
    dialect: Dialect,
    map: &mut MarkerMap,
    progress: &dyn ProgressSink,
) -> Result<String, ExportError>
where
    S: ScriptureSource + ?Sized,
{
    let mut out = MarkerWriter::new();
    for book in source.books() {
        let queued = if config.include_annotations {
            source.annotations_for(book.canonical_number)
        } else {
            Vec::new()
        };
        progress.message(&format!("Exporting {}", book.code));
        BookWriter {
            book,
            config,
            grammar: config.grammar(),
            dialect,
            map: &mut *map,
            w: &mut out,
            tracker: ReferenceTracker::new(config.variant_passages.clone()),
            annotations: AnnotationQueue::new(queued),
            progress,
        }
        .write()?;
    }
    Ok(out.finish())
}

pub fn export_to_file<S>(
    source: &S,
    path: &Path,
    config: &CodecConfig,
    dialect: Dialect,
    progress: &dyn ProgressSink,
) -> Result<(), ExportError>
where
    S: ScriptureSource + ?Sized,
{
    let mut map = config.marker_map();
    let text = export_with(source, config, dialect, &mut map, progress)?;
    std::fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) struct BookWriter<'a, 'p> {
    book: &'a Book,
    config: &'p CodecConfig,
    grammar: NumberGrammar,
    dialect: Dialect,
    map: &'p mut MarkerMap,
    w: &'p mut MarkerWriter,
    tracker: ReferenceTracker,
    annotations: AnnotationQueue<'a>,
    progress: &'p dyn ProgressSink,
}

impl<'a> BookWriter<'a, '_> {
    fn write(mut self) -> Result<(), ExportError> {
        let book = self.book;
        tracing::info!(book = %book.code, sections = book.sections.len(), "exporting book");

        self.tracker.start_book(book.canonical_number);
        if !self.dialect.is_inline() {
            self.w.line(RECORD, &book.code);
        }
        self.w.line(BOOK_ID, &book.code);

        for para in &book.title {
            self.write_paragraph(para, ParagraphRole::Title);
        }
        for section in &book.sections {
            self.progress.wait_if_paused();
            if self.progress.is_cancelled() {
                tracing::info!(book = %book.code, "export cancelled");
                return Err(ExportError::Cancelled);
            }
            for para in &section.heading {
                self.write_paragraph(para, ParagraphRole::Heading);
            }
            for para in &section.content {
                self.write_paragraph(
                    para,
                    ParagraphRole::Content {
                        intro: section.intro,
                    },
                );
            }
            self.progress.step(1);
        }

        let rest = self.annotations.drain_all();
        self.write_annotations(rest);
        Ok(())
    }

    /// Writes annotations that begin before `boundary`.
    fn flush_annotations(&mut self, boundary: crate::model::ScriptureReference) {
        let due = self.annotations.drain_before(boundary);
        self.write_annotations(due);
    }

    fn write_annotations(&mut self, due: Vec<&'a Annotation>) {
        for annotation in due {
            self.w
                .line(ANNOTATION, &annotation.discussion.replace('\n', " "));
            if annotation.begin != self.tracker.current() || annotation.end != annotation.begin {
                let mut range = format!("{} {}", self.book.code, annotation.begin.chapter_verse());
                if annotation.end != annotation.begin {
                    range.push('-');
                    range.push_str(&annotation.end.chapter_verse());
                }
                self.w.line(ANNOTATION_REF, &range);
            }
            if let Some(cited) = &annotation.cited_text {
                self.w.line(ANNOTATION_CITED, &cited.replace('\n', " "));
            }
        }
    }
}
