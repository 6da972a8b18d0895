//! Marker stream → document.
//!
//! The stream is scanned into segments and each segment is resolved through
//! the pass's [`MarkerMap`] into a role and a domain. Main-domain segments
//! build titles, sections, paragraphs and notes; back-translation segments
//! are synchronized onto vernacular paragraphs; annotation segments are
//! collected and inserted after their book commits.
//!
//! Every `\id` starts a book. A book whose back translation or annotation
//! cannot be placed is rolled back and reported; the import continues with
//! the next book.

pub mod report;
mod pictures;
mod state;
mod sync;
mod vernacular;

pub use report::{BookOutcome, BookReport, ImportReport};

use crate::config::CodecConfig;
use crate::error::{ImportError, SyncFailure};
use crate::markup::{end_markers, scan, Dialect, Domain, Segment};
use crate::model::{Annotation, Book, Scripture, ScriptureReference, ScriptureSink};
use crate::progress::{NoProgress, ProgressSink};
use crate::styles::{MarkerMap, MarkerRole, ResolvedMarker, StyleFunction};
use state::{BookBuild, BookMode, Frame, Pass};
use std::path::Path;

/// Imports into a fresh [`Scripture`] with a fresh mapping table.
pub fn import_str(
    source: &str,
    config: &CodecConfig,
    dialect: Dialect,
) -> Result<(Scripture, ImportReport), ImportError> {
    let mut doc = Scripture::default();
    let mut map = config.marker_map();
    let report = import_with(source, "<input>", &mut doc, config, dialect, &mut map, &NoProgress)?;
    Ok((doc, report))
}

/// Imports `source` into `sink`. Books are committed one at a time, so a
/// failure in one book leaves the others in place.
pub fn import_with<S>(
    source: &str,
    file: &str,
    sink: &mut S,
    config: &CodecConfig,
    dialect: Dialect,
    map: &mut MarkerMap,
    progress: &dyn ProgressSink,
) -> Result<ImportReport, ImportError>
where
    S: ScriptureSink + ?Sized,
{
    let segments = scan(source);
    map.note_end_markers(end_markers(&segments));
    tracing::debug!(file, segments = segments.len(), ?dialect, "importing");

    let mut pass = Pass {
        file,
        config,
        grammar: config.grammar(),
        dialect,
        map,
        progress,
    };
    let mut importer = Importer {
        sink,
        report: ImportReport::new(file),
        book: None,
        skipping: false,
        books_seen: 0,
    };

    for seg in &segments {
        pass.progress.wait_if_paused();
        if pass.progress.is_cancelled() {
            importer.cancel();
            break;
        }
        importer.segment(&mut pass, seg)?;
    }
    if !importer.report.was_cancelled() {
        let last_line = segments.last().map_or(1, |s| s.line);
        importer.finish_book(&mut pass, None, last_line);
    }

    if importer.books_seen == 0 && !importer.report.cancelled {
        return Err(ImportError::NoBooks(file.to_string()));
    }
    let mut report = importer.report;
    report.new_styles = pass.map.prune_unused();
    tracing::info!(
        file,
        committed = report.committed().count(),
        failed = report.failures().count(),
        "import finished"
    );
    Ok(report)
}

pub fn import_file<S>(
    path: &Path,
    sink: &mut S,
    config: &CodecConfig,
    dialect: Dialect,
    progress: &dyn ProgressSink,
) -> Result<ImportReport, ImportError>
where
    S: ScriptureSink + ?Sized,
{
    let source = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut map = config.marker_map();
    import_with(
        &source,
        &path.display().to_string(),
        sink,
        config,
        dialect,
        &mut map,
        progress,
    )
}

struct Importer<'s, S: ?Sized> {
    sink: &'s mut S,
    report: ImportReport,
    book: Option<BookBuild>,
    /// Dropping segments until the next `\id` after a failure.
    skipping: bool,
    books_seen: usize,
}

impl<S: ScriptureSink + ?Sized> Importer<'_, S> {
    fn segment(&mut self, pass: &mut Pass<'_>, seg: &Segment) -> Result<(), ImportError> {
        let resolved = pass.map.resolve(&seg.marker);
        if resolved.role == MarkerRole::BookId {
            self.finish_book(pass, Some(seg), seg.line);
            self.start_book(pass, seg);
            return Ok(());
        }
        if self.skipping {
            return Ok(());
        }

        let Some(build) = self.book.as_mut() else {
            if resolved.domain == Domain::Annotations {
                return Err(SyncFailure {
                    file: pass.file.to_string(),
                    line: seg.line,
                    marker: seg.marker.clone(),
                    text: seg.text.clone(),
                    reference: ScriptureReference::default(),
                    reason: "annotation outside of any book".to_string(),
                }
                .into());
            }
            tracing::debug!(line = seg.line, marker = %seg.marker, "segment before the first book ignored");
            return Ok(());
        };

        if matches!(resolved.domain, Domain::BackTranslation(_)) && build.mode == BookMode::Pending {
            let code = build.book.code.clone();
            match self.sink.checkout_book(&code) {
                Some(existing) => build.begin_back_translation_only(existing),
                None => {
                    let failure = build.failure(pass, seg, "back translation for a book with no vernacular");
                    self.abort(failure);
                    return Ok(());
                }
            }
        }

        if let Err(failure) = build.dispatch(pass, &resolved, seg) {
            self.abort(failure);
        }
        Ok(())
    }

    fn start_book(&mut self, pass: &Pass<'_>, seg: &Segment) {
        self.skipping = false;
        let code = seg.text.split_whitespace().next().unwrap_or_default();
        if code.is_empty() {
            tracing::warn!(line = seg.line, "book marker without a code; skipping book");
            self.skipping = true;
            return;
        }
        self.books_seen += 1;
        pass.progress.message(&format!("Importing {code}"));
        let build = BookBuild::new(code, pass.config);
        tracing::info!(book = %build.book.code, line = seg.line, "importing book");
        self.book = Some(build);
    }

    /// Commits the current book. `next` is the segment that ended it, if any.
    fn finish_book(&mut self, pass: &mut Pass<'_>, next: Option<&Segment>, line: usize) {
        let Some(mut build) = self.book.take() else {
            return;
        };
        let code = build.book.code.clone();
        if build.mode == BookMode::Pending && build.is_blank() {
            if let Some(existing) = self.sink.checkout_book(&code) {
                build.begin_back_translation_only(existing);
            }
        }

        let end = next.cloned().unwrap_or_else(|| Segment {
            marker: "end of input".to_string(),
            text: String::new(),
            line,
            ends_line: true,
        });
        let finished = build.finish(pass, &end);
        if !finished.back_translation_only {
            self.report.footnotes += finished.book.footnotes.len();
            self.report.pictures += finished.book.pictures.len();
        }
        self.sink.commit_book(finished.book);
        // only annotations the sink held before this book count as duplicates
        let fresh: Vec<Annotation> = finished
            .annotations
            .into_iter()
            .filter(|annotation| {
                let known = self
                    .sink
                    .find_annotation(annotation.begin, &annotation.discussion)
                    .is_some();
                if known {
                    tracing::debug!(reference = %annotation.begin, "duplicate annotation skipped");
                }
                !known
            })
            .collect();
        for annotation in fresh {
            self.sink.insert_annotation(annotation);
            self.report.annotations += 1;
        }
        tracing::info!(book = %code, "book committed");
        self.report.push(&code, BookOutcome::Committed);
    }

    /// Rolls back the current book and skips to the next one.
    fn abort(&mut self, failure: SyncFailure) {
        tracing::warn!(%failure, "book import aborted");
        if let Some(build) = self.book.take() {
            if let Some(original) = build.original {
                self.sink.commit_book(original);
            }
            self.report
                .push(&build.book.code, BookOutcome::Aborted { failure });
        }
        self.skipping = true;
    }

    fn cancel(&mut self) {
        tracing::info!("import cancelled");
        self.report.cancelled = true;
        if let Some(build) = self.book.take() {
            if let Some(original) = build.original {
                self.sink.commit_book(original);
            }
            self.report.push(&build.book.code, BookOutcome::Cancelled);
        }
    }
}

/// A book ready to commit.
struct Finished {
    book: Book,
    annotations: Vec<Annotation>,
    back_translation_only: bool,
}

impl BookBuild {
    /// Nothing has been parsed into the book yet.
    fn is_blank(&self) -> bool {
        self.pending_chapter.is_none()
            && self.frames.is_empty()
            && self.book.title.is_empty()
            && self.book.sections.is_empty()
    }

    fn dispatch(&mut self, pass: &mut Pass<'_>, resolved: &ResolvedMarker, seg: &Segment) -> Result<(), SyncFailure> {
        if !matches!(resolved.role, MarkerRole::Picture(_)) {
            self.picture = None;
        }
        if resolved.domain != Domain::Annotations {
            self.close_annotation();
        }

        match &resolved.domain {
            Domain::Annotations => {
                if let MarkerRole::Annotation(field) = resolved.role {
                    self.annotation(pass, field, seg)?;
                }
            }
            Domain::BackTranslation(ws) => self.back_translation(pass, ws, &resolved.role, seg)?,
            Domain::Main => {
                let tracks_only = self.mode == BookMode::BackTranslationOnly
                    && matches!(
                        &resolved.role,
                        MarkerRole::Style(p) if matches!(p.function, StyleFunction::Chapter | StyleFunction::Verse)
                    );
                if !tracks_only {
                    self.clear_bt_anchors();
                }
                if self.main(pass, &resolved.role, seg) && seg.ends_line {
                    self.mark_line_end();
                }
            }
        }
        Ok(())
    }

    /// Returns whether the segment ended with plain text.
    fn main(&mut self, pass: &mut Pass<'_>, role: &MarkerRole, seg: &Segment) -> bool {
        match role {
            MarkerRole::Style(proxy) => self.style(pass, proxy, seg),
            MarkerRole::End(opening) => self.end_marker(pass, opening, seg),
            MarkerRole::Picture(field) => {
                self.picture_field(pass, *field, seg);
                false
            }
            MarkerRole::InlinePicture => {
                self.inline_picture(pass, seg);
                false
            }
            MarkerRole::Record | MarkerRole::VerseRef => {
                tracing::trace!(line = seg.line, marker = %seg.marker, text = %seg.text, "record marker");
                false
            }
            MarkerRole::BookId | MarkerRole::Annotation(_) | MarkerRole::AlternateVerse => false,
        }
    }

    fn finish(mut self, pass: &mut Pass<'_>, end: &Segment) -> Finished {
        self.close_annotation();
        let back_translation_only = self.mode == BookMode::BackTranslationOnly;
        if !back_translation_only {
            if self.pending_chapter.is_some() {
                self.ensure_content_paragraph(pass, end);
                self.insert_pending_chapter();
            }
            while let Some(Frame::Footnote(note)) = self.frames.last() {
                if pass.dialect.is_inline() {
                    tracing::warn!(marker = %note.marker, "note not closed at end of book");
                }
                self.frames.pop();
            }
            while !self.frames.is_empty() {
                self.store_paragraph();
            }
            self.close_section();
        }
        for paragraph in self.book.paragraphs_mut() {
            paragraph.back_translations.prune();
        }
        Finished {
            book: self.book,
            annotations: self.annotations,
            back_translation_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ImportControl;
    use std::cell::Cell;

    #[test]
    fn test_no_books_is_an_error() {
        let result = import_str("\\p text without a book\n", &CodecConfig::default(), Dialect::Inline);
        assert!(matches!(result, Err(ImportError::NoBooks(_))));
    }

    #[test]
    fn test_annotation_before_book_is_an_error() {
        let result = import_str("\\rem stray\n\\id MRK\n", &CodecConfig::default(), Dialect::Inline);
        assert!(matches!(result, Err(ImportError::Sync(_))));
    }

    #[test]
    fn test_blank_book_commits() {
        let (doc, report) = import_str("\\id MRK\n", &CodecConfig::default(), Dialect::Inline).unwrap();
        assert_eq!(doc.books.len(), 1);
        assert!(doc.books[0].sections.is_empty());
        assert_eq!(report.committed().count(), 1);
    }

    #[test]
    fn test_annotations_follow_the_reference() {
        let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n\\rem check this\n\\remq uno\n\\v 2 dos\n\\rem range\n\\remref MRK 1:2-1:4\n";
        let (doc, report) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert_eq!(report.annotations, 2);
        let first = &doc.annotations[0];
        assert_eq!(first.begin, ScriptureReference::new(41, 1, 1));
        assert_eq!(first.cited_text.as_deref(), Some("uno"));
        let second = &doc.annotations[1];
        assert_eq!(second.begin, ScriptureReference::new(41, 1, 2));
        assert_eq!(second.end, ScriptureReference::new(41, 1, 4));

        // annotation lines do not interrupt the paragraph
        let texts: Vec<_> = doc.books[0].sections[0].content[0]
            .runs
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(texts, vec!["1", "1", "uno ", "2", "dos"]);
    }

    #[test]
    fn test_identical_annotations_at_one_verse_are_kept() {
        let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n\\rem check\n\\rem check\n";
        let config = CodecConfig::default();
        let (mut doc, report) = import_str(source, &config, Dialect::Inline).unwrap();
        assert_eq!(report.annotations, 2);
        assert_eq!(doc.annotations.len(), 2);

        // importing the same stream again adds nothing
        let mut map = config.marker_map();
        let again = import_with(
            source,
            "mrk.sfm",
            &mut doc,
            &config,
            Dialect::Inline,
            &mut map,
            &crate::progress::NoProgress,
        )
        .unwrap();
        assert_eq!(again.annotations, 0);
        assert_eq!(doc.annotations.len(), 2);
    }

    #[test]
    fn test_orphan_cited_text_aborts_book_only() {
        let source = "\\id MRK\n\\p\n\\remq orphan\n\\id LUK\n\\p text\n";
        let (doc, report) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line, 3);
        assert_eq!(failures[0].marker, "\\remq");
        let codes: Vec<_> = doc.books.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["LUK"]);
    }

    #[test]
    fn test_interleaved_back_translation_infers_numbers() {
        let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n\\btvt one\n\\v 2 dos\n\\btvt two\n";
        let (doc, _) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
        let para = &doc.books[0].sections[0].content[0];
        let bt = para.back_translations.get("en").unwrap();
        let texts: Vec<_> = bt.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "1", "one ", "2", "two"]);
        assert!(bt.runs.iter().all(|r| r.ws == "en"));
    }

    #[test]
    fn test_back_translation_for_missing_book_aborts() {
        let source = "\\id MRK\n\\btp one\n";
        let (doc, report) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert!(doc.books.is_empty());
        assert_eq!(report.failures().count(), 1);
    }

    /// Cancels as soon as a given book starts.
    struct CancelAt(&'static str, Cell<bool>);

    impl ProgressSink for CancelAt {
        fn message(&self, text: &str) {
            if text.ends_with(self.0) {
                self.1.set(true);
            }
        }

        fn is_cancelled(&self) -> bool {
            self.1.get()
        }
    }

    #[test]
    fn test_cancel_keeps_committed_books() {
        let progress = CancelAt("LUK", Cell::new(false));
        let mut doc = Scripture::default();
        let mut map = CodecConfig::default().marker_map();
        let report = import_with(
            "\\id MRK\n\\p a\n\\id LUK\n\\p b\n",
            "gospels.sfm",
            &mut doc,
            &CodecConfig::default(),
            Dialect::Inline,
            &mut map,
            &progress,
        )
        .unwrap();
        assert!(report.was_cancelled());
        assert_eq!(report.books[1].outcome, BookOutcome::Cancelled);
        let codes: Vec<_> = doc.books.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["MRK"]);
    }

    #[test]
    fn test_cancel_before_start_is_not_an_error() {
        let control = ImportControl::new();
        control.cancel();
        let mut doc = Scripture::default();
        let mut map = CodecConfig::default().marker_map();
        let report = import_with(
            "\\id MRK\n\\p text\n",
            "mrk.sfm",
            &mut doc,
            &CodecConfig::default(),
            Dialect::Inline,
            &mut map,
            &control,
        )
        .unwrap();
        assert!(report.was_cancelled());
        assert!(report.books.is_empty());
        assert!(doc.books.is_empty());
    }
}
