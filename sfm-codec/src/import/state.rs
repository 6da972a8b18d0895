//! Per-book parser state: open paragraphs and notes, the section being
//! built, and where the next run goes.

use super::sync::{BtCursor, ParagraphSync};
use crate::config::CodecConfig;
use crate::error::SyncFailure;
use crate::markup::{Dialect, Segment};
use crate::model::{
    push_run, Annotation, Book, Container, EmbedRef, FootnoteId, NoteKind, Paragraph,
    PictureId, Section, StyledRun,
};
use crate::progress::ProgressSink;
use crate::reference::{NumberGrammar, ReferenceTracker, VerseNumberToken};
use crate::styles::catalog::{INTRO_PARAGRAPH, PARAGRAPH};
use crate::styles::{MarkerMap, PictureField};
use std::collections::{HashMap, HashSet};

/// Pass-wide settings and tables shared by every book of one import.
pub(super) struct Pass<'p> {
    pub file: &'p str,
    pub config: &'p CodecConfig,
    pub grammar: NumberGrammar,
    pub dialect: Dialect,
    pub map: &'p mut MarkerMap,
    pub progress: &'p dyn ProgressSink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Context {
    /// Right after `\id`, before any paragraph.
    BookStart,
    Title,
    SectionHeading,
    SectionContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BookMode {
    /// No content yet; the first segment decides.
    Pending,
    Vernacular,
    /// The book already exists in the sink and only its back translations
    /// are being filled in.
    BackTranslationOnly,
}

/// How much of a paragraph's vernacular numbering one back translation has
/// already repeated.
#[derive(Debug, Default)]
pub(super) struct NumberSync {
    pub consumed: usize,
    /// The back translation wrote its own numbers since the last `\btvt`.
    pub explicit: bool,
}

/// A character style whose end marker has not been seen yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OpenStyle {
    pub marker: String,
    pub style: String,
}

#[derive(Debug)]
pub(super) struct ParagraphFrame {
    pub serial: u64,
    pub paragraph: Paragraph,
    pub container: Container,
    pub char_style: Option<OpenStyle>,
    pub pending_space: bool,
    /// Chapter and verse runs in the order they were added.
    pub numbers: Vec<StyledRun>,
    pub bt_numbers: HashMap<String, NumberSync>,
}

#[derive(Debug)]
pub(super) struct FootnoteFrame {
    pub id: FootnoteId,
    /// Opening marker, matched against `\marker*`.
    pub marker: String,
    pub char_style: Option<OpenStyle>,
    pub pending_space: bool,
}

#[derive(Debug)]
pub(super) enum Frame {
    Paragraph(ParagraphFrame),
    Footnote(FootnoteFrame),
}

/// A chapter number waiting for the content paragraph it belongs to.
#[derive(Debug)]
pub(super) struct PendingChapter {
    pub run: StyledRun,
    /// A content paragraph marker has been seen since the chapter.
    pub bound: bool,
}

pub(super) struct BookBuild {
    pub book: Book,
    /// The sink's copy before a back-translation-only import touched it.
    pub original: Option<Book>,
    pub mode: BookMode,
    pub context: Context,
    pub frames: Vec<Frame>,
    pub tracker: ReferenceTracker,
    pub pending_chapter: Option<PendingChapter>,
    pub implicit_verse_pending: bool,
    pub section_has_verse: bool,
    pub picture: Option<(PictureId, HashSet<PictureField>)>,
    pub annotations: Vec<Annotation>,
    pub open_annotation: Option<Annotation>,
    pub sync: ParagraphSync,
    pub bt: HashMap<String, BtCursor>,
    pub ws: String,
    next_serial: u64,
}

impl BookBuild {
    pub fn new(code: &str, config: &CodecConfig) -> Self {
        let book = Book::new(code);
        let mut tracker = ReferenceTracker::new(config.variant_passages.clone());
        tracker.start_book(book.canonical_number);
        Self {
            book,
            original: None,
            mode: BookMode::Pending,
            context: Context::BookStart,
            frames: Vec::new(),
            tracker,
            pending_chapter: None,
            implicit_verse_pending: false,
            section_has_verse: false,
            picture: None,
            annotations: Vec::new(),
            open_annotation: None,
            sync: ParagraphSync::default(),
            bt: HashMap::new(),
            ws: config.default_writing_system.clone(),
            next_serial: 0,
        }
    }

    pub fn failure(&self, pass: &Pass<'_>, seg: &Segment, reason: &str) -> SyncFailure {
        SyncFailure {
            file: pass.file.to_string(),
            line: seg.line,
            marker: seg.marker.clone(),
            text: seg.text.clone(),
            reference: self.tracker.current(),
            reason: reason.to_string(),
        }
    }

    /// Switches to filling in back translations of an existing book.
    pub fn begin_back_translation_only(&mut self, existing: Book) {
        tracing::debug!(book = %existing.code, "importing back translations into existing book");
        self.original = Some(existing.clone());
        self.book = existing;
        self.mode = BookMode::BackTranslationOnly;
        self.pending_chapter = None;
        self.implicit_verse_pending = false;
        self.frames.clear();
    }

    pub fn paragraph_frame(&self) -> Option<&ParagraphFrame> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Paragraph(p) => Some(p),
            Frame::Footnote(_) => None,
        })
    }

    pub fn paragraph_frame_mut(&mut self) -> Option<&mut ParagraphFrame> {
        self.frames.iter_mut().rev().find_map(|f| match f {
            Frame::Paragraph(p) => Some(p),
            Frame::Footnote(_) => None,
        })
    }

    pub fn in_footnote(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Footnote(_)))
    }

    fn in_content_paragraph(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Paragraph(p)) if p.container == Container::Content)
    }

    /// Character style open in the innermost frame.
    pub fn char_style_mut(&mut self) -> Option<&mut Option<OpenStyle>> {
        match self.frames.last_mut()? {
            Frame::Paragraph(p) => Some(&mut p.char_style),
            Frame::Footnote(f) => Some(&mut f.char_style),
        }
    }

    fn open_style_name(&self) -> Option<String> {
        let open = match self.frames.last()? {
            Frame::Paragraph(p) => p.char_style.as_ref(),
            Frame::Footnote(f) => f.char_style.as_ref(),
        };
        open.map(|o| o.style.clone())
    }

    /// The innermost frame ended a line with plain text.
    pub fn mark_line_end(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Paragraph(p)) => p.pending_space = true,
            Some(Frame::Footnote(f)) => f.pending_space = true,
            None => {}
        }
    }

    pub fn clear_bt_anchors(&mut self) {
        for cursor in self.bt.values_mut() {
            cursor.anchor = None;
        }
    }

    pub fn current_section(&self) -> Option<usize> {
        self.book.sections.len().checked_sub(1)
    }

    pub fn new_section(&mut self, pass: &Pass<'_>, intro: bool) {
        self.close_section();
        self.book
            .sections
            .push(Section::new(intro, self.tracker.current()));
        self.section_has_verse = false;
        pass.progress.step(1);
    }

    /// Gives a section that ended without content its default paragraph.
    pub fn close_section(&mut self) {
        if let Some(section) = self.book.sections.last_mut() {
            if section.content.is_empty() {
                let style = if section.intro { INTRO_PARAGRAPH } else { PARAGRAPH };
                section.content.push(Paragraph::new(style));
            }
        }
    }

    pub fn open_paragraph(&mut self, style: &str, container: Container) {
        self.next_serial += 1;
        self.frames.push(Frame::Paragraph(ParagraphFrame {
            serial: self.next_serial,
            paragraph: Paragraph::new(style),
            container,
            char_style: None,
            pending_space: false,
            numbers: Vec::new(),
            bt_numbers: HashMap::new(),
        }));
    }

    /// Pops open notes. Inline notes should have been closed explicitly.
    pub fn close_footnotes(&mut self, pass: &Pass<'_>, seg: &Segment) {
        while let Some(Frame::Footnote(note)) = self.frames.last() {
            if pass.dialect.is_inline() {
                tracing::warn!(
                    line = seg.line,
                    marker = %note.marker,
                    "note not closed before {}",
                    seg.marker
                );
            }
            self.frames.pop();
        }
    }

    /// Stores the open paragraph in its container.
    pub fn finalize_paragraph(&mut self, pass: &Pass<'_>, seg: &Segment) {
        self.close_footnotes(pass, seg);
        self.store_paragraph();
    }

    /// Pops the innermost frame into the book if it is a paragraph.
    pub fn store_paragraph(&mut self) {
        let Some(Frame::Paragraph(frame)) = self.frames.pop() else {
            return;
        };
        self.clear_bt_anchors();
        let paragraph = frame.paragraph;
        match frame.container {
            Container::Title => self.book.title.push(paragraph),
            Container::Heading | Container::Content => {
                let Some(section) = self.book.sections.last_mut() else {
                    tracing::warn!(style = %paragraph.style, "paragraph outside of any section dropped");
                    return;
                };
                if frame.container == Container::Heading {
                    section.heading.push(paragraph);
                } else {
                    section.content.push(paragraph);
                }
            }
        }
    }

    /// Leaves the open paragraph because another paragraph starts. A chapter
    /// bound to an empty paragraph stays with it.
    pub fn leave_paragraph(&mut self, pass: &Pass<'_>, seg: &Segment) {
        self.close_footnotes(pass, seg);
        let bound = self.pending_chapter.as_ref().is_some_and(|p| p.bound);
        if bound && self.in_content_paragraph() {
            self.insert_pending_chapter();
        }
        self.finalize_paragraph(pass, seg);
    }

    /// Makes sure the innermost frame is a content paragraph, opening a
    /// default one if needed.
    pub fn ensure_content_paragraph(&mut self, pass: &Pass<'_>, seg: &Segment) {
        if self.in_content_paragraph() {
            return;
        }
        self.close_footnotes(pass, seg);
        if self.in_content_paragraph() {
            return;
        }
        self.finalize_paragraph(pass, seg);
        // content right after a heading stays in the heading's section
        let needs_section = match self.book.sections.last() {
            None => true,
            Some(section) => {
                section.intro || matches!(self.context, Context::BookStart | Context::Title)
            }
        };
        if needs_section {
            self.new_section(pass, false);
        }
        self.context = Context::SectionContent;
        self.open_paragraph(PARAGRAPH, Container::Content);
    }

    /// Everything main content needs first: a vernacular book, a frame to
    /// write into, and the chapter number waiting for it.
    pub fn before_content(&mut self, pass: &Pass<'_>, seg: &Segment) {
        if self.mode == BookMode::Pending {
            self.mode = BookMode::Vernacular;
        }
        if self.frames.is_empty() {
            self.ensure_content_paragraph(pass, seg);
        }
        if self.pending_chapter.is_some() && self.in_content_paragraph() {
            self.insert_pending_chapter();
        }
    }

    pub fn insert_pending_chapter(&mut self) {
        let Some(pending) = self.pending_chapter.take() else {
            return;
        };
        self.push_content(pending.run.clone());
        if let Some(frame) = self.paragraph_frame_mut() {
            frame.numbers.push(pending.run);
        }
    }

    /// Appends a run to the innermost frame, turning a pending line break
    /// into a space first.
    pub fn push_content(&mut self, run: StyledRun) {
        let (runs, pending) = match self.frames.last_mut() {
            Some(Frame::Paragraph(p)) => (&mut p.paragraph.runs, &mut p.pending_space),
            Some(Frame::Footnote(f)) => match self.book.footnote_mut(f.id) {
                Some(note) => (&mut note.paragraph.runs, &mut f.pending_space),
                None => return,
            },
            None => return,
        };
        append_with_space(runs, pending, run);
    }

    /// Adds text to the innermost frame. Unstyled text takes the frame's
    /// open character style, if any.
    pub fn add_text(&mut self, pass: &Pass<'_>, seg: &Segment, text: &str, style: Option<&str>) {
        if text.is_empty() {
            return;
        }
        let open = match style {
            Some(_) => None,
            None => self.open_style_name(),
        };
        let style = style.or(open.as_deref());
        self.before_content(pass, seg);
        if self.implicit_verse_pending && self.in_content_paragraph() && !text.trim().is_empty() {
            self.implicit_verse_pending = false;
            self.tracker.set_implicit_first_verse();
            let one = VerseNumberToken {
                raw: "1".to_string(),
                begin: 1,
                end: 1,
                begin_segment: 0,
                end_segment: 0,
                invalid: false,
            };
            self.note_verse(&one);
        }
        let run = match style {
            Some(style) => StyledRun::styled(text, style, self.ws.as_str()),
            None => StyledRun::plain(text, self.ws.as_str()),
        };
        self.push_content(run);
    }

    /// Inserts a footnote or picture placeholder into the open paragraph.
    pub fn push_embed(&mut self, embed: EmbedRef) {
        let run = StyledRun::embedded(embed, self.ws.as_str());
        if let Some(frame) = self.paragraph_frame_mut() {
            frame.pending_space = false;
            push_run(&mut frame.paragraph.runs, run);
        }
    }

    /// Widens the current section's reference range to cover a verse.
    pub fn note_verse(&mut self, token: &VerseNumberToken) {
        let current = self.tracker.current();
        let Some(section) = self.book.sections.last_mut() else {
            return;
        };
        let begin = current.with_segment(token.begin_segment);
        let end = crate::model::ScriptureReference::new(current.book, current.chapter, token.end)
            .with_segment(token.end_segment);
        if self.section_has_verse {
            section.start_ref = section.start_ref.min(begin);
            section.end_ref = section.end_ref.max(end);
        } else {
            section.start_ref = begin;
            section.end_ref = end;
            self.section_has_verse = true;
        }
    }

    pub fn open_footnote(&mut self, id: FootnoteId, kind: NoteKind, style: &str, caller: &str, marker: &str) {
        self.book.footnotes.push(crate::model::Footnote {
            id,
            kind,
            caller: caller.to_string(),
            paragraph: Paragraph::new(style),
        });
        self.push_embed(EmbedRef::Footnote(id));
        self.frames.push(Frame::Footnote(FootnoteFrame {
            id,
            marker: marker.to_string(),
            char_style: None,
            pending_space: false,
        }));
    }

    pub fn close_annotation(&mut self) {
        if let Some(annotation) = self.open_annotation.take() {
            self.annotations.push(annotation);
        }
    }
}

/// Appends `run`, inserting one space for a line break when neither side of
/// the join already has whitespace.
pub(super) fn append_with_space(runs: &mut Vec<StyledRun>, pending: &mut bool, run: StyledRun) {
    if std::mem::take(pending) && run.embed.is_none() {
        let last_ends_blank = runs
            .last()
            .map_or(true, |r| r.embed.is_none() && r.text.ends_with(char::is_whitespace));
        if !last_ends_blank && !run.text.starts_with(char::is_whitespace) {
            push_run(runs, StyledRun::plain(" ", run.ws.as_str()));
        }
    }
    push_run(runs, run);
}

/// Splits a number segment's text into the number and the text after it.
pub(super) fn split_number(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((number, rest)) => (number, rest),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_number() {
        assert_eq!(split_number("1 In the beginning"), ("1", "In the beginning"));
        assert_eq!(split_number("3-4"), ("3-4", ""));
        assert_eq!(split_number("+ "), ("+", ""));
        assert_eq!(split_number(""), ("", ""));
    }

    #[test]
    fn test_line_break_becomes_one_space() {
        let mut runs = vec![StyledRun::plain("In the", "und")];
        let mut pending = true;
        append_with_space(&mut runs, &mut pending, StyledRun::styled("Lord", "Name Of God", "und"));
        assert_eq!(runs[0].text, "In the ");
        assert!(!pending);

        let mut pending = true;
        append_with_space(&mut runs, &mut pending, StyledRun::plain(" said", "und"));
        assert_eq!(runs.last().map(|r| r.text.as_str()), Some(" said"));
    }

    #[test]
    fn test_no_space_at_paragraph_start() {
        let mut runs = Vec::new();
        let mut pending = true;
        append_with_space(&mut runs, &mut pending, StyledRun::plain("First", "und"));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "First");
    }
}
