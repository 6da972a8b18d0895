//! Back-translation and annotation segments: finding the vernacular
//! paragraph they belong to and storing their runs there.
//!
//! Interleaved back translations (`\btvt` after a verse) attach to the
//! vernacular paragraph that is still open. A back-translation paragraph
//! marker (`\btp`, `\bts`) instead looks up an already stored paragraph with
//! the same style, walking forward through the book one writing system at a
//! time. Anything that cannot be placed is a [`SyncFailure`].

use super::state::{append_with_space, split_number, BookBuild, BookMode, Frame, Pass};
use super::vernacular::container_for;
use crate::error::SyncFailure;
use crate::markup::{Dialect, Segment};
use crate::model::{
    push_run, Annotation, Book, Container, EmbedRef, FootnoteId, Paragraph, ParagraphLocator,
    ScriptureReference, StyledRun,
};
use crate::styles::catalog::VERSE_NUMBER;
use crate::styles::{AnnotationField, MarkerRole, StyleFunction, StyleKind, StyleProxy};
use std::collections::HashMap;

/// Where a writing system's back translation currently goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BtAnchor {
    /// The vernacular paragraph with this serial is still being parsed.
    Open(u64),
    Located(ParagraphLocator),
}

#[derive(Debug, Default)]
pub(super) struct BtCursor {
    pub anchor: Option<BtAnchor>,
    last: Option<BtAnchor>,
    footnote: Option<FootnoteId>,
    /// Open character style of the paragraph and of the note being translated.
    char_style: Option<String>,
    note_char_style: Option<String>,
    pending_space: bool,
    append_separator: bool,
    footnotes_seen: usize,
}

impl BtCursor {
    /// Points the cursor at a paragraph. Per-paragraph state survives only
    /// when the paragraph is the one the cursor last wrote to.
    fn set_anchor(&mut self, anchor: BtAnchor, fresh: bool) {
        if fresh || self.last != Some(anchor) {
            self.footnote = None;
            self.char_style = None;
            self.note_char_style = None;
            self.pending_space = false;
            self.append_separator = false;
            self.footnotes_seen = 0;
        }
        self.last = Some(anchor);
        self.anchor = Some(anchor);
    }

    fn open_style_mut(&mut self) -> &mut Option<String> {
        if self.footnote.is_some() {
            &mut self.note_char_style
        } else {
            &mut self.char_style
        }
    }

    /// A run for unstyled text, carrying the open character style.
    fn run(&self, text: &str, ws: &str) -> StyledRun {
        let open = if self.footnote.is_some() {
            &self.note_char_style
        } else {
            &self.char_style
        };
        match open {
            Some(style) => StyledRun::styled(text, style.as_str(), ws),
            None => StyledRun::plain(text, ws),
        }
    }
}

/// A paragraph found for a back-translation paragraph marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Located {
    pub locator: ParagraphLocator,
    /// The paragraph already received this writing system's text from an
    /// earlier marker; append instead of replacing.
    pub append: bool,
}

#[derive(Debug, Clone, Copy)]
struct SyncPosition {
    container: Container,
    section: usize,
    next: usize,
}

/// Per writing system search position through the book's paragraphs.
#[derive(Debug, Default)]
pub(super) struct ParagraphSync {
    positions: HashMap<String, SyncPosition>,
}

fn paragraphs(book: &Book, container: Container, section: usize) -> &[Paragraph] {
    match container {
        Container::Title => &book.title,
        Container::Heading => book
            .sections
            .get(section)
            .map(|s| s.heading.as_slice())
            .unwrap_or_default(),
        Container::Content => book
            .sections
            .get(section)
            .map(|s| s.content.as_slice())
            .unwrap_or_default(),
    }
}

impl ParagraphSync {
    /// Finds the next paragraph of `style` in `container`.
    ///
    /// With `fixed_section` the search stays inside that section (the
    /// vernacular is being parsed alongside). Without it the book already
    /// exists and the search may move on to later sections; content
    /// paragraphs skip sections that end before `reference`.
    pub fn locate(
        &mut self,
        book: &Book,
        ws: &str,
        container: Container,
        fixed_section: Option<usize>,
        style: &str,
        reference: ScriptureReference,
    ) -> Option<Located> {
        let start = fixed_section.unwrap_or(0);
        let pos = self
            .positions
            .entry(ws.to_string())
            .or_insert(SyncPosition {
                container,
                section: start,
                next: 0,
            });

        match fixed_section {
            Some(section) => {
                if pos.section != section || pos.container != container {
                    *pos = SyncPosition {
                        container,
                        section,
                        next: 0,
                    };
                }
            }
            None => {
                if pos.container != container {
                    if pos.container == Container::Content && container == Container::Heading {
                        pos.section += 1;
                    }
                    pos.container = container;
                    pos.next = 0;
                }
                if container == Container::Content {
                    while pos.section + 1 < book.sections.len()
                        && book.sections[pos.section].end_ref < reference
                    {
                        pos.section += 1;
                        pos.next = 0;
                    }
                }
            }
        }
        let section = if container == Container::Title { 0 } else { pos.section };

        let found = |section: usize, from: usize| {
            paragraphs(book, container, section)
                .iter()
                .enumerate()
                .skip(from)
                .find(|(_, p)| p.style == style)
                .map(|(i, _)| i)
        };
        let locator = |section: usize, index: usize| ParagraphLocator {
            container,
            section,
            index,
        };

        if let Some(index) = found(section, pos.next) {
            pos.section = section;
            pos.next = index + 1;
            return Some(Located {
                locator: locator(section, index),
                append: false,
            });
        }

        // two heading lines of one style share the paragraph's translation
        if container == Container::Heading && pos.next > 0 {
            let previous = pos.next - 1;
            if paragraphs(book, container, section)
                .get(previous)
                .is_some_and(|p| p.style == style)
            {
                return Some(Located {
                    locator: locator(section, previous),
                    append: true,
                });
            }
        }

        if fixed_section.is_some() || container == Container::Title {
            return None;
        }
        for later in section + 1..book.sections.len() {
            if let Some(index) = found(later, 0) {
                pos.section = later;
                pos.next = index + 1;
                return Some(Located {
                    locator: locator(later, index),
                    append: false,
                });
            }
        }
        None
    }
}

/// The run list a back translation currently writes to.
fn bt_runs<'b>(
    book: &'b mut Book,
    frames: &'b mut [Frame],
    anchor: BtAnchor,
    footnote: Option<FootnoteId>,
    ws: &str,
) -> Option<&'b mut Vec<StyledRun>> {
    let paragraph = match (footnote, anchor) {
        (Some(id), _) => &mut book.footnote_mut(id)?.paragraph,
        (None, BtAnchor::Open(serial)) => frames.iter_mut().find_map(|f| match f {
            Frame::Paragraph(p) if p.serial == serial => Some(&mut p.paragraph),
            _ => None,
        })?,
        (None, BtAnchor::Located(locator)) => book.paragraph_mut(locator)?,
    };
    Some(&mut paragraph.back_translations.entry(ws).runs)
}

impl BookBuild {
    /// Handles a segment of the back-translation domain.
    pub(super) fn back_translation(
        &mut self,
        pass: &mut Pass<'_>,
        ws: &str,
        role: &MarkerRole,
        seg: &Segment,
    ) -> Result<(), SyncFailure> {
        self.bt.entry(ws.to_string()).or_default();
        let plain = match role {
            MarkerRole::Style(proxy) => match proxy.function {
                StyleFunction::Chapter | StyleFunction::Verse => {
                    self.bt_number(pass, ws, &proxy.style, seg)?
                }
                StyleFunction::Note(_) => self.bt_footnote(pass, ws, proxy, seg)?,
                StyleFunction::DefaultCharacters => self.bt_text(pass, ws, proxy, seg)?,
                StyleFunction::Normal => match proxy.kind {
                    StyleKind::Paragraph => self.bt_paragraph(pass, ws, proxy, seg)?,
                    StyleKind::Character => self.bt_text(pass, ws, proxy, seg)?,
                },
            },
            MarkerRole::AlternateVerse => self.bt_number(pass, ws, VERSE_NUMBER, seg)?,
            MarkerRole::End(opening) => self.bt_end(pass, ws, opening, seg)?,
            _ => {
                tracing::debug!(line = seg.line, marker = %seg.marker, "marker has no back-translation meaning");
                false
            }
        };
        if plain && seg.ends_line {
            if let Some(cursor) = self.bt.get_mut(ws) {
                cursor.pending_space = true;
            }
        }
        Ok(())
    }

    /// The paragraph a non-paragraph back-translation segment belongs to.
    fn bt_destination(&mut self, pass: &Pass<'_>, ws: &str, seg: &Segment) -> Result<BtAnchor, SyncFailure> {
        if let Some(anchor) = self.bt.get(ws).and_then(|c| c.anchor) {
            return Ok(anchor);
        }
        let open = match self.mode {
            BookMode::Vernacular => self.paragraph_frame().map(|f| BtAnchor::Open(f.serial)),
            BookMode::Pending | BookMode::BackTranslationOnly => None,
        };
        let Some(anchor) = open else {
            return Err(self.failure(pass, seg, "back translation without a vernacular paragraph"));
        };
        self.bt.entry(ws.to_string()).or_default().set_anchor(anchor, false);
        Ok(anchor)
    }

    fn bt_paragraph(
        &mut self,
        pass: &mut Pass<'_>,
        ws: &str,
        proxy: &StyleProxy,
        seg: &Segment,
    ) -> Result<bool, SyncFailure> {
        self.leave_paragraph(pass, seg);
        let container = container_for(proxy);
        let fixed = match self.mode {
            BookMode::BackTranslationOnly => None,
            BookMode::Pending | BookMode::Vernacular => Some(self.current_section().unwrap_or(0)),
        };
        let reference = self.tracker.current();
        let Some(found) = self
            .sync
            .locate(&self.book, ws, container, fixed, &proxy.style, reference)
        else {
            let reason = format!("no vernacular `{}` paragraph for back translation", proxy.style);
            return Err(self.failure(pass, seg, &reason));
        };

        let anchor = BtAnchor::Located(found.locator);
        let cursor = self.bt.entry(ws.to_string()).or_default();
        cursor.set_anchor(anchor, !found.append);
        if found.append {
            cursor.append_separator = true;
        } else if let Some(paragraph) = self.book.paragraph_mut(found.locator) {
            paragraph.back_translations.entry(ws).runs.clear();
        }
        tracing::trace!(line = seg.line, ws, locator = ?found.locator, append = found.append, "back translation located");

        let text = seg.text.as_str();
        if !text.is_empty() {
            self.bt_push(pass, ws, anchor, StyledRun::plain(text, ws));
        }
        Ok(!text.is_empty())
    }

    /// Plain text (`\btvt`, `\btft`) or a character style.
    fn bt_text(&mut self, pass: &mut Pass<'_>, ws: &str, proxy: &StyleProxy, seg: &Segment) -> Result<bool, SyncFailure> {
        let anchor = self.bt_destination(pass, ws, seg)?;
        let general = proxy.note_context().is_none();
        let dpc = proxy.function == StyleFunction::DefaultCharacters;
        let Some(cursor) = self.bt.get_mut(ws) else {
            return Ok(false);
        };
        if pass.dialect == Dialect::StandAlone && general {
            cursor.footnote = None;
        }
        let stays_open = !dpc && pass.map.ends_in_stream(&seg.marker);
        *cursor.open_style_mut() = stays_open.then(|| proxy.style.clone());

        if dpc && general && cursor.footnote.is_none() {
            for number in self.inferred_numbers(anchor, ws) {
                self.bt_push(pass, ws, anchor, number);
            }
        }

        if !seg.text.is_empty() {
            let run = if dpc {
                StyledRun::plain(seg.text.as_str(), ws)
            } else {
                StyledRun::styled(seg.text.as_str(), proxy.style.as_str(), ws)
            };
            self.bt_push(pass, ws, anchor, run);
        }
        Ok(dpc && !seg.text.is_empty())
    }

    /// The vernacular chapter and verse runs a `\btvt` implies: everything
    /// added to the open paragraph since the last one, unless the back
    /// translation wrote its own numbers.
    fn inferred_numbers(&mut self, anchor: BtAnchor, ws: &str) -> Vec<StyledRun> {
        let BtAnchor::Open(serial) = anchor else {
            return Vec::new();
        };
        let Some(frame) = self.paragraph_frame_mut().filter(|f| f.serial == serial) else {
            return Vec::new();
        };
        let total = frame.numbers.len();
        let sync = frame.bt_numbers.entry(ws.to_string()).or_default();
        let inferred = if sync.explicit {
            Vec::new()
        } else {
            frame.numbers[sync.consumed.min(total)..]
                .iter()
                .map(|run| StyledRun {
                    ws: ws.to_string(),
                    ..run.clone()
                })
                .collect()
        };
        sync.consumed = total;
        sync.explicit = false;
        inferred
    }

    /// `\btc`, `\btv` and `\btva`: numbers the back translation states itself.
    fn bt_number(&mut self, pass: &mut Pass<'_>, ws: &str, style: &str, seg: &Segment) -> Result<bool, SyncFailure> {
        let anchor = self.bt_destination(pass, ws, seg)?;
        if let Some(cursor) = self.bt.get_mut(ws) {
            cursor.footnote = None;
        }
        if let BtAnchor::Open(serial) = anchor {
            if let Some(frame) = self.paragraph_frame_mut().filter(|f| f.serial == serial) {
                frame.bt_numbers.entry(ws.to_string()).or_default().explicit = true;
            }
        }

        let (number, rest) = split_number(&seg.text);
        if !number.is_empty() {
            self.bt_push(pass, ws, anchor, StyledRun::styled(number, style, ws));
        }
        if !rest.is_empty() {
            let run = match self.bt.get(ws) {
                Some(cursor) => cursor.run(rest, ws),
                None => StyledRun::plain(rest, ws),
            };
            self.bt_push(pass, ws, anchor, run);
        }
        Ok(!rest.is_empty())
    }

    /// `\btf`: translates the next vernacular note of the anchored paragraph.
    fn bt_footnote(&mut self, pass: &mut Pass<'_>, ws: &str, proxy: &StyleProxy, seg: &Segment) -> Result<bool, SyncFailure> {
        let anchor = self.bt_destination(pass, ws, seg)?;
        let refs: Vec<FootnoteId> = match anchor {
            BtAnchor::Open(serial) => self
                .frames
                .iter()
                .find_map(|f| match f {
                    Frame::Paragraph(p) if p.serial == serial => Some(p.paragraph.footnote_refs().collect()),
                    _ => None,
                })
                .unwrap_or_default(),
            BtAnchor::Located(locator) => self
                .book
                .paragraph(locator)
                .map(|p| p.footnote_refs().collect())
                .unwrap_or_default(),
        };

        let Some(cursor) = self.bt.get_mut(ws) else {
            return Ok(false);
        };
        cursor.footnote = None;
        cursor.note_char_style = None;
        let Some(&id) = refs.get(cursor.footnotes_seen) else {
            let reason = format!("no vernacular `{}` for back-translated note", proxy.style);
            return Err(self.failure(pass, seg, &reason));
        };
        cursor.footnotes_seen += 1;

        self.bt_push(pass, ws, anchor, StyledRun::embedded(EmbedRef::Footnote(id), ws));
        if let Some(note) = self.book.footnote_mut(id) {
            note.paragraph.back_translations.entry(ws).runs.clear();
        }
        if let Some(cursor) = self.bt.get_mut(ws) {
            cursor.footnote = Some(id);
            cursor.pending_space = false;
        }

        let rest = if pass.dialect.is_inline() {
            split_number(&seg.text).1
        } else {
            seg.text.as_str()
        };
        if !rest.is_empty() {
            self.bt_push(pass, ws, anchor, StyledRun::plain(rest, ws));
        }
        Ok(!rest.is_empty())
    }

    fn bt_end(&mut self, pass: &mut Pass<'_>, ws: &str, opening: &str, seg: &Segment) -> Result<bool, SyncFailure> {
        let closes_note = pass
            .map
            .proxy(opening)
            .is_some_and(|p| matches!(p.function, StyleFunction::Note(_)));
        let style = pass.map.proxy(opening).map(|p| p.style.clone());
        if let Some(cursor) = self.bt.get_mut(ws) {
            if closes_note && cursor.footnote.is_some() {
                cursor.footnote = None;
                cursor.note_char_style = None;
            } else if style.is_some() && *cursor.open_style_mut() == style {
                *cursor.open_style_mut() = None;
            } else {
                tracing::warn!(line = seg.line, marker = %seg.marker, "end marker without matching opening marker");
            }
        }
        if seg.text.is_empty() {
            return Ok(false);
        }
        let anchor = self.bt_destination(pass, ws, seg)?;
        let run = match self.bt.get(ws) {
            Some(cursor) => cursor.run(&seg.text, ws),
            None => StyledRun::plain(seg.text.as_str(), ws),
        };
        self.bt_push(pass, ws, anchor, run);
        Ok(true)
    }

    fn bt_push(&mut self, pass: &Pass<'_>, ws: &str, anchor: BtAnchor, run: StyledRun) {
        let Some(cursor) = self.bt.get_mut(ws) else {
            return;
        };
        let Some(runs) = bt_runs(&mut self.book, &mut self.frames, anchor, cursor.footnote, ws) else {
            tracing::warn!(ws, ?anchor, "back-translation target disappeared");
            return;
        };
        let separator = pass.config.heading_append_separator.as_str();
        if std::mem::take(&mut cursor.append_separator) && !runs.is_empty() && !separator.is_empty() {
            push_run(runs, StyledRun::plain(separator, ws));
            cursor.pending_space = false;
        }
        append_with_space(runs, &mut cursor.pending_space, run);
    }

    /// `\rem`, `\remref` and `\remq`.
    pub(super) fn annotation(&mut self, pass: &Pass<'_>, field: AnnotationField, seg: &Segment) -> Result<(), SyncFailure> {
        let text = seg.text.trim();
        match field {
            AnnotationField::Discussion => {
                self.close_annotation();
                self.open_annotation = Some(Annotation::new(self.tracker.current(), text));
            }
            AnnotationField::Reference => {
                let parsed = ScriptureReference::parse_range(text);
                let Some(open) = self.open_annotation.as_mut() else {
                    return Err(self.failure(pass, seg, "annotation reference without an annotation"));
                };
                match parsed {
                    Some((begin, end)) => {
                        open.begin = begin;
                        open.end = end;
                        open.target.book = begin.book;
                    }
                    None => tracing::warn!(line = seg.line, text, "unreadable annotation reference"),
                }
            }
            AnnotationField::Cited => {
                let Some(open) = self.open_annotation.as_mut() else {
                    return Err(self.failure(pass, seg, "cited text without an annotation"));
                };
                open.cited_text = Some(text.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn book() -> Book {
        let mut book = Book::new("MRK");
        let mut first = Section::new(false, ScriptureReference::new(41, 1, 1));
        first.end_ref = ScriptureReference::new(41, 1, 8);
        first.heading.push(Paragraph::new("Section Head"));
        first.content.push(Paragraph::new("Paragraph"));
        first.content.push(Paragraph::new("Line1"));
        first.content.push(Paragraph::new("Paragraph"));
        let mut second = Section::new(false, ScriptureReference::new(41, 1, 9));
        second.end_ref = ScriptureReference::new(41, 1, 20);
        second.heading.push(Paragraph::new("Section Head"));
        second.content.push(Paragraph::new("Paragraph"));
        book.sections = vec![first, second];
        book
    }

    fn at(verse: u16) -> ScriptureReference {
        ScriptureReference::new(41, 1, verse)
    }

    #[test]
    fn test_free_search_walks_forward_by_style() {
        let book = book();
        let mut sync = ParagraphSync::default();
        let mut next = |container, style| {
            sync.locate(&book, "en", container, None, style, at(0))
                .map(|l| (l.locator.section, l.locator.index, l.append))
        };
        assert_eq!(next(Container::Heading, "Section Head"), Some((0, 0, false)));
        assert_eq!(next(Container::Content, "Paragraph"), Some((0, 0, false)));
        assert_eq!(next(Container::Content, "Paragraph"), Some((0, 2, false)));
        assert_eq!(next(Container::Heading, "Section Head"), Some((1, 0, false)));
        assert_eq!(next(Container::Heading, "Section Head"), Some((1, 0, true)));
        assert_eq!(next(Container::Content, "Line1"), None);
    }

    #[test]
    fn test_content_skips_sections_before_reference() {
        let book = book();
        let mut sync = ParagraphSync::default();
        let found = sync
            .locate(&book, "en", Container::Content, None, "Paragraph", at(12))
            .map(|l| l.locator.section);
        assert_eq!(found, Some(1));
    }

    #[test]
    fn test_fixed_section_does_not_wander() {
        let book = book();
        let mut sync = ParagraphSync::default();
        assert!(sync
            .locate(&book, "en", Container::Content, Some(1), "Line1", at(9))
            .is_none());
        let found = sync.locate(&book, "en", Container::Content, Some(1), "Paragraph", at(9));
        assert_eq!(found.map(|l| l.locator.index), Some(0));
    }

    #[test]
    fn test_writing_systems_search_independently() {
        let book = book();
        let mut sync = ParagraphSync::default();
        let en = sync.locate(&book, "en", Container::Content, None, "Paragraph", at(0));
        let es = sync.locate(&book, "es", Container::Content, None, "Paragraph", at(0));
        assert_eq!(en, es);
    }
}
