//! Main-domain segments: paragraphs, character styles, numbers and notes.

use super::state::{split_number, BookBuild, BookMode, Context, Frame, OpenStyle, Pass, PendingChapter};
use crate::markup::Segment;
use crate::model::{Container, NoteKind, StyledRun};
use crate::reference::ChapterAdvance;
use crate::styles::mapping::FIGURE;
use crate::styles::{StyleContext, StyleFunction, StyleKind, StyleProxy, Structure};

/// Container a paragraph style lives in.
pub(super) fn container_for(proxy: &StyleProxy) -> Container {
    if proxy.context == StyleContext::Title {
        Container::Title
    } else if proxy.structure == Structure::Heading {
        Container::Heading
    } else {
        Container::Content
    }
}

impl BookBuild {
    /// Handles a main-domain style segment. Returns whether it ended with
    /// plain text, so a following line break counts as a space.
    pub(super) fn style(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        if self.mode == BookMode::BackTranslationOnly {
            self.track_numbers_only(pass, proxy, seg);
            return false;
        }
        match proxy.function {
            StyleFunction::Chapter => self.chapter(pass, proxy, seg),
            StyleFunction::Verse => self.verse(pass, proxy, seg),
            StyleFunction::Note(kind) => self.footnote(pass, proxy, kind, seg),
            StyleFunction::DefaultCharacters => self.default_characters(pass, proxy, seg),
            StyleFunction::Normal => match proxy.kind {
                StyleKind::Paragraph => self.paragraph(pass, proxy, seg),
                StyleKind::Character => self.character(pass, proxy, seg),
            },
        }
    }

    /// A back-translation file only moves the reference with its main
    /// chapter and verse markers.
    fn track_numbers_only(&mut self, pass: &Pass<'_>, proxy: &StyleProxy, seg: &Segment) {
        let (number, _) = split_number(&seg.text);
        match proxy.function {
            StyleFunction::Chapter => {
                let chapter = pass.grammar.parse_chapter(number);
                self.tracker.advance_chapter(&chapter);
            }
            StyleFunction::Verse => {
                let token = pass.grammar.parse_verse(number);
                self.tracker.advance_verse(&token);
            }
            _ => tracing::debug!(line = seg.line, marker = %seg.marker, "vernacular content ignored in back-translation import"),
        }
    }

    fn paragraph(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        self.mode = BookMode::Vernacular;
        self.leave_paragraph(pass, seg);

        let container = container_for(proxy);
        let intro = proxy.context == StyleContext::Intro;
        let section_intro = self.book.sections.last().map(|s| s.intro);
        match container {
            Container::Title => self.context = Context::Title,
            Container::Heading => {
                if self.context != Context::SectionHeading || section_intro != Some(intro) {
                    self.new_section(pass, intro);
                }
                self.context = Context::SectionHeading;
            }
            Container::Content => {
                if section_intro != Some(intro) || self.context == Context::Title {
                    self.new_section(pass, intro);
                }
                self.context = Context::SectionContent;
                if let Some(pending) = self.pending_chapter.as_mut() {
                    pending.bound = true;
                }
            }
        }

        self.open_paragraph(&proxy.style, container);
        pass.map.record_use(&seg.marker);
        self.add_text(pass, seg, &seg.text, None);
        !seg.text.is_empty()
    }

    fn character(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        if !pass.dialect.is_inline() && proxy.note_context().is_none() {
            self.close_footnotes(pass, seg);
        }
        self.before_content(pass, seg);
        // without an end marker anywhere in the stream the style ends with its segment
        let stays_open = pass.map.ends_in_stream(&seg.marker);
        if let Some(open) = self.char_style_mut() {
            *open = stays_open.then(|| OpenStyle {
                marker: seg.marker.clone(),
                style: proxy.style.clone(),
            });
        }
        if !seg.text.is_empty() {
            pass.map.record_use(&seg.marker);
        }
        self.add_text(pass, seg, &seg.text, Some(&proxy.style));
        false
    }

    fn default_characters(&mut self, pass: &Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        if !pass.dialect.is_inline() && proxy.note_context().is_none() {
            self.close_footnotes(pass, seg);
        }
        if let Some(open) = self.char_style_mut() {
            *open = None;
        }
        self.add_text(pass, seg, &seg.text, None);
        !seg.text.is_empty()
    }

    pub(super) fn end_marker(&mut self, pass: &Pass<'_>, opening: &str, seg: &Segment) -> bool {
        if self.mode == BookMode::BackTranslationOnly {
            return false;
        }
        let closes_note = matches!(self.frames.last(), Some(Frame::Footnote(f)) if f.marker == opening);
        let closes_style = self
            .char_style_mut()
            .is_some_and(|open| open.as_ref().is_some_and(|o| o.marker == opening));
        if closes_note {
            self.frames.pop();
        } else if closes_style {
            if let Some(open) = self.char_style_mut() {
                *open = None;
            }
        } else if opening != FIGURE {
            tracing::warn!(line = seg.line, marker = %seg.marker, "end marker without matching opening marker");
        }
        self.add_text(pass, seg, &seg.text, None);
        !seg.text.is_empty()
    }

    fn chapter(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        self.close_footnotes(pass, seg);
        let (number, rest) = split_number(&seg.text);
        let chapter = pass.grammar.parse_chapter(number);
        if chapter.invalid {
            tracing::warn!(line = seg.line, text = number, "malformed chapter number");
        }

        match self.tracker.advance_chapter(&chapter) {
            ChapterAdvance::New => {
                pass.progress.step(1);
                if self.pending_chapter.is_some() {
                    // two chapters in a row: the first one gets a paragraph of its own
                    self.ensure_content_paragraph(pass, seg);
                    self.insert_pending_chapter();
                }
                self.pending_chapter = Some(PendingChapter {
                    run: StyledRun::styled(number, proxy.style.as_str(), self.ws.as_str()),
                    bound: false,
                });
                self.implicit_verse_pending = true;
                pass.map.record_use(&seg.marker);
            }
            ChapterAdvance::Repeat => {
                tracing::debug!(line = seg.line, chapter = chapter.value, "repeated chapter dropped");
            }
        }

        self.add_text(pass, seg, rest, None);
        !rest.is_empty()
    }

    fn verse(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, seg: &Segment) -> bool {
        self.close_footnotes(pass, seg);
        let (number, rest) = split_number(&seg.text);
        let token = pass.grammar.parse_verse(number);
        if token.invalid {
            tracing::warn!(line = seg.line, text = number, "malformed verse number");
        }

        self.mode = BookMode::Vernacular;
        self.ensure_content_paragraph(pass, seg);
        self.before_content(pass, seg);
        self.implicit_verse_pending = false;
        self.tracker.advance_verse(&token);
        self.note_verse(&token);

        let run = StyledRun::styled(number, proxy.style.as_str(), self.ws.as_str());
        self.push_content(run.clone());
        if let Some(frame) = self.paragraph_frame_mut() {
            frame.numbers.push(run);
        }
        pass.map.record_use(&seg.marker);

        self.add_text(pass, seg, rest, None);
        !rest.is_empty()
    }

    fn footnote(&mut self, pass: &mut Pass<'_>, proxy: &StyleProxy, kind: NoteKind, seg: &Segment) -> bool {
        if self.in_footnote() {
            tracing::warn!(line = seg.line, "nested note; closing the open one");
            self.frames.pop();
        }
        self.before_content(pass, seg);

        let default_caller = match kind {
            NoteKind::General => "+",
            NoteKind::CrossReference => "-",
        };
        let (caller, rest) = if pass.dialect.is_inline() {
            split_number(&seg.text)
        } else {
            ("", seg.text.as_str())
        };
        let caller = if caller.is_empty() { default_caller } else { caller };

        let id = self.book.footnotes.len() as u32 + 1;
        self.open_footnote(id, kind, &proxy.style, caller, &seg.marker);
        pass.map.record_use(&seg.marker);
        self.add_text(pass, seg, rest, None);
        !rest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodecConfig;
    use crate::import::import_str;
    use crate::markup::Dialect;
    use crate::model::{EmbedRef, ScriptureReference};
    use crate::styles::catalog::{CHAPTER_NUMBER, SECTION_HEAD, VERSE_NUMBER};

    fn import(source: &str) -> crate::model::Scripture {
        import_str(source, &CodecConfig::default(), Dialect::Inline)
            .unwrap()
            .0
    }

    #[test]
    fn test_sections_and_verse_runs() {
        let doc = import("\\id MRK\n\\s Heading\n\\c 1\n\\p\n\\v 1 First\n\\v 2 Second\n");
        let book = &doc.books[0];
        assert_eq!(book.sections.len(), 1);
        let section = &book.sections[0];
        assert_eq!(section.heading[0].style, SECTION_HEAD);
        assert_eq!(section.heading[0].text(), "Heading");

        let runs = &section.content[0].runs;
        assert!(runs[0].has_style(CHAPTER_NUMBER));
        assert!(runs[1].has_style(VERSE_NUMBER));
        assert_eq!(runs[2].text, "First ");
        assert_eq!(runs[4].text, "Second");
        assert_eq!(section.start_ref, ScriptureReference::new(41, 1, 1));
        assert_eq!(section.end_ref, ScriptureReference::new(41, 1, 2));
    }

    #[test]
    fn test_chapter_before_heading_waits_for_content() {
        let doc = import("\\id MRK\n\\c 1\n\\p\n\\v 1 a\n\\c 2\n\\s Next\n\\p\n\\v 1 b\n");
        let book = &doc.books[0];
        assert_eq!(book.sections.len(), 2);
        assert!(book.sections[1].heading[0].runs.iter().all(|r| r.style.is_none()));
        let content = &book.sections[1].content[0];
        assert_eq!(content.runs[0].text, "2");
        assert!(content.runs[0].has_style(CHAPTER_NUMBER));
    }

    #[test]
    fn test_implicit_first_verse_counts_for_section_range() {
        let doc = import("\\id MRK\n\\c 3\n\\p Text without a number\n\\v 2 more\n");
        let section = &doc.books[0].sections[0];
        assert_eq!(section.start_ref, ScriptureReference::new(41, 3, 1));
        assert_eq!(section.end_ref, ScriptureReference::new(41, 3, 2));
    }

    #[test]
    fn test_inline_footnote() {
        let doc = import("\\id MRK\n\\c 1\n\\p\n\\v 1 word\\f + \\ft note \\fq quoted\\fq* end\\f* after\n");
        let book = &doc.books[0];
        let runs = &book.sections[0].content[0].runs;
        assert!(runs.iter().any(|r| r.embed == Some(EmbedRef::Footnote(1))));
        assert_eq!(runs.last().map(|r| r.text.as_str()), Some(" after"));

        let note = &book.footnotes[0];
        assert_eq!(note.caller, "+");
        let texts: Vec<_> = note.paragraph.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["note ", "quoted", " end"]);
    }

    #[test]
    fn test_unclosed_character_style_ends_with_segment() {
        let doc = import("\\id MRK\n\\p \\nd Lord\\nd* said \\em loud\n");
        let runs = &doc.books[0].sections[0].content[0].runs;
        assert_eq!(runs.len(), 3);
        assert!(runs[0].has_style("Name Of God"));
        assert_eq!(runs[1].text, " said ");
        assert!(runs[2].has_style("Emphasis"));
    }

    #[test]
    fn test_character_style_stays_open_across_a_note() {
        let doc = import("\\id MRK\n\\c 1\n\\p\n\\v 1 the \\nd Lord\\f + \\ft n\\f* God\\nd* said\n");
        let runs = &doc.books[0].sections[0].content[0].runs;
        let lord = runs.iter().position(|r| r.text == "Lord").unwrap();
        assert!(runs[lord].has_style("Name Of God"));
        assert_eq!(runs[lord + 1].embed, Some(EmbedRef::Footnote(1)));
        assert_eq!(runs[lord + 2].text, " God");
        assert!(runs[lord + 2].has_style("Name Of God"));
        assert_eq!(runs[lord + 3].text, " said");
        assert!(runs[lord + 3].style.is_none());
    }

    #[test]
    fn test_empty_section_gets_default_paragraph() {
        let doc = import("\\id MRK\n\\is Introduction\n\\s Heading\n\\p text\n");
        let sections = &doc.books[0].sections;
        assert_eq!(sections.len(), 2);
        assert!(sections[0].intro);
        assert_eq!(sections[0].content[0].style, "Intro Paragraph");
        assert!(sections[0].content[0].is_empty());
    }
}
