//! The moving "current reference" shared by every stream of a pass.

use super::grammar::{ChapterNumber, VerseNumberToken};
use crate::model::ScriptureReference;
use serde::{Deserialize, Serialize};

/// A verse range known to be repeated in some manuscripts (for example the
/// longer ending of Mark). Inside such a range verse numbers may go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPassage {
    pub book: u16,
    pub chapter: u16,
    pub first_verse: u16,
    pub last_verse: u16,
}

impl VariantPassage {
    pub fn contains(&self, reference: ScriptureReference) -> bool {
        reference.book == self.book
            && reference.chapter == self.chapter
            && (self.first_verse..=self.last_verse).contains(&reference.verse)
    }
}

/// Result of moving to a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterAdvance {
    /// A chapter not written before; a marker should be emitted.
    New,
    /// The chapter that was last written; nothing to emit.
    Repeat,
}

/// Result of moving to a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseAdvance {
    /// The new begin is at or after the previous end.
    pub in_order: bool,
    /// Pending items that begin before this reference may be flushed.
    pub flush_before: ScriptureReference,
}

/// What a run means to the implicit-verse-one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRole<'a> {
    Chapter,
    /// A verse number run with its parsed begin value.
    Verse(u16),
    Text(&'a str),
    Object,
}

/// Decides whether text following a chapter number is an unmarked verse 1.
///
/// `following` are the runs after the chapter run, up to the end of the
/// paragraph. A verse number before any text means numbering is explicit.
/// Text first means implicit verse 1, unless a verse "1" shows up later.
pub fn is_implicit_first_verse_needed<'a>(following: impl IntoIterator<Item = RunRole<'a>>) -> bool {
    let mut saw_text = false;
    for role in following {
        match role {
            RunRole::Verse(_) if !saw_text => return false,
            RunRole::Verse(1) => return false,
            RunRole::Verse(_) | RunRole::Object => {}
            RunRole::Chapter => break,
            RunRole::Text(text) => saw_text |= !text.trim().is_empty(),
        }
    }
    saw_text
}

/// Tracks book, chapter, verse and segment across one export or import pass.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    current: ScriptureReference,
    last_chapter_written: Option<u16>,
    last_verse_end: u16,
    last_written_verse: u16,
    verse_display: String,
    variants: Vec<VariantPassage>,
}

impl ReferenceTracker {
    pub fn new(variants: Vec<VariantPassage>) -> Self {
        Self {
            current: ScriptureReference::default(),
            last_chapter_written: None,
            last_verse_end: 0,
            last_written_verse: 0,
            verse_display: String::new(),
            variants,
        }
    }

    pub fn current(&self) -> ScriptureReference {
        self.current
    }

    /// The verse as displayed (may be a bridge such as `3-4`).
    pub fn verse_display(&self) -> &str {
        &self.verse_display
    }

    pub fn last_written_verse(&self) -> u16 {
        self.last_written_verse
    }

    pub fn last_chapter_written(&self) -> Option<u16> {
        self.last_chapter_written
    }

    pub fn start_book(&mut self, book: u16) {
        self.current = ScriptureReference::book_start(book);
        self.last_chapter_written = None;
        self.reset_verses();
    }

    fn reset_verses(&mut self) {
        self.last_verse_end = 0;
        self.last_written_verse = 0;
        self.verse_display.clear();
    }

    /// Moves to a chapter. Invalid numbers are compared by their extracted
    /// digits; a number with no digits at all leaves the chapter unchanged.
    pub fn advance_chapter(&mut self, chapter: &ChapterNumber) -> ChapterAdvance {
        if chapter.value > 0 && self.last_chapter_written == Some(chapter.value) {
            return ChapterAdvance::Repeat;
        }
        if chapter.value > 0 {
            self.current = ScriptureReference::new(self.current.book, chapter.value, 0);
            self.last_chapter_written = Some(chapter.value);
        }
        self.reset_verses();
        ChapterAdvance::New
    }

    /// Where pending items flush to when a chapter begins.
    pub fn chapter_boundary(&self, chapter: &ChapterNumber) -> ScriptureReference {
        if chapter.value > 0 {
            ScriptureReference::new(self.current.book, chapter.value, 0)
        } else {
            self.current.next_chapter()
        }
    }

    /// Records the unmarked verse 1 that follows a naked chapter number.
    pub fn set_implicit_first_verse(&mut self) {
        self.current = ScriptureReference::new(self.current.book, self.current.chapter, 1);
        self.last_verse_end = 1;
        self.last_written_verse = self.last_written_verse.max(1);
        self.verse_display = "1".to_string();
    }

    /// Computes the flush point for a verse without moving.
    pub fn preview_verse(&self, token: &VerseNumberToken) -> VerseAdvance {
        let in_order = token.begin >= self.last_verse_end;
        let flush_before = if in_order && !token.invalid {
            ScriptureReference::new(self.current.book, self.current.chapter, token.begin)
                .with_segment(token.begin_segment)
        } else {
            ScriptureReference::new(
                self.current.book,
                self.current.chapter,
                self.last_written_verse.saturating_add(1),
            )
        };
        VerseAdvance {
            in_order,
            flush_before,
        }
    }

    /// Moves to a verse (or bridge).
    pub fn advance_verse(&mut self, token: &VerseNumberToken) -> VerseAdvance {
        let advance = self.preview_verse(token);
        let next = ScriptureReference::new(self.current.book, self.current.chapter, token.begin)
            .with_segment(token.begin_segment);
        let in_variant = self.variants.iter().any(|v| v.contains(next));
        self.last_written_verse = if in_variant {
            token.end
        } else {
            self.last_written_verse.max(token.end)
        };
        self.last_verse_end = token.end;
        self.current = next;
        self.verse_display = token.raw.trim().to_string();
        advance
    }
}
