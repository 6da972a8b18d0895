//! Reference tracking and the verse/chapter number grammar.

pub mod grammar;
pub mod tracker;

pub use grammar::{digit_value, format_number, ChapterNumber, NumberGrammar, VerseNumberToken};
pub use tracker::{
    is_implicit_first_verse_needed, ChapterAdvance, ReferenceTracker, RunRole, VariantPassage,
    VerseAdvance,
};
