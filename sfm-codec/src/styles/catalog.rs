//! Style catalog: the already-resolved list of styles a project uses.
//!
//! Loading Paratext style sheets is someone else's job; the codec only needs
//! each style's default marker, its type and its structural role.

use crate::model::NoteKind;
use serde::{Deserialize, Serialize};

pub const CHAPTER_NUMBER: &str = "Chapter Number";
pub const VERSE_NUMBER: &str = "Verse Number";
pub const DEFAULT_CHARACTERS: &str = "Default Paragraph Characters";
pub const TITLE_MAIN: &str = "Title Main";
pub const SECTION_HEAD: &str = "Section Head";
pub const INTRO_SECTION_HEAD: &str = "Intro Section Head";
pub const PARAGRAPH: &str = "Paragraph";
pub const INTRO_PARAGRAPH: &str = "Intro Paragraph";
pub const NOTE_GENERAL_PARAGRAPH: &str = "Note General Paragraph";
pub const NOTE_CROSS_REFERENCE_PARAGRAPH: &str = "Note Cross-Reference Paragraph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Paragraph,
    Character,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Heading,
    #[default]
    Body,
}

/// Where a style may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleContext {
    #[default]
    General,
    Title,
    Intro,
    Note(NoteKind),
}

/// Special behaviour attached to a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleFunction {
    #[default]
    Normal,
    Chapter,
    Verse,
    /// The paragraph style of a note; opens a footnote.
    Note(NoteKind),
    /// Closes any open character style ("default paragraph characters").
    DefaultCharacters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleInfo {
    pub name: String,
    /// Default marker including the leading backslash.
    pub marker: String,
    pub kind: StyleKind,
    #[serde(default)]
    pub structure: Structure,
    #[serde(default)]
    pub context: StyleContext,
    #[serde(default)]
    pub function: StyleFunction,
}

impl StyleInfo {
    pub fn paragraph(name: &str, marker: &str, structure: Structure, context: StyleContext) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            kind: StyleKind::Paragraph,
            structure,
            context,
            function: StyleFunction::Normal,
        }
    }

    pub fn character(name: &str, marker: &str, context: StyleContext) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            kind: StyleKind::Character,
            structure: Structure::Body,
            context,
            function: StyleFunction::Normal,
        }
    }

    pub fn with_function(mut self, function: StyleFunction) -> Self {
        self.function = function;
        self
    }

    /// The note kind whose context this style belongs to, if any.
    pub fn note_context(&self) -> Option<NoteKind> {
        match self.context {
            StyleContext::Note(kind) => Some(kind),
            _ => None,
        }
    }
}

/// All styles known to a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCatalog {
    styles: Vec<StyleInfo>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<StyleInfo>) -> Self {
        Self { styles }
    }

    /// The common USFM style set.
    pub fn standard() -> Self {
        use NoteKind::{CrossReference, General};
        use StyleContext as Ctx;
        use Structure::{Body, Heading};

        let general = Ctx::Note(General);
        let xref = Ctx::Note(CrossReference);

        Self::new(vec![
            StyleInfo::paragraph(TITLE_MAIN, "\\mt", Heading, Ctx::Title),
            StyleInfo::paragraph(SECTION_HEAD, "\\s", Heading, Ctx::General),
            StyleInfo::paragraph("Section Head Minor", "\\s2", Heading, Ctx::General),
            StyleInfo::paragraph("Parallel Passage Reference", "\\r", Heading, Ctx::General),
            StyleInfo::paragraph(INTRO_SECTION_HEAD, "\\is", Heading, Ctx::Intro),
            StyleInfo::paragraph(INTRO_PARAGRAPH, "\\ip", Body, Ctx::Intro),
            StyleInfo::paragraph("Intro List Item1", "\\ili", Body, Ctx::Intro),
            StyleInfo::paragraph(PARAGRAPH, "\\p", Body, Ctx::General),
            StyleInfo::paragraph("Paragraph Continuation", "\\m", Body, Ctx::General),
            StyleInfo::paragraph("Line1", "\\q1", Body, Ctx::General),
            StyleInfo::paragraph("Line2", "\\q2", Body, Ctx::General),
            StyleInfo::paragraph("Line3", "\\q3", Body, Ctx::General),
            StyleInfo::paragraph("List Item1", "\\li1", Body, Ctx::General),
            StyleInfo::paragraph("Hebrew Title", "\\d", Body, Ctx::General),
            StyleInfo::paragraph(NOTE_GENERAL_PARAGRAPH, "\\f", Body, Ctx::General)
                .with_function(StyleFunction::Note(General)),
            StyleInfo::paragraph(NOTE_CROSS_REFERENCE_PARAGRAPH, "\\x", Body, Ctx::General)
                .with_function(StyleFunction::Note(CrossReference)),
            StyleInfo::character(CHAPTER_NUMBER, "\\c", Ctx::General)
                .with_function(StyleFunction::Chapter),
            StyleInfo::character(VERSE_NUMBER, "\\v", Ctx::General)
                .with_function(StyleFunction::Verse),
            StyleInfo::character(DEFAULT_CHARACTERS, "\\vt", Ctx::General)
                .with_function(StyleFunction::DefaultCharacters),
            StyleInfo::character(DEFAULT_CHARACTERS, "\\ft", general)
                .with_function(StyleFunction::DefaultCharacters),
            StyleInfo::character(DEFAULT_CHARACTERS, "\\xt", xref)
                .with_function(StyleFunction::DefaultCharacters),
            StyleInfo::character("Note Target Reference", "\\fr", general),
            StyleInfo::character("Note Target Reference", "\\xo", xref),
            StyleInfo::character("Referenced Text", "\\fq", general),
            StyleInfo::character("Alternate Reading", "\\fqa", general),
            StyleInfo::character("Emphasis", "\\em", Ctx::General),
            StyleInfo::character("Name Of God", "\\nd", Ctx::General),
            StyleInfo::character("Words Of Christ", "\\wj", Ctx::General),
            StyleInfo::character("Quoted Text", "\\qt", Ctx::General),
            StyleInfo::character("Foreign", "\\tl", Ctx::General),
            StyleInfo::character("Book Title In Text", "\\bk", Ctx::General),
        ])
    }

    /// Adds a style; a later entry with the same name and context wins on lookup.
    pub fn add(&mut self, style: StyleInfo) {
        self.styles.retain(|s| !(s.name == style.name && s.context == style.context));
        self.styles.push(style);
    }

    pub fn styles(&self) -> &[StyleInfo] {
        &self.styles
    }

    /// First style with this name, preferring a general (non-note) context.
    pub fn get(&self, name: &str) -> Option<&StyleInfo> {
        self.styles
            .iter()
            .filter(|s| s.name == name)
            .min_by_key(|s| s.note_context().is_some())
    }

    pub fn is_heading(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.structure == Structure::Heading)
    }

    pub fn is_intro(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.context == StyleContext::Intro)
    }

    pub fn is_title(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.context == StyleContext::Title)
    }

    pub fn function(&self, name: &str) -> StyleFunction {
        self.get(name).map(|s| s.function).unwrap_or_default()
    }
}
