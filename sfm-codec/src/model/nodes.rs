//! Core data structures of the Scripture document model.

use super::reference::{book_number, ScriptureReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a footnote within its book (1-based).
pub type FootnoteId = u32;

/// Position of a picture within its book (1-based).
pub type PictureId = u32;

/// An embedded object referenced from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbedRef {
    Footnote(FootnoteId),
    Picture(PictureId),
}

/// A span of text with one optional character style and one writing system.
///
/// Runs carrying an [`EmbedRef`] are placeholders for footnotes or pictures
/// and have empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub ws: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<EmbedRef>,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>, ws: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
            ws: ws.into(),
            embed: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: impl Into<String>, ws: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
            ws: ws.into(),
            embed: None,
        }
    }

    pub fn embedded(embed: EmbedRef, ws: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            style: None,
            ws: ws.into(),
            embed: Some(embed),
        }
    }

    pub fn has_style(&self, name: &str) -> bool {
        self.style.as_deref() == Some(name)
    }

    /// Whether this run can absorb `other` without changing meaning.
    pub fn same_properties(&self, other: &StyledRun) -> bool {
        self.embed.is_none()
            && other.embed.is_none()
            && self.style == other.style
            && self.ws == other.ws
    }
}

/// Appends a run, merging it into the previous one when their properties match.
pub fn push_run(runs: &mut Vec<StyledRun>, run: StyledRun) {
    if run.embed.is_none() && run.text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.same_properties(&run) => last.text.push_str(&run.text),
        _ => runs.push(run),
    }
}

/// The translation of one paragraph into one analysis writing system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackTranslation {
    pub runs: Vec<StyledRun>,
}

impl BackTranslation {
    pub fn new(runs: Vec<StyledRun>) -> Self {
        Self { runs }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty() && r.embed.is_none())
    }
}

/// Back translations of one paragraph keyed by writing system id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackTranslationSet(BTreeMap<String, BackTranslation>);

impl BackTranslationSet {
    pub fn get(&self, ws: &str) -> Option<&BackTranslation> {
        self.0.get(ws)
    }

    /// Translation for `ws`, created empty if missing.
    pub fn entry(&mut self, ws: &str) -> &mut BackTranslation {
        self.0.entry(ws.to_string()).or_default()
    }

    pub fn insert(&mut self, ws: impl Into<String>, translation: BackTranslation) {
        self.0.insert(ws.into(), translation);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BackTranslation)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BackTranslation::is_empty)
    }

    /// Drops translations that hold no text.
    pub fn prune(&mut self) {
        self.0.retain(|_, bt| !bt.is_empty());
    }
}

/// An ordered sequence of runs with one paragraph style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub style: String,
    pub runs: Vec<StyledRun>,
    #[serde(default, skip_serializing_if = "BackTranslationSet::is_empty")]
    pub back_translations: BackTranslationSet,
}

impl Paragraph {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            runs: Vec::new(),
            back_translations: BackTranslationSet::default(),
        }
    }

    pub fn with_runs(style: impl Into<String>, runs: Vec<StyledRun>) -> Self {
        Self {
            runs,
            ..Self::new(style)
        }
    }

    pub fn with_back_translation(mut self, ws: &str, runs: Vec<StyledRun>) -> Self {
        self.back_translations.insert(ws, BackTranslation::new(runs));
        self
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Footnote ids embedded in this paragraph, in order.
    pub fn footnote_refs(&self) -> impl Iterator<Item = FootnoteId> + '_ {
        self.runs.iter().filter_map(|r| match r.embed {
            Some(EmbedRef::Footnote(id)) => Some(id),
            _ => None,
        })
    }
}

/// Which kind of note a footnote is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteKind {
    General,
    CrossReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub id: FootnoteId,
    pub kind: NoteKind,
    /// Caller as written in the source (`+`, `-` or a literal symbol).
    pub caller: String,
    pub paragraph: Paragraph,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub id: PictureId,
    pub caption: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Vec<Paragraph>,
    pub content: Vec<Paragraph>,
    pub start_ref: ScriptureReference,
    pub end_ref: ScriptureReference,
    pub intro: bool,
}

impl Section {
    pub fn new(intro: bool, start_ref: ScriptureReference) -> Self {
        Self {
            heading: Vec::new(),
            content: Vec::new(),
            start_ref,
            end_ref: start_ref,
            intro,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub code: String,
    pub canonical_number: u16,
    pub title: Vec<Paragraph>,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
    #[serde(default)]
    pub pictures: Vec<Picture>,
}

impl Book {
    /// A book with no content. Unknown codes get canonical number 0.
    pub fn new(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        Self {
            canonical_number: book_number(&code).unwrap_or(0),
            code,
            title: Vec::new(),
            sections: Vec::new(),
            footnotes: Vec::new(),
            pictures: Vec::new(),
        }
    }

    pub fn footnote(&self, id: FootnoteId) -> Option<&Footnote> {
        self.footnotes.iter().find(|f| f.id == id)
    }

    pub fn footnote_mut(&mut self, id: FootnoteId) -> Option<&mut Footnote> {
        self.footnotes.iter_mut().find(|f| f.id == id)
    }

    pub fn picture(&self, id: PictureId) -> Option<&Picture> {
        self.pictures.iter().find(|p| p.id == id)
    }

    pub fn picture_mut(&mut self, id: PictureId) -> Option<&mut Picture> {
        self.pictures.iter_mut().find(|p| p.id == id)
    }

    /// Every paragraph of the book, note paragraphs included.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        let sections = self
            .sections
            .iter_mut()
            .flat_map(|s| s.heading.iter_mut().chain(s.content.iter_mut()));
        self.title
            .iter_mut()
            .chain(sections)
            .chain(self.footnotes.iter_mut().map(|f| &mut f.paragraph))
    }

    /// The paragraph at a locator, if it exists.
    pub fn paragraph(&self, locator: ParagraphLocator) -> Option<&Paragraph> {
        match locator.container {
            Container::Title => self.title.get(locator.index),
            Container::Heading => self.sections.get(locator.section)?.heading.get(locator.index),
            Container::Content => self.sections.get(locator.section)?.content.get(locator.index),
        }
    }

    pub fn paragraph_mut(&mut self, locator: ParagraphLocator) -> Option<&mut Paragraph> {
        match locator.container {
            Container::Title => self.title.get_mut(locator.index),
            Container::Heading => self
                .sections
                .get_mut(locator.section)?
                .heading
                .get_mut(locator.index),
            Container::Content => self
                .sections
                .get_mut(locator.section)?
                .content
                .get_mut(locator.index),
        }
    }
}

/// The structural container a paragraph lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Container {
    Title,
    Heading,
    Content,
}

/// Address of a paragraph inside a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParagraphLocator {
    pub container: Container,
    /// Section index; ignored for [`Container::Title`].
    pub section: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTarget {
    pub book: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<ParagraphLocator>,
}

/// A translator note anchored to a reference range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub begin: ScriptureReference,
    pub end: ScriptureReference,
    pub target: AnnotationTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_text: Option<String>,
    pub discussion: String,
}

impl Annotation {
    pub fn new(begin: ScriptureReference, discussion: impl Into<String>) -> Self {
        Self {
            begin,
            end: begin,
            target: AnnotationTarget {
                book: begin.book,
                paragraph: None,
            },
            cited_text: None,
            discussion: discussion.into(),
        }
    }
}

/// The whole document: books plus the annotation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scripture {
    pub books: Vec<Book>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}
