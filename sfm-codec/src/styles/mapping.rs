//! Bidirectional style ↔ marker table.
//!
//! Built once per pass from a [`StyleCatalog`] and shared by the serializer and
//! the parser of that pass. The table only grows: a style that acquires a
//! generated marker keeps it until the pass ends.
//!
//! Markers are stored with their leading backslash (`\p`, `\nd`). End markers
//! are the opening marker followed by `*`.
//!
//! Back-translation markers are the twin of a main marker with a `bt` prefix
//! (`\btp`, `\btnd`, `\btf`). Writing systems other than the default one add
//! an `_<ws>` suffix (`\btp_es`).

use super::catalog::{StyleCatalog, StyleContext, StyleFunction, StyleKind, Structure};
use crate::markup::Domain;
use crate::model::NoteKind;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const BOOK_ID: &str = "\\id";
pub const RECORD: &str = "\\rcrd";
pub const VERSE_REF: &str = "\\vref";
pub const ANNOTATION: &str = "\\rem";
pub const ANNOTATION_REF: &str = "\\remref";
pub const ANNOTATION_CITED: &str = "\\remq";
pub const FIGURE: &str = "\\fig";
pub const DEFAULT_TEXT: &str = "\\vt";
pub const ALTERNATE_VERSE: &str = "\\va";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureField {
    Caption,
    FileName,
    Copyright,
    Description,
    Layout,
    Scale,
    Location,
}

/// Stand-alone picture field markers.
pub const PICTURE_FIELDS: [(&str, PictureField); 7] = [
    ("\\figcap", PictureField::Caption),
    ("\\figcat", PictureField::FileName),
    ("\\figcopy", PictureField::Copyright),
    ("\\figdesc", PictureField::Description),
    ("\\figlaypos", PictureField::Layout),
    ("\\figscale", PictureField::Scale),
    ("\\figrefrng", PictureField::Location),
];

pub fn picture_field_marker(field: PictureField) -> &'static str {
    PICTURE_FIELDS
        .iter()
        .find(|(_, f)| *f == field)
        .map(|(m, _)| *m)
        .unwrap_or(FIGURE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationField {
    Discussion,
    Reference,
    Cited,
}

/// The style behind a marker, as the parser sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProxy {
    pub style: String,
    pub kind: StyleKind,
    pub structure: Structure,
    pub context: StyleContext,
    pub function: StyleFunction,
    /// Synthesized for a marker the catalog did not know.
    pub generated: bool,
}

impl StyleProxy {
    fn generated(style: String, kind: StyleKind) -> Self {
        Self {
            style,
            kind,
            structure: Structure::Body,
            context: StyleContext::General,
            function: StyleFunction::Normal,
            generated: true,
        }
    }

    pub fn note_context(&self) -> Option<NoteKind> {
        match self.context {
            StyleContext::Note(kind) => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRole {
    Style(StyleProxy),
    /// End marker; carries the opening marker it closes.
    End(String),
    BookId,
    Record,
    VerseRef,
    Annotation(AnnotationField),
    Picture(PictureField),
    InlinePicture,
    /// Back-translation verse number that does not follow the vernacular.
    AlternateVerse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMarker {
    pub role: MarkerRole,
    pub domain: Domain,
}

/// Derives the fallback marker for a style the catalog does not map.
pub fn fallback_marker(style: &str) -> String {
    format!("\\{}", style.trim().replace(char::is_whitespace, "_"))
}

pub fn end_marker(marker: &str) -> String {
    format!("{marker}*")
}

#[derive(Debug, Clone)]
pub struct MarkerMap {
    by_style: HashMap<(String, Option<NoteKind>), String>,
    by_marker: HashMap<String, StyleProxy>,
    /// Generated markers and how often content used them.
    generated: BTreeMap<String, usize>,
    bt_writing_systems: Vec<String>,
    end_markers_in_stream: HashSet<String>,
}

impl MarkerMap {
    /// `bt_writing_systems[0]` is the default back-translation writing system
    /// whose markers carry no suffix.
    pub fn new(catalog: &StyleCatalog, bt_writing_systems: Vec<String>) -> Self {
        let mut map = Self {
            by_style: HashMap::new(),
            by_marker: HashMap::new(),
            generated: BTreeMap::new(),
            bt_writing_systems,
            end_markers_in_stream: HashSet::new(),
        };
        for info in catalog.styles() {
            let key = (info.name.clone(), info.note_context());
            map.by_style.entry(key).or_insert_with(|| info.marker.clone());
            map.by_marker.insert(
                info.marker.clone(),
                StyleProxy {
                    style: info.name.clone(),
                    kind: info.kind,
                    structure: info.structure,
                    context: info.context,
                    function: info.function,
                    generated: false,
                },
            );
        }
        map
    }

    pub fn default_bt_ws(&self) -> &str {
        self.bt_writing_systems.first().map(String::as_str).unwrap_or("bt")
    }

    pub fn bt_writing_systems(&self) -> &[String] {
        &self.bt_writing_systems
    }

    /// Marker for a style, generating (and remembering) one if unmapped.
    pub fn marker_for(&mut self, style: &str, note: Option<NoteKind>, kind: StyleKind) -> String {
        if let Some(marker) = self.lookup(style, note) {
            return marker.to_string();
        }

        let base = fallback_marker(style);
        let mut marker = base.clone();
        let mut n = 2;
        while self.by_marker.get(&marker).is_some_and(|p| p.style != style) {
            marker = format!("{base}_{n}");
            n += 1;
        }
        tracing::debug!(style, marker, "generated marker for unmapped style");
        self.by_style.insert((style.to_string(), None), marker.clone());
        self.by_marker
            .insert(marker.clone(), StyleProxy::generated(style.to_string(), kind));
        self.generated.insert(marker.clone(), 1);
        marker
    }

    fn lookup(&self, style: &str, note: Option<NoteKind>) -> Option<&str> {
        self.by_style
            .get(&(style.to_string(), note))
            .or_else(|| self.by_style.get(&(style.to_string(), None)))
            .map(String::as_str)
    }

    pub fn proxy(&self, marker: &str) -> Option<&StyleProxy> {
        self.by_marker.get(marker)
    }

    /// The back-translation twin of a main marker.
    pub fn bt_marker(&self, marker: &str, ws: &str) -> String {
        let name = marker.trim_start_matches('\\');
        if ws == self.default_bt_ws() {
            format!("\\bt{name}")
        } else {
            format!("\\bt{name}_{ws}")
        }
    }

    /// Tells the table which end markers occur in the stream about to be
    /// parsed, so unknown markers can be typed as character styles.
    pub fn note_end_markers<I: IntoIterator<Item = String>>(&mut self, ends: I) {
        self.end_markers_in_stream.extend(ends);
    }

    /// Whether the end marker of `marker` occurs in the stream being parsed.
    pub fn ends_in_stream(&self, marker: &str) -> bool {
        self.end_markers_in_stream.contains(&end_marker(marker))
    }

    /// Resolves a marker from the stream, synthesizing a proxy for unknown ones.
    pub fn resolve(&mut self, marker: &str) -> ResolvedMarker {
        if let Some(base) = marker.strip_suffix('*') {
            let (opening, domain) = match self.split_bt(base) {
                Some((main, ws)) => (main, Domain::BackTranslation(ws)),
                None => (base.to_string(), Domain::Main),
            };
            return ResolvedMarker {
                role: MarkerRole::End(opening),
                domain,
            };
        }

        if let Some(role) = reserved_role(marker) {
            let domain = match role {
                MarkerRole::Annotation(_) => Domain::Annotations,
                _ => Domain::Main,
            };
            return ResolvedMarker { role, domain };
        }

        if let Some(proxy) = self.by_marker.get(marker) {
            return ResolvedMarker {
                role: MarkerRole::Style(proxy.clone()),
                domain: Domain::Main,
            };
        }

        if let Some((main, ws)) = self.split_bt(marker) {
            let role = if main == ALTERNATE_VERSE {
                MarkerRole::AlternateVerse
            } else {
                match self.by_marker.get(&main) {
                    Some(proxy) => MarkerRole::Style(proxy.clone()),
                    None => return self.resolve_unknown(marker),
                }
            };
            return ResolvedMarker {
                role,
                domain: Domain::BackTranslation(ws),
            };
        }

        self.resolve_unknown(marker)
    }

    fn resolve_unknown(&mut self, marker: &str) -> ResolvedMarker {
        ResolvedMarker {
            role: MarkerRole::Style(self.synthesize(marker)),
            domain: Domain::Main,
        }
    }

    /// Splits `\btXX[_ws]` into (`\XX`, ws) when `\XX` is something we know.
    fn split_bt(&self, marker: &str) -> Option<(String, String)> {
        let rest = marker.strip_prefix("\\bt")?;
        if rest.is_empty() {
            return None;
        }
        let (name, ws) = match rest.rsplit_once('_') {
            Some((name, ws)) if self.bt_writing_systems.iter().skip(1).any(|w| w == ws) => {
                (name, ws.to_string())
            }
            _ => (rest, self.default_bt_ws().to_string()),
        };
        let main = format!("\\{name}");
        let known = main == ALTERNATE_VERSE
            || self.by_marker.get(&main).is_some_and(|p| !p.generated);
        known.then_some((main, ws))
    }

    fn synthesize(&mut self, marker: &str) -> StyleProxy {
        if let Some(proxy) = self.by_marker.get(marker) {
            return proxy.clone();
        }
        let style = marker.trim_start_matches('\\').replace('_', " ");
        let kind = if self.ends_in_stream(marker) {
            StyleKind::Character
        } else {
            StyleKind::Paragraph
        };
        tracing::warn!(marker, style, "unmapped marker; synthesizing a style");
        let proxy = StyleProxy::generated(style.clone(), kind);
        self.by_marker.insert(marker.to_string(), proxy.clone());
        self.by_style
            .entry((style, None))
            .or_insert_with(|| marker.to_string());
        self.generated.entry(marker.to_string()).or_insert(0);
        proxy
    }

    /// Counts a use of a marker for content.
    pub fn record_use(&mut self, marker: &str) {
        if let Some(count) = self.generated.get_mut(marker) {
            *count += 1;
        }
    }

    /// Forgets generated markers that never carried content and returns the
    /// names of generated styles that did.
    pub fn prune_unused(&mut self) -> Vec<String> {
        let unused: Vec<String> = self
            .generated
            .iter()
            .filter(|(_, &uses)| uses == 0)
            .map(|(m, _)| m.clone())
            .collect();
        for marker in unused {
            self.generated.remove(&marker);
            if let Some(proxy) = self.by_marker.remove(&marker) {
                self.by_style.remove(&(proxy.style, None));
            }
        }
        self.generated
            .keys()
            .filter_map(|m| self.by_marker.get(m).map(|p| p.style.clone()))
            .collect()
    }

    /// Every (marker, style) pair currently known, sorted by marker.
    pub fn mappings(&self) -> Vec<(String, String)> {
        let mut all: Vec<_> = self
            .by_marker
            .iter()
            .map(|(m, p)| (m.clone(), p.style.clone()))
            .collect();
        all.sort();
        all
    }
}

fn reserved_role(marker: &str) -> Option<MarkerRole> {
    let role = match marker {
        BOOK_ID => MarkerRole::BookId,
        RECORD => MarkerRole::Record,
        VERSE_REF => MarkerRole::VerseRef,
        ANNOTATION => MarkerRole::Annotation(AnnotationField::Discussion),
        ANNOTATION_REF => MarkerRole::Annotation(AnnotationField::Reference),
        ANNOTATION_CITED => MarkerRole::Annotation(AnnotationField::Cited),
        FIGURE => MarkerRole::InlinePicture,
        _ => {
            let (_, field) = PICTURE_FIELDS.iter().find(|(m, _)| *m == marker)?;
            MarkerRole::Picture(*field)
        }
    };
    Some(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::catalog::{DEFAULT_CHARACTERS, PARAGRAPH};

    fn map() -> MarkerMap {
        MarkerMap::new(
            &StyleCatalog::standard(),
            vec!["en".to_string(), "es".to_string()],
        )
    }

    #[test]
    fn test_catalog_markers() {
        let mut map = map();
        assert_eq!(map.marker_for(PARAGRAPH, None, StyleKind::Paragraph), "\\p");
        assert_eq!(
            map.marker_for("Name Of God", None, StyleKind::Character),
            "\\nd"
        );
    }

    #[test]
    fn test_note_context_disambiguates() {
        let mut map = map();
        let general = map.marker_for(
            "Note Target Reference",
            Some(NoteKind::General),
            StyleKind::Character,
        );
        let xref = map.marker_for(
            "Note Target Reference",
            Some(NoteKind::CrossReference),
            StyleKind::Character,
        );
        assert_eq!(general, "\\fr");
        assert_eq!(xref, "\\xo");
        assert_eq!(
            map.marker_for(DEFAULT_CHARACTERS, Some(NoteKind::General), StyleKind::Character),
            "\\ft"
        );
        // No note-specific mapping: fall back to the general one.
        assert_eq!(
            map.marker_for("Emphasis", Some(NoteKind::General), StyleKind::Character),
            "\\em"
        );
    }

    #[test]
    fn test_unmapped_style_round_trips_through_table() {
        let mut map = map();
        let marker = map.marker_for("My Special Style", None, StyleKind::Character);
        assert_eq!(marker, "\\My_Special_Style");
        // stable for the rest of the pass
        assert_eq!(
            map.marker_for("My Special Style", None, StyleKind::Character),
            marker
        );
        match map.resolve(&marker).role {
            MarkerRole::Style(proxy) => {
                assert_eq!(proxy.style, "My Special Style");
                assert_eq!(proxy.kind, StyleKind::Character);
            }
            other => panic!("unexpected role {other:?}"),
        }
    }

    #[test]
    fn test_fallback_marker_avoids_collisions() {
        let mut map = map();
        let marker = map.marker_for("p", None, StyleKind::Paragraph);
        assert_eq!(marker, "\\p_2");
    }

    #[test]
    fn test_resolve_back_translation_markers() {
        let mut map = map();
        let r = map.resolve("\\btp");
        assert_eq!(r.domain, Domain::BackTranslation("en".to_string()));
        assert!(matches!(r.role, MarkerRole::Style(ref p) if p.style == PARAGRAPH));

        let r = map.resolve("\\btvt_es");
        assert_eq!(r.domain, Domain::BackTranslation("es".to_string()));
        assert!(matches!(r.role, MarkerRole::Style(ref p) if p.function == StyleFunction::DefaultCharacters));

        let r = map.resolve("\\btva");
        assert_eq!(r.role, MarkerRole::AlternateVerse);

        let r = map.resolve("\\btnd*");
        assert_eq!(r.role, MarkerRole::End("\\nd".to_string()));
        assert_eq!(r.domain, Domain::BackTranslation("en".to_string()));

        assert_eq!(map.bt_marker("\\p", "es"), "\\btp_es");
        assert_eq!(map.bt_marker("\\p", "en"), "\\btp");
    }

    #[test]
    fn test_reserved_markers() {
        let mut map = map();
        assert_eq!(map.resolve("\\id").role, MarkerRole::BookId);
        let r = map.resolve("\\rem");
        assert_eq!(r.domain, Domain::Annotations);
        assert_eq!(
            map.resolve("\\figcat").role,
            MarkerRole::Picture(PictureField::FileName)
        );
    }

    #[test]
    fn test_unknown_markers_synthesized_and_pruned() {
        let mut map = map();
        map.note_end_markers(["\\zz*".to_string()]);
        let char_style = map.resolve("\\zz");
        assert!(matches!(char_style.role, MarkerRole::Style(ref p) if p.kind == StyleKind::Character && p.generated));
        let para = map.resolve("\\unused_para");
        assert!(matches!(para.role, MarkerRole::Style(ref p) if p.kind == StyleKind::Paragraph && p.style == "unused para"));

        map.record_use("\\zz");
        let kept = map.prune_unused();
        assert_eq!(kept, vec!["zz".to_string()]);
        assert!(map.proxy("\\unused_para").is_none());
        assert!(map.proxy("\\zz").is_some());
    }
}
