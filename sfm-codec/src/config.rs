//! Codec settings for one export or import pass.

use crate::reference::{NumberGrammar, VariantPassage};
use crate::styles::{MarkerMap, StyleCatalog};
use serde::{Deserialize, Serialize};

/// Everything a pass needs besides the document and the stream.
///
/// `sfm-config` builds this from layered TOML; tests usually start from
/// [`CodecConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub bridge_separator: String,
    /// Verse numbers above this are treated as malformed.
    pub max_verse: u16,
    /// Zero digit of the numbering system used when writing numbers.
    pub digit_zero: char,
    /// Writing system of vernacular text.
    pub default_writing_system: String,
    /// Back-translation writing systems; the first one is the default and its
    /// markers carry no `_ws` suffix.
    pub back_translation_writing_systems: Vec<String>,
    pub variant_passages: Vec<VariantPassage>,
    pub interleave_back_translations: bool,
    pub include_annotations: bool,
    pub include_back_translations: bool,
    /// Joins a heading back translation onto an earlier one when two
    /// headings share a style.
    pub heading_append_separator: String,
    pub styles: StyleCatalog,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            bridge_separator: "-".to_string(),
            max_verse: 176,
            digit_zero: '0',
            default_writing_system: "und".to_string(),
            back_translation_writing_systems: vec!["en".to_string()],
            variant_passages: vec![VariantPassage {
                book: 41,
                chapter: 16,
                first_verse: 9,
                last_verse: 20,
            }],
            interleave_back_translations: true,
            include_annotations: true,
            include_back_translations: true,
            heading_append_separator: " ".to_string(),
            styles: StyleCatalog::standard(),
        }
    }
}

impl CodecConfig {
    pub fn grammar(&self) -> NumberGrammar {
        NumberGrammar {
            bridge: self.bridge_separator.clone(),
            max_verse: self.max_verse,
            digit_zero: self.digit_zero,
        }
    }

    /// A fresh mapping table for one pass.
    pub fn marker_map(&self) -> MarkerMap {
        MarkerMap::new(&self.styles, self.back_translation_writing_systems.clone())
    }

    pub fn is_back_translation_ws(&self, ws: &str) -> bool {
        self.back_translation_writing_systems.iter().any(|w| w == ws)
    }
}
