//! Back translations: interleaved ones, and separate streams merged onto existing books.

use crate::common::texts;
use sfm_codec::model::EmbedRef;
use sfm_codec::{import_str, import_with, BookOutcome, CodecConfig, Dialect, NoProgress, Scripture};

fn vernacular() -> Scripture {
    let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n";
    import_str(source, &CodecConfig::default(), Dialect::Inline)
        .unwrap()
        .0
}

fn import_into(doc: &mut Scripture, source: &str) -> sfm_codec::ImportReport {
    let config = CodecConfig::default();
    let mut map = config.marker_map();
    import_with(source, "mrk-bt.sfm", doc, &config, Dialect::Inline, &mut map, &NoProgress).unwrap()
}

#[test]
fn test_separate_back_translation_file_merges() {
    let mut doc = vernacular();
    let before = doc.books[0].sections[0].content[0].runs.clone();

    let report = import_into(&mut doc, "\\id MRK\n\\btp\n\\btc 1\n\\btv 1 one\n");
    assert_eq!(report.books[0].outcome, BookOutcome::Committed);

    let para = &doc.books[0].sections[0].content[0];
    assert_eq!(para.runs, before);
    let bt = para.back_translations.get("en").unwrap();
    assert_eq!(bt.runs.last().map(|r| r.text.as_str()), Some("one"));
    assert!(texts(&bt.runs).starts_with(&["1", "1"]));
}

#[test]
fn test_unplaceable_back_translation_leaves_book_untouched() {
    let mut doc = vernacular();
    let before = doc.clone();

    let report = import_into(&mut doc, "\\id MRK\n\\bts A heading nobody wrote\n");
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].marker, "\\bts");
    assert_eq!(failures[0].line, 2);
    assert_eq!(doc, before);
}

#[test]
fn test_back_translated_character_style_spans_a_note() {
    let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 el \\nd Señor\\f + \\ft n\\f* dijo\\nd*\n\\btvt the \\btnd Lord\\btf + \\btft note\\btf* God\\btnd* said\n";
    let (doc, report) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
    assert_eq!(report.failures().count(), 0);

    let book = &doc.books[0];
    let bt = book.sections[0].content[0].back_translations.get("en").unwrap();
    let lord = bt.runs.iter().position(|r| r.text == "Lord").unwrap();
    assert!(bt.runs[lord].has_style("Name Of God"));
    assert_eq!(bt.runs[lord + 1].embed, Some(EmbedRef::Footnote(1)));
    assert_eq!(bt.runs[lord + 2].text, " God");
    assert!(bt.runs[lord + 2].has_style("Name Of God"));
    assert_eq!(bt.runs[lord + 3].text, " said");
    assert!(bt.runs[lord + 3].style.is_none());

    let note = book.footnotes[0].paragraph.back_translations.get("en").unwrap();
    assert_eq!(note.text(), "note");
}

#[test]
fn test_repeated_heading_back_translation_is_appended() {
    let source = "\\id MRK\n\\s Heading\n\\bts First\n\\bts Second\n\\c 1\n\\p\n\\v 1 uno\n";
    let (doc, _) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
    let heading = &doc.books[0].sections[0].heading[0];
    assert_eq!(heading.back_translations.get("en").unwrap().text(), "First Second");

    let config = CodecConfig {
        heading_append_separator: " / ".to_string(),
        ..CodecConfig::default()
    };
    let (doc, _) = import_str(source, &config, Dialect::Inline).unwrap();
    let heading = &doc.books[0].sections[0].heading[0];
    assert_eq!(heading.back_translations.get("en").unwrap().text(), "First / Second");
}
