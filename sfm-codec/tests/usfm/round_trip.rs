//! Stream → model → stream, and model → stream → model.

use crate::common::{c, mark, paragraph, t, texts, v};
use sfm_codec::model::StyledRun;
use sfm_codec::{
    export_document, export_to_file, export_with, import_file, import_str, import_with, CodecConfig,
    Dialect, NoProgress, Scripture,
};

#[test]
fn test_interleaved_stream_is_reproduced() {
    let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n\\btvt one\n\\v 2 dos\n\\btvt two\n";
    let config = CodecConfig::default();
    let (doc, _) = import_str(source, &config, Dialect::Inline).unwrap();
    let out = export_document(&doc, &config, Dialect::Inline).unwrap();
    assert_eq!(out, source);
}

#[test]
fn test_annotations_survive_a_round_trip() {
    let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 uno\n\\rem check this\n\\remq uno\n\\v 2 dos\n\\rem range\n\\remref MRK 1:2-1:4\n";
    let config = CodecConfig::default();
    let (doc, _) = import_str(source, &config, Dialect::Inline).unwrap();
    let out = export_document(&doc, &config, Dialect::Inline).unwrap();
    let (again, report) = import_str(&out, &config, Dialect::Inline).unwrap();

    assert_eq!(report.annotations, 2);
    assert_eq!(again.annotations, doc.annotations);
    assert_eq!(
        again.books[0].sections[0].content[0].runs,
        doc.books[0].sections[0].content[0].runs
    );
}

#[test]
fn test_unmapped_style_gets_a_generated_marker() {
    let doc = mark(vec![paragraph(vec![
        c("1"),
        v("1"),
        t("Then "),
        StyledRun::styled("Speaker Name", "Speaker Name", "und"),
        t(" spoke"),
    ])]);
    let config = CodecConfig::default();
    let mut map = config.marker_map();
    let out = export_with(&doc, &config, Dialect::Inline, &mut map, &NoProgress).unwrap();
    assert!(out.contains("\\Speaker_Name Speaker Name\\Speaker_Name*"));

    let mut again = Scripture::default();
    import_with(&out, "mrk.sfm", &mut again, &config, Dialect::Inline, &mut map, &NoProgress).unwrap();
    let runs = &again.books[0].sections[0].content[0].runs;
    assert!(runs.iter().any(|r| r.has_style("Speaker Name")));
}

#[test]
fn test_unknown_marker_is_reported_as_new_style() {
    let source = "\\id MRK\n\\c 1\n\\p\n\\v 1 a \\zq b\\zq* c\n";
    let (doc, report) = import_str(source, &CodecConfig::default(), Dialect::Inline).unwrap();
    assert_eq!(report.new_styles, vec!["zq".to_string()]);
    let runs = &doc.books[0].sections[0].content[0].runs;
    assert!(runs.iter().any(|r| r.has_style("zq") && r.text == "b"));
}

#[test]
fn test_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("41MRK.SFM");
    let doc = mark(vec![paragraph(vec![c("1"), v("1"), t("uno "), v("2"), t("dos")])]);
    let config = CodecConfig::default();
    export_to_file(&doc, &path, &config, Dialect::Inline, &NoProgress).unwrap();

    let mut again = Scripture::default();
    let report = import_file(&path, &mut again, &config, Dialect::Inline, &NoProgress).unwrap();
    assert_eq!(report.committed().count(), 1);
    assert!(report.file.ends_with("41MRK.SFM"));
    let runs = &again.books[0].sections[0].content[0].runs;
    assert_eq!(texts(runs), vec!["1", "1", "uno ", "2", "dos"]);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = Scripture::default();
    let result = import_file(
        &dir.path().join("absent.sfm"),
        &mut doc,
        &CodecConfig::default(),
        Dialect::Inline,
        &NoProgress,
    );
    assert!(matches!(result, Err(sfm_codec::ImportError::Io { .. })));
}

const REPRESENTATIVE: &str = "\\id MRK
\\mt Mark
\\is Introduction
\\ip About this book.
\\s John the Baptist
\\c 1
\\p
\\v 1 The beginning\\f + \\ft a note\\f*
\\btvt one
\\btvt_es uno
\\v 2 As it is written
\\btvt two
\\btvt_es dos
\\s Jesus is baptized
\\p
\\v 3-4 In those days \\fig |dove.jpg|col|||The dove|\\fig*
";

fn paragraph_texts(doc: &Scripture) -> Vec<String> {
    let book = &doc.books[0];
    book.title
        .iter()
        .chain(book.sections.iter().flat_map(|s| s.heading.iter().chain(&s.content)))
        .map(|p| p.text())
        .collect()
}

#[test]
fn test_representative_book_survives_export_and_import() {
    let config = CodecConfig {
        back_translation_writing_systems: vec!["en".to_string(), "es".to_string()],
        ..CodecConfig::default()
    };
    let (doc, _) = import_str(REPRESENTATIVE, &config, Dialect::Inline).unwrap();
    let out = export_document(&doc, &config, Dialect::Inline).unwrap();
    let (again, report) = import_str(&out, &config, Dialect::Inline).unwrap();
    assert_eq!(report.failures().count(), 0);

    let book = &again.books[0];
    assert_eq!(book.title[0].text(), "Mark");
    assert_eq!(book.sections.len(), 3);
    assert!(book.sections[0].intro);
    assert!(!book.sections[1].intro && !book.sections[2].intro);
    assert_eq!(paragraph_texts(&again), paragraph_texts(&doc));

    assert_eq!(book.footnotes.len(), 1);
    assert_eq!(book.footnotes[0].paragraph.text(), doc.books[0].footnotes[0].paragraph.text());
    assert_eq!(book.pictures, doc.books[0].pictures);
    assert_eq!(book.pictures[0].file_name, "dove.jpg");
    assert_eq!(book.pictures[0].caption, "The dove");

    let bridge = &book.sections[2].content[0].runs;
    assert!(bridge.iter().any(|r| r.text == "3-4"));

    let first = &book.sections[1].content[0];
    let original = &doc.books[0].sections[1].content[0];
    for (ws, word) in [("en", "one"), ("es", "uno")] {
        let bt = first.back_translations.get(ws).unwrap();
        assert!(bt.text().contains(word));
        assert_eq!(bt.text(), original.back_translations.get(ws).unwrap().text());
    }
}
