//! Stand-alone dialect round trips.

use crate::common::{c, mark, paragraph, t, v};
use sfm_codec::model::StyledRun;
use sfm_codec::{export_document, import_str, CodecConfig, Dialect};

#[test]
fn test_character_style_lines_round_trip() {
    let doc = mark(vec![paragraph(vec![
        c("1"),
        v("1"),
        t("In the "),
        StyledRun::styled("Lord", "Name Of God", "und"),
        t(" said"),
    ])]);
    let config = CodecConfig::default();
    let out = export_document(&doc, &config, Dialect::StandAlone).unwrap();
    let (again, _) = import_str(&out, &config, Dialect::StandAlone).unwrap();
    assert_eq!(
        again.books[0].sections[0].content[0].runs,
        doc.books[0].sections[0].content[0].runs
    );
}

#[test]
fn test_record_and_reference_lines() {
    let doc = mark(vec![paragraph(vec![c("1"), v("1"), t("First "), v("2"), t("Second")])]);
    let out = export_document(&doc, &CodecConfig::default(), Dialect::StandAlone).unwrap();
    insta::assert_snapshot!(out, @r"
    \rcrd MRK
    \id MRK
    \rcrd MRK 1
    \c 1
    \p
    \vref MRK 1:1
    \v 1 First
    \vref MRK 1:2
    \v 2 Second
    ");

    let (again, report) = import_str(&out, &CodecConfig::default(), Dialect::StandAlone).unwrap();
    assert_eq!(report.committed().count(), 1);
    assert_eq!(
        again.books[0].sections[0].content[0].runs,
        doc.books[0].sections[0].content[0].runs
    );
}
