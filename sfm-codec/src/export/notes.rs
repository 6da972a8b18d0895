//! Footnotes and pictures.

use super::paragraph::Layer;
use super::BookWriter;
use crate::model::{Footnote, Picture, StyledRun};
use crate::styles::catalog::DEFAULT_CHARACTERS;
use crate::styles::mapping::{picture_field_marker, PictureField, FIGURE};
use crate::styles::StyleKind;

impl BookWriter<'_, '_> {
    /// Writes a note. `runs` are the vernacular runs or one back translation
    /// of the note paragraph, depending on `layer`.
    pub(super) fn write_footnote(&mut self, footnote: &Footnote, runs: &[StyledRun], layer: Layer<'_>) {
        let base = self
            .map
            .marker_for(&footnote.paragraph.style, None, StyleKind::Paragraph);
        self.map.record_use(&base);
        let marker = self.layer_marker(&base, layer);

        if self.dialect.is_inline() {
            self.w.push_marker(&marker);
            let caller = footnote.caller.trim();
            self.w.push_token(if caller.is_empty() { "+" } else { caller });
            for (i, run) in runs.iter().filter(|r| r.embed.is_none()).enumerate() {
                match &run.style {
                    Some(style) => {
                        let m = self.note_marker(style, footnote, layer);
                        self.w.push_marker(&m);
                        self.w.push_text(&run.text);
                        self.w.push_end_marker(&m);
                    }
                    None => {
                        if i == 0 {
                            let m = self.note_marker(DEFAULT_CHARACTERS, footnote, layer);
                            self.w.push_marker(&m);
                        }
                        self.w.push_text(&run.text);
                    }
                }
            }
            self.w.push_end_marker(&marker);
            return;
        }

        // Stand-alone: the caller is implied and every styled run gets a line.
        self.w.start_line(&marker);
        let mut after_style = false;
        for run in runs.iter().filter(|r| r.embed.is_none()) {
            match &run.style {
                Some(style) => {
                    let m = self.note_marker(style, footnote, layer);
                    self.w.start_line(&m);
                    self.w.push_text(&run.text);
                    after_style = true;
                }
                None => {
                    if after_style {
                        let m = self.note_marker(DEFAULT_CHARACTERS, footnote, layer);
                        self.w.start_line(&m);
                    }
                    self.w.push_text(&run.text);
                    after_style = false;
                }
            }
        }
    }

    fn note_marker(&mut self, style: &str, footnote: &Footnote, layer: Layer<'_>) -> String {
        let base = self
            .map
            .marker_for(style, Some(footnote.kind), StyleKind::Character);
        self.map.record_use(&base);
        self.layer_marker(&base, layer)
    }

    pub(super) fn write_picture(&mut self, picture: &Picture) {
        if self.dialect.is_inline() {
            let slots = [
                picture.description.as_deref().unwrap_or_default(),
                picture.file_name.as_str(),
                picture.layout.as_deref().unwrap_or_default(),
                picture.location.as_deref().unwrap_or_default(),
                picture.copyright.as_deref().unwrap_or_default(),
                picture.caption.as_str(),
                picture.scale.as_deref().unwrap_or_default(),
            ];
            self.w.push_marker(FIGURE);
            self.w.push_text(&slots.join("|"));
            self.w.push_end_marker(FIGURE);
            return;
        }

        self.w
            .line(picture_field_marker(PictureField::Caption), &picture.caption);
        self.w
            .line(picture_field_marker(PictureField::FileName), &picture.file_name);
        let optional = [
            (PictureField::Copyright, &picture.copyright),
            (PictureField::Description, &picture.description),
            (PictureField::Layout, &picture.layout),
            (PictureField::Scale, &picture.scale),
            (PictureField::Location, &picture.location),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                self.w.line(picture_field_marker(field), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodecConfig;
    use crate::export::export_document;
    use crate::markup::Dialect;
    use crate::model::{
        Book, EmbedRef, Footnote, NoteKind, Paragraph, Picture, Scripture, ScriptureReference,
        ScriptureSink, Section, StyledRun,
    };
    use crate::styles::catalog::{NOTE_CROSS_REFERENCE_PARAGRAPH, PARAGRAPH};

    fn doc_with(runs: Vec<StyledRun>, footnotes: Vec<Footnote>, pictures: Vec<Picture>) -> Scripture {
        let mut book = Book::new("MRK");
        let mut section = Section::new(false, ScriptureReference::new(41, 1, 0));
        section.content.push(Paragraph::with_runs(PARAGRAPH, runs));
        book.sections.push(section);
        book.footnotes = footnotes;
        book.pictures = pictures;
        let mut doc = Scripture::default();
        doc.commit_book(book);
        doc
    }

    fn sample_picture() -> Picture {
        Picture {
            id: 1,
            caption: "Jesus heals".to_string(),
            file_name: "heal.jpg".to_string(),
            layout: Some("col".to_string()),
            ..Picture::default()
        }
    }

    #[test]
    fn test_cross_reference_uses_note_context_markers() {
        let note = Footnote {
            id: 1,
            kind: NoteKind::CrossReference,
            caller: "-".to_string(),
            paragraph: Paragraph::with_runs(
                NOTE_CROSS_REFERENCE_PARAGRAPH,
                vec![
                    StyledRun::styled("1.2 ", "Note Target Reference", "und"),
                    StyledRun::plain("Mal 3.1", "und"),
                ],
            ),
        };
        let doc = doc_with(
            vec![
                StyledRun::plain("text", "und"),
                StyledRun::embedded(EmbedRef::Footnote(1), "und"),
            ],
            vec![note],
            vec![],
        );
        let out = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert!(out.contains("\\p text\\x - \\xo 1.2 \\xo*Mal 3.1\\x*\n"));
    }

    #[test]
    fn test_inline_picture_slots() {
        let doc = doc_with(
            vec![StyledRun::embedded(EmbedRef::Picture(1), "und")],
            vec![],
            vec![sample_picture()],
        );
        let out = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert!(out.contains("\\p \\fig |heal.jpg|col|||Jesus heals|\\fig*\n"));
    }

    #[test]
    fn test_stand_alone_picture_fields() {
        let doc = doc_with(
            vec![StyledRun::embedded(EmbedRef::Picture(1), "und")],
            vec![],
            vec![sample_picture()],
        );
        let out = export_document(&doc, &CodecConfig::default(), Dialect::StandAlone).unwrap();
        insta::assert_snapshot!(out, @r"
        \rcrd MRK
        \id MRK
        \p
        \figcap Jesus heals
        \figcat heal.jpg
        \figlaypos col
        ");
    }
}
