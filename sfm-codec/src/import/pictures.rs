//! Pictures: one `\fig ...\fig*` in inline text, or a group of `\fig*`-less
//! field lines in the stand-alone dialect.

use super::state::{BookBuild, BookMode, Pass};
use crate::markup::Segment;
use crate::model::{EmbedRef, Picture, PictureId};
use crate::styles::PictureField;
use std::collections::HashSet;

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn set_field(picture: &mut Picture, field: PictureField, value: &str) {
    match field {
        PictureField::Caption => picture.caption = value.trim().to_string(),
        PictureField::FileName => picture.file_name = value.trim().to_string(),
        PictureField::Copyright => picture.copyright = optional(value),
        PictureField::Description => picture.description = optional(value),
        PictureField::Layout => picture.layout = optional(value),
        PictureField::Scale => picture.scale = optional(value),
        PictureField::Location => picture.location = optional(value),
    }
}

/// Slot order of the inline `|`-separated form.
const INLINE_SLOTS: [PictureField; 7] = [
    PictureField::Description,
    PictureField::FileName,
    PictureField::Layout,
    PictureField::Location,
    PictureField::Copyright,
    PictureField::Caption,
    PictureField::Scale,
];

impl BookBuild {
    fn new_picture(&mut self, pass: &Pass<'_>, seg: &Segment) -> PictureId {
        self.close_footnotes(pass, seg);
        self.before_content(pass, seg);
        let id = self.book.pictures.len() as PictureId + 1;
        self.book.pictures.push(Picture {
            id,
            ..Picture::default()
        });
        self.push_embed(EmbedRef::Picture(id));
        id
    }

    /// One stand-alone field line. A field seen twice starts the next picture.
    pub(super) fn picture_field(&mut self, pass: &Pass<'_>, field: PictureField, seg: &Segment) {
        if self.mode == BookMode::BackTranslationOnly {
            return;
        }
        let repeated = self
            .picture
            .as_ref()
            .map_or(true, |(_, seen)| seen.contains(&field));
        if repeated {
            let id = self.new_picture(pass, seg);
            self.picture = Some((id, HashSet::new()));
        }
        let Some((id, seen)) = self.picture.as_mut() else {
            return;
        };
        seen.insert(field);
        let id = *id;
        if let Some(picture) = self.book.picture_mut(id) {
            set_field(picture, field, &seg.text);
        }
    }

    /// `\fig desc|file|layout|location|copyright|caption|scale\fig*`. A
    /// value without any `|` is the caption.
    pub(super) fn inline_picture(&mut self, pass: &Pass<'_>, seg: &Segment) {
        if self.mode == BookMode::BackTranslationOnly {
            return;
        }
        let id = self.new_picture(pass, seg);
        let Some(picture) = self.book.picture_mut(id) else {
            return;
        };
        if !seg.text.contains('|') {
            set_field(picture, PictureField::Caption, &seg.text);
            return;
        }
        let slots: Vec<&str> = seg.text.split('|').collect();
        if slots.len() > INLINE_SLOTS.len() {
            tracing::warn!(line = seg.line, slots = slots.len(), "extra picture fields ignored");
        }
        for (field, value) in INLINE_SLOTS.iter().zip(slots) {
            set_field(picture, *field, value);
        }
    }
}
