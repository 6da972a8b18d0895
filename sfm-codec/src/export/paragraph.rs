//! Paragraph writing: vernacular runs, numbers and back translations.

use super::back_translation::{number_kind, Emission, Interleaver, NumberGroup, NumberKind};
use super::BookWriter;
use crate::model::{EmbedRef, NoteKind, Paragraph, StyledRun};
use crate::reference::tracker::{is_implicit_first_verse_needed, ChapterAdvance, RunRole};
use crate::styles::catalog::{CHAPTER_NUMBER, DEFAULT_CHARACTERS, VERSE_NUMBER};
use crate::styles::mapping::{ALTERNATE_VERSE, RECORD, VERSE_REF};
use crate::styles::StyleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParagraphRole {
    Title,
    Heading,
    Content { intro: bool },
}

/// What the last write left behind on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RunState {
    /// Nothing written yet; the paragraph marker is still owed.
    BeforeMarker,
    NormalText,
    /// Stand-alone only: a character style line is open.
    InCharacterStyle,
    /// A note, picture or number was written.
    AfterObject,
    /// A back-translation line is open; vernacular text may not follow on it.
    AfterBackTranslation,
}

/// Which text a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Layer<'w> {
    Vernacular,
    BackTranslation(&'w str),
}

impl<'a> BookWriter<'a, '_> {
    pub(super) fn write_paragraph(&mut self, para: &'a Paragraph, role: ParagraphRole) {
        let marker = self.map.marker_for(&para.style, None, StyleKind::Paragraph);
        self.map.record_use(&marker);

        let translations = self.translations(para);
        let catalog = &self.config.styles;
        let interleave = self.dialect.is_inline()
            && self.config.interleave_back_translations
            && role == ParagraphRole::Content { intro: false }
            && !catalog.is_heading(&para.style)
            && !catalog.is_intro(&para.style);
        let mut interleaver =
            interleave.then(|| Interleaver::new(translations.clone(), &self.config.styles));

        let mut state = RunState::BeforeMarker;
        for (i, run) in para.runs.iter().enumerate() {
            if let Some(embed) = run.embed {
                self.ensure_marker(&marker, &mut state);
                self.write_embed(embed, Layer::Vernacular, &mut state);
                continue;
            }
            let group = NumberGroup::at(&para.runs, i, &self.config.styles);
            match number_kind(run, &self.config.styles) {
                Some(NumberKind::Chapter) => {
                    self.chapter(para, i, &marker, &mut state, group, &mut interleaver)
                }
                Some(NumberKind::Verse) => {
                    self.verse(run, &marker, &mut state, group, &mut interleaver)
                }
                None => {
                    self.ensure_marker(&marker, &mut state);
                    match &run.style {
                        Some(style) => {
                            self.character(&run.text, style, None, Layer::Vernacular, &mut state)
                        }
                        None => self.plain(&run.text, None, Layer::Vernacular, &mut state),
                    }
                }
            }
        }
        self.ensure_marker(&marker, &mut state);

        if let Some(mut inter) = interleaver {
            let rest = inter.finish();
            self.write_emissions(rest);
        }
        self.w.end_line();

        if !interleave {
            for (ws, runs) in translations {
                self.write_bt_paragraph(&marker, ws, runs);
            }
        }
    }

    /// Back translations to export for a paragraph, in configured order.
    fn translations(&self, para: &'a Paragraph) -> Vec<(&'a str, &'a [StyledRun])> {
        if !self.config.include_back_translations {
            return Vec::new();
        }
        let order = &self.config.back_translation_writing_systems;
        let mut found: Vec<(usize, &'a str, &'a [StyledRun])> = para
            .back_translations
            .iter()
            .filter(|(_, bt)| !bt.is_empty())
            .filter_map(|(ws, bt)| match order.iter().position(|w| w == ws) {
                Some(index) => Some((index, ws, bt.runs.as_slice())),
                None => {
                    tracing::debug!(ws, "back translation in unconfigured writing system skipped");
                    None
                }
            })
            .collect();
        found.sort_by_key(|(index, _, _)| *index);
        found.into_iter().map(|(_, ws, runs)| (ws, runs)).collect()
    }

    pub(super) fn ensure_marker(&mut self, marker: &str, state: &mut RunState) {
        if *state == RunState::BeforeMarker {
            self.w.start_line(marker);
            *state = RunState::NormalText;
        }
    }

    pub(super) fn layer_marker(&self, marker: &str, layer: Layer<'_>) -> String {
        match layer {
            Layer::Vernacular => marker.to_string(),
            Layer::BackTranslation(ws) => self.map.bt_marker(marker, ws),
        }
    }

    fn run_role<'r>(&self, run: &'r StyledRun) -> RunRole<'r> {
        if run.embed.is_some() {
            return RunRole::Object;
        }
        match number_kind(run, &self.config.styles) {
            Some(NumberKind::Chapter) => RunRole::Chapter,
            Some(NumberKind::Verse) => RunRole::Verse(self.grammar.parse_verse(&run.text).begin),
            None => RunRole::Text(&run.text),
        }
    }

    fn cross(
        &mut self,
        group: Option<NumberGroup>,
        interleaver: &mut Option<Interleaver<'a>>,
        state: &mut RunState,
    ) {
        if let (Some(group), Some(inter)) = (group, interleaver.as_mut()) {
            let due = inter.cross(&group);
            if self.write_emissions(due) {
                *state = RunState::AfterBackTranslation;
            }
        }
    }

    fn chapter(
        &mut self,
        para: &'a Paragraph,
        index: usize,
        marker: &str,
        state: &mut RunState,
        group: Option<NumberGroup>,
        interleaver: &mut Option<Interleaver<'a>>,
    ) {
        let run = &para.runs[index];
        let chapter = self.grammar.parse_chapter(&run.text);
        if chapter.invalid {
            tracing::warn!(book = %self.book.code, text = %run.text, "malformed chapter number");
        }

        let boundary = self.tracker.chapter_boundary(&chapter);
        self.flush_annotations(boundary);

        match self.tracker.advance_chapter(&chapter) {
            ChapterAdvance::New => {
                if !self.dialect.is_inline() && chapter.value > 0 {
                    self.w
                        .line(RECORD, &format!("{} {}", self.book.code, chapter.value));
                }
                let style = run.style.as_deref().unwrap_or(CHAPTER_NUMBER);
                let m = self.map.marker_for(style, None, StyleKind::Character);
                self.map.record_use(&m);
                self.w.start_line(&m);
                self.w.push_token(run.text.trim());
                if *state != RunState::BeforeMarker {
                    *state = RunState::AfterObject;
                }
            }
            ChapterAdvance::Repeat => {
                tracing::debug!(book = %self.book.code, chapter = chapter.value, "repeated chapter not written");
            }
        }
        self.ensure_marker(marker, state);
        self.cross(group, interleaver, state);

        let following = para.runs[index + 1..].iter().map(|r| self.run_role(r));
        if is_implicit_first_verse_needed(following) {
            self.tracker.set_implicit_first_verse();
            if !self.dialect.is_inline() {
                let current = self.tracker.current();
                self.w.line(
                    VERSE_REF,
                    &format!("{} {}", self.book.code, current.chapter_verse()),
                );
                *state = RunState::AfterObject;
            }
        }
    }

    fn verse(
        &mut self,
        run: &'a StyledRun,
        marker: &str,
        state: &mut RunState,
        group: Option<NumberGroup>,
        interleaver: &mut Option<Interleaver<'a>>,
    ) {
        let token = self.grammar.parse_verse(&run.text);
        if token.invalid {
            tracing::warn!(book = %self.book.code, text = %run.text, "malformed verse number");
        }
        self.ensure_marker(marker, state);
        self.cross(group, interleaver, state);

        let advance = self.tracker.preview_verse(&token);
        self.flush_annotations(advance.flush_before);
        self.tracker.advance_verse(&token);

        if !self.dialect.is_inline() {
            let chapter = self.tracker.current().chapter;
            self.w.line(
                VERSE_REF,
                &format!("{} {}:{}", self.book.code, chapter, token.raw.trim()),
            );
        }
        let style = run.style.as_deref().unwrap_or(VERSE_NUMBER);
        let m = self.map.marker_for(style, None, StyleKind::Character);
        self.map.record_use(&m);
        self.w.start_line(&m);
        self.w.push_token(run.text.trim());
        *state = RunState::NormalText;
    }

    pub(super) fn character(
        &mut self,
        text: &str,
        style: &str,
        note: Option<NoteKind>,
        layer: Layer<'_>,
        state: &mut RunState,
    ) {
        let base = self.map.marker_for(style, note, StyleKind::Character);
        self.map.record_use(&base);
        let m = self.layer_marker(&base, layer);
        if self.dialect.is_inline() {
            self.w.push_marker(&m);
            self.w.push_text(text);
            self.w.push_end_marker(&m);
            *state = RunState::NormalText;
        } else {
            self.w.start_line(&m);
            self.w.push_text(text);
            *state = RunState::InCharacterStyle;
        }
    }

    pub(super) fn plain(
        &mut self,
        text: &str,
        note: Option<NoteKind>,
        layer: Layer<'_>,
        state: &mut RunState,
    ) {
        let needs_marker = match *state {
            RunState::AfterBackTranslation => true,
            RunState::InCharacterStyle | RunState::AfterObject => !self.dialect.is_inline(),
            RunState::BeforeMarker | RunState::NormalText => false,
        };
        if needs_marker {
            let base = self
                .map
                .marker_for(DEFAULT_CHARACTERS, note, StyleKind::Character);
            let m = self.layer_marker(&base, layer);
            self.w.start_line(&m);
        }
        self.w.push_text(text);
        *state = RunState::NormalText;
    }

    fn write_embed(&mut self, embed: EmbedRef, layer: Layer<'_>, state: &mut RunState) {
        let book = self.book;
        match embed {
            EmbedRef::Footnote(id) => match book.footnote(id) {
                Some(footnote) => {
                    let runs = match layer {
                        Layer::Vernacular => footnote.paragraph.runs.as_slice(),
                        Layer::BackTranslation(ws) => footnote
                            .paragraph
                            .back_translations
                            .get(ws)
                            .map(|bt| bt.runs.as_slice())
                            .unwrap_or_default(),
                    };
                    self.write_footnote(footnote, runs, layer);
                    *state = RunState::AfterObject;
                }
                None => tracing::warn!(book = %book.code, id, "run refers to a missing footnote"),
            },
            EmbedRef::Picture(id) => match (layer, book.picture(id)) {
                (Layer::Vernacular, Some(picture)) => {
                    self.write_picture(picture);
                    *state = RunState::AfterObject;
                }
                (Layer::Vernacular, None) => {
                    tracing::warn!(book = %book.code, id, "run refers to a missing picture")
                }
                (Layer::BackTranslation(_), _) => {}
            },
        }
    }

    /// Writes interleaved back-translation pieces. Returns whether anything
    /// was written.
    fn write_emissions(&mut self, emissions: Vec<Emission<'a>>) -> bool {
        let wrote = !emissions.is_empty();
        for emission in emissions {
            let layer = Layer::BackTranslation(emission.ws);
            for run in emission.header.unwrap_or_default() {
                let base = match number_kind(run, &self.config.styles) {
                    Some(NumberKind::Chapter) => {
                        let style = run.style.as_deref().unwrap_or(CHAPTER_NUMBER);
                        self.map.marker_for(style, None, StyleKind::Character)
                    }
                    _ => ALTERNATE_VERSE.to_string(),
                };
                let m = self.layer_marker(&base, layer);
                self.w.line(&m, run.text.trim());
            }

            let base = self
                .map
                .marker_for(DEFAULT_CHARACTERS, None, StyleKind::Character);
            let m = self.layer_marker(&base, layer);
            self.w.start_line(&m);
            let mut state = RunState::NormalText;
            self.write_bt_body(emission.body, layer, &mut state);
            self.w.end_line();
        }
        wrote
    }

    fn write_bt_body(&mut self, runs: &'a [StyledRun], layer: Layer<'_>, state: &mut RunState) {
        for run in runs {
            if let Some(embed) = run.embed {
                self.write_embed(embed, layer, state);
                continue;
            }
            match &run.style {
                Some(style) => self.character(&run.text, style, None, layer, state),
                None => self.plain(&run.text, None, layer, state),
            }
        }
    }

    /// A back translation written as its own `\bt<marker>` paragraph after
    /// the vernacular one.
    fn write_bt_paragraph(&mut self, para_marker: &str, ws: &'a str, runs: &'a [StyledRun]) {
        let layer = Layer::BackTranslation(ws);
        let m = self.map.bt_marker(para_marker, ws);
        self.w.start_line(&m);
        let mut state = RunState::NormalText;
        for run in runs {
            match number_kind(run, &self.config.styles) {
                Some(kind) => {
                    let fallback = match kind {
                        NumberKind::Chapter => CHAPTER_NUMBER,
                        NumberKind::Verse => VERSE_NUMBER,
                    };
                    let style = run.style.as_deref().unwrap_or(fallback);
                    let base = self.map.marker_for(style, None, StyleKind::Character);
                    let bm = self.layer_marker(&base, layer);
                    self.w.start_line(&bm);
                    self.w.push_token(run.text.trim());
                    state = match kind {
                        NumberKind::Chapter => RunState::AfterObject,
                        NumberKind::Verse => RunState::NormalText,
                    };
                }
                None => self.write_bt_body(std::slice::from_ref(run), layer, &mut state),
            }
        }
        self.w.end_line();
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodecConfig;
    use crate::export::export_document;
    use crate::markup::Dialect;
    use crate::model::{
        Book, EmbedRef, Footnote, NoteKind, Paragraph, Scripture, ScriptureReference, ScriptureSink,
        Section, StyledRun,
    };
    use crate::styles::catalog::{CHAPTER_NUMBER, NOTE_GENERAL_PARAGRAPH, PARAGRAPH, VERSE_NUMBER};

    fn book_with(content: Vec<Paragraph>, footnotes: Vec<Footnote>) -> Scripture {
        let mut book = Book::new("MRK");
        let mut section = Section::new(false, ScriptureReference::new(41, 1, 1));
        section.content = content;
        book.sections.push(section);
        book.footnotes = footnotes;
        let mut doc = Scripture::default();
        doc.commit_book(book);
        doc
    }

    fn c(n: &str) -> StyledRun {
        StyledRun::styled(n, CHAPTER_NUMBER, "und")
    }

    fn v(n: &str) -> StyledRun {
        StyledRun::styled(n, VERSE_NUMBER, "und")
    }

    fn t(s: &str) -> StyledRun {
        StyledRun::plain(s, "und")
    }

    #[test]
    fn test_character_styles_per_dialect() {
        let para = Paragraph::with_runs(
            PARAGRAPH,
            vec![c("1"), v("1"), t("In the "), StyledRun::styled("Lord", "Name Of God", "und"), t(" said")],
        );
        let doc = book_with(vec![para], vec![]);
        let inline = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert!(inline.contains("\\v 1 In the \\nd Lord\\nd* said\n"));

        let stand_alone = export_document(&doc, &CodecConfig::default(), Dialect::StandAlone).unwrap();
        // the separator space after `\vt` is dropped on import; the run's own space survives
        assert!(stand_alone.contains("\\v 1 In the\n\\nd Lord\n\\vt  said\n"));
    }

    #[test]
    fn test_mid_paragraph_chapter() {
        let para = Paragraph::with_runs(
            PARAGRAPH,
            vec![c("1"), v("1"), t("end of one "), c("2"), v("1"), t("start of two")],
        );
        let doc = book_with(vec![para], vec![]);
        let out = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        insta::assert_snapshot!(out, @r"
        \id MRK
        \c 1
        \p
        \v 1 end of one
        \c 2
        \v 1 start of two
        ");
    }

    #[test]
    fn test_footnote_inline_and_stand_alone() {
        let note = Footnote {
            id: 1,
            kind: NoteKind::General,
            caller: "+".to_string(),
            paragraph: Paragraph::with_runs(
                NOTE_GENERAL_PARAGRAPH,
                vec![
                    t("Some manuscripts add "),
                    StyledRun::styled("Son of God", "Referenced Text", "und"),
                    t("."),
                ],
            ),
        };
        let para = Paragraph::with_runs(
            PARAGRAPH,
            vec![c("1"), v("1"), t("The beginning"), StyledRun::embedded(EmbedRef::Footnote(1), "und"), t(" of the gospel")],
        );
        let doc = book_with(vec![para], vec![note]);

        let inline = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        assert!(inline.contains(
            "\\v 1 The beginning\\f + \\ft Some manuscripts add \\fq Son of God\\fq*.\\f* of the gospel\n"
        ));

        let stand_alone = export_document(&doc, &CodecConfig::default(), Dialect::StandAlone).unwrap();
        assert!(stand_alone.contains(
            "\\v 1 The beginning\n\\f Some manuscripts add\n\\fq Son of God\n\\ft .\n\\vt  of the gospel\n"
        ));
    }

    #[test]
    fn test_interleaved_back_translation() {
        let para = Paragraph::with_runs(PARAGRAPH, vec![c("1"), v("1"), t("uno "), v("2"), t("dos")])
            .with_back_translation("en", vec![c("1"), v("1"), t("one "), v("2"), t("two")]);
        let doc = book_with(vec![para], vec![]);
        let out = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        insta::assert_snapshot!(out, @r"
        \id MRK
        \c 1
        \p
        \v 1 uno
        \btvt one
        \v 2 dos
        \btvt two
        ");
    }

    #[test]
    fn test_back_translation_with_missing_verse_is_explicit() {
        let para = Paragraph::with_runs(
            PARAGRAPH,
            vec![c("1"), v("1"), t("uno "), v("2"), t("dos "), v("3"), t("tres")],
        )
        .with_back_translation("en", vec![c("1"), v("1"), t("one and two "), v("3"), t("three")]);
        let doc = book_with(vec![para], vec![]);
        let out = export_document(&doc, &CodecConfig::default(), Dialect::Inline).unwrap();
        insta::assert_snapshot!(out, @r"
        \id MRK
        \c 1
        \p
        \v 1 uno
        \v 2 dos
        \btc 1
        \btva 1
        \btvt one and two
        \v 3 tres
        \btvt three
        ");
    }

    #[test]
    fn test_non_interleaved_back_translation_paragraph() {
        let para = Paragraph::with_runs(PARAGRAPH, vec![c("1"), v("1"), t("uno")])
            .with_back_translation("en", vec![c("1"), v("1"), t("one")]);
        let doc = book_with(vec![para], vec![]);
        let config = CodecConfig {
            interleave_back_translations: false,
            ..CodecConfig::default()
        };
        let out = export_document(&doc, &config, Dialect::Inline).unwrap();
        insta::assert_snapshot!(out, @r"
        \id MRK
        \c 1
        \p
        \v 1 uno
        \btp
        \btc 1
        \btv 1 one
        ");
    }

    #[test]
    fn test_implicit_first_verse_in_stand_alone() {
        let para = Paragraph::with_runs(PARAGRAPH, vec![c("1"), t("No number here")]);
        let doc = book_with(vec![para], vec![]);
        let out = export_document(&doc, &CodecConfig::default(), Dialect::StandAlone).unwrap();
        assert!(out.contains("\\c 1\n\\p\n\\vref MRK 1:1\n\\vt No number here\n"));
    }
}
