//! Document builders shared by the format suites.

use sfm_codec::model::{Book, Paragraph, Scripture, ScriptureReference, ScriptureSink, Section, StyledRun};
use sfm_codec::styles::catalog::{CHAPTER_NUMBER, PARAGRAPH, VERSE_NUMBER};

pub fn c(n: &str) -> StyledRun {
    StyledRun::styled(n, CHAPTER_NUMBER, "und")
}

pub fn v(n: &str) -> StyledRun {
    StyledRun::styled(n, VERSE_NUMBER, "und")
}

pub fn t(s: &str) -> StyledRun {
    StyledRun::plain(s, "und")
}

pub fn paragraph(runs: Vec<StyledRun>) -> Paragraph {
    Paragraph::with_runs(PARAGRAPH, runs)
}

/// Mark with one untitled section holding `content`.
pub fn mark(content: Vec<Paragraph>) -> Scripture {
    let mut book = Book::new("MRK");
    let mut section = Section::new(false, ScriptureReference::new(41, 1, 1));
    section.content = content;
    book.sections.push(section);
    let mut doc = Scripture::default();
    doc.commit_book(book);
    doc
}

pub fn texts(runs: &[StyledRun]) -> Vec<&str> {
    runs.iter().map(|r| r.text.as_str()).collect()
}
