//! Scripture references and the canonical book table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-letter book codes in canonical order. `BOOK_CODES[0]` is book 1.
pub const BOOK_CODES: [&str; 66] = [
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "1SA", "2SA", "1KI", "2KI", "1CH",
    "2CH", "EZR", "NEH", "EST", "JOB", "PSA", "PRO", "ECC", "SNG", "ISA", "JER", "LAM", "EZK",
    "DAN", "HOS", "JOL", "AMO", "OBA", "JON", "MIC", "NAM", "HAB", "ZEP", "HAG", "ZEC", "MAL",
    "MAT", "MRK", "LUK", "JHN", "ACT", "ROM", "1CO", "2CO", "GAL", "EPH", "PHP", "COL", "1TH",
    "2TH", "1TI", "2TI", "TIT", "PHM", "HEB", "JAS", "1PE", "2PE", "1JN", "2JN", "3JN", "JUD",
    "REV",
];

/// Canonical number (1-based) for a book code, case-insensitive.
pub fn book_number(code: &str) -> Option<u16> {
    BOOK_CODES
        .iter()
        .position(|c| c.eq_ignore_ascii_case(code.trim()))
        .map(|i| i as u16 + 1)
}

/// Book code for a canonical number.
pub fn book_code(number: u16) -> Option<&'static str> {
    BOOK_CODES.get(usize::from(number).checked_sub(1)?).copied()
}

/// A position in Scripture.
///
/// Ordering is by `(book, chapter, verse, segment)`. Verse 0 is the
/// introduction or front matter of a chapter; segment 0 means "no sub-verse
/// letter", segment 1 is `a`, 2 is `b` and so on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ScriptureReference {
    pub book: u16,
    pub chapter: u16,
    pub verse: u16,
    pub segment: u8,
}

impl ScriptureReference {
    pub const fn new(book: u16, chapter: u16, verse: u16) -> Self {
        Self {
            book,
            chapter,
            verse,
            segment: 0,
        }
    }

    pub const fn with_segment(self, segment: u8) -> Self {
        Self { segment, ..self }
    }

    /// The front-matter position of a book (chapter 1, verse 0).
    pub const fn book_start(book: u16) -> Self {
        Self::new(book, 1, 0)
    }

    /// The first position past the given verse.
    pub fn next_verse(self) -> Self {
        Self::new(self.book, self.chapter, self.verse.saturating_add(1))
    }

    /// The first position of the following chapter.
    pub fn next_chapter(self) -> Self {
        Self::new(self.book, self.chapter.saturating_add(1), 0)
    }

    /// Parses `MRK 1:2`, `MRK 1:2a` or `MRK 1` (verse 0).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (code, rest) = text.split_once(char::is_whitespace)?;
        let book = book_number(code)?;
        Self::parse_in_book(book, rest.trim())
    }

    /// Parses a `c:v` pair (or a lone chapter) relative to a known book.
    pub fn parse_in_book(book: u16, text: &str) -> Option<Self> {
        let (chapter, verse) = match text.split_once(':') {
            Some((c, v)) => (c, Some(v)),
            None => (text, None),
        };
        let chapter = chapter.trim().parse().ok()?;
        let (verse, segment) = match verse {
            Some(v) => {
                let v = v.trim();
                let digits: String = v.chars().take_while(char::is_ascii_digit).collect();
                let suffix = &v[digits.len()..];
                let segment = match suffix.chars().next() {
                    Some(c) if c.is_ascii_lowercase() && suffix.len() == 1 => c as u8 - b'a' + 1,
                    None => 0,
                    _ => return None,
                };
                (digits.parse().ok()?, segment)
            }
            None => (0, 0),
        };
        Some(Self::new(book, chapter, verse).with_segment(segment))
    }

    /// Parses a reference range `MRK 1:2-1:5` or `MRK 1:2-5`.
    pub fn parse_range(text: &str) -> Option<(Self, Self)> {
        let text = text.trim();
        let Some((first, second)) = text.split_once('-') else {
            let single = Self::parse(text)?;
            return Some((single, single));
        };
        let begin = Self::parse(first)?;
        let second = second.trim();
        let end = if second.contains(':') {
            Self::parse_in_book(begin.book, second)?
        } else {
            Self::parse_in_book(begin.book, &format!("{}:{second}", begin.chapter))?
        };
        Some((begin, end.max(begin)))
    }

    /// `c:v[a]` without the book code.
    pub fn chapter_verse(&self) -> String {
        let mut out = format!("{}:{}", self.chapter, self.verse);
        if (1..=26).contains(&self.segment) {
            out.push(char::from(b'a' + self.segment - 1));
        }
        out
    }
}

impl fmt::Display for ScriptureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = book_code(self.book).unwrap_or("???");
        write!(f, "{code} {}", self.chapter_verse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_table() {
        assert_eq!(book_number("MRK"), Some(41));
        assert_eq!(book_number("mrk"), Some(41));
        assert_eq!(book_code(1), Some("GEN"));
        assert_eq!(book_code(66), Some("REV"));
        assert_eq!(book_code(0), None);
        assert_eq!(book_number("XYZ"), None);
    }

    #[test]
    fn test_ordering_is_book_chapter_verse_segment() {
        let a = ScriptureReference::new(41, 1, 2);
        let b = ScriptureReference::new(41, 1, 2).with_segment(1);
        let c = ScriptureReference::new(41, 2, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(ScriptureReference::new(40, 28, 20) < ScriptureReference::book_start(41));
    }

    #[test]
    fn test_display_and_parse() {
        let r = ScriptureReference::new(41, 16, 9).with_segment(2);
        assert_eq!(r.to_string(), "MRK 16:9b");
        assert_eq!(ScriptureReference::parse("MRK 16:9b"), Some(r));
        assert_eq!(
            ScriptureReference::parse("GEN 3"),
            Some(ScriptureReference::new(1, 3, 0))
        );
        assert_eq!(ScriptureReference::parse("nonsense"), None);
    }

    #[test]
    fn test_segment_past_z_has_no_letter() {
        let r = ScriptureReference::new(41, 1, 2);
        assert_eq!(r.with_segment(26).chapter_verse(), "1:2z");
        assert_eq!(r.with_segment(27).chapter_verse(), "1:2");
        assert_eq!(r.with_segment(u8::MAX).to_string(), "MRK 1:2");
    }

    #[test]
    fn test_parse_range() {
        let (b, e) = ScriptureReference::parse_range("MRK 1:2-1:5").unwrap();
        assert_eq!(b, ScriptureReference::new(41, 1, 2));
        assert_eq!(e, ScriptureReference::new(41, 1, 5));

        let (b, e) = ScriptureReference::parse_range("MRK 2:3-4").unwrap();
        assert_eq!(b, ScriptureReference::new(41, 2, 3));
        assert_eq!(e, ScriptureReference::new(41, 2, 4));

        let (b, e) = ScriptureReference::parse_range("MRK 2:3").unwrap();
        assert_eq!(b, e);
    }
}
