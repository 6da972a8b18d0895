//! Chapter and verse number grammar shared by export and import.
//!
//! Parsing is total: every input, however malformed, produces a best-effort
//! value together with an `invalid` flag. Callers decide whether to warn.
//!
//! Verse grammar, per side of an optional bridge separator:
//!
//! ```text
//! side   := noise* digit+ letter?
//! noise  := any non-digit        (present => invalid)
//! digit  := any decimal digit of any script
//! letter := one alphabetic char  (sub-verse segment, a => 1)
//! ```

use serde::{Deserialize, Serialize};

/// Zero code points of the decimal digit systems we recognise.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10,
];

/// Numeric value of a decimal digit in any supported script.
pub fn digit_value(c: char) -> Option<u32> {
    let cp = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&cp))
        .map(|zero| cp - zero)
}

/// Renders a number using the digit system whose zero is `zero`.
pub fn format_number(value: u32, zero: char) -> String {
    let ascii = value.to_string();
    if zero == '0' || digit_value(zero) != Some(0) {
        return ascii;
    }
    ascii
        .bytes()
        .map(|b| char::from_u32(zero as u32 + u32::from(b - b'0')).unwrap_or(char::from(b)))
        .collect()
}

/// A verse (or verse bridge) as written in source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseNumberToken {
    pub raw: String,
    pub begin: u16,
    pub end: u16,
    pub begin_segment: u8,
    pub end_segment: u8,
    pub invalid: bool,
}

impl VerseNumberToken {
    pub fn is_bridge(&self) -> bool {
        self.begin != self.end
    }
}

/// A chapter number as written in source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterNumber {
    pub raw: String,
    pub value: u16,
    pub invalid: bool,
}

impl ChapterNumber {
    pub fn valid(value: u16) -> Self {
        Self {
            raw: value.to_string(),
            value,
            invalid: value == 0,
        }
    }
}

/// Grammar settings that vary per project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberGrammar {
    pub bridge: String,
    /// Soft upper bound on a verse number.
    pub max_verse: u16,
    pub digit_zero: char,
}

impl Default for NumberGrammar {
    fn default() -> Self {
        Self {
            bridge: "-".to_string(),
            max_verse: 176,
            digit_zero: '0',
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Side {
    value: u16,
    segment: u8,
    has_digits: bool,
    invalid: bool,
}

fn parse_side(text: &str) -> Side {
    let mut side = Side::default();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if digit_value(c).is_some() {
            break;
        }
        side.invalid = true;
        chars.next();
    }

    let mut value: u32 = 0;
    while let Some(d) = chars.peek().and_then(|&c| digit_value(c)) {
        side.has_digits = true;
        value = (value * 10 + d).min(u32::from(u16::MAX));
        chars.next();
    }
    side.value = value as u16;

    let rest: Vec<char> = chars.collect();
    match rest.as_slice() {
        [] => {}
        [letter] if letter.is_alphabetic() => {
            side.segment = if letter.is_ascii_alphabetic() {
                letter.to_ascii_lowercase() as u8 - b'a' + 1
            } else {
                1
            };
        }
        _ => side.invalid = true,
    }
    if !side.has_digits {
        side.invalid = true;
    }
    side
}

impl NumberGrammar {
    /// Parses a verse number or bridge. Never fails; `begin <= end` always holds.
    pub fn parse_verse(&self, text: &str) -> VerseNumberToken {
        let trimmed = text.trim();
        let (first, second) = match (!self.bridge.is_empty())
            .then(|| trimmed.split_once(self.bridge.as_str()))
            .flatten()
        {
            Some((a, b)) => (a.trim(), Some(b.trim())),
            None => (trimmed, None),
        };

        let begin = parse_side(first);
        let mut invalid = begin.invalid;
        let end = match second {
            Some(s) => {
                let end = parse_side(s);
                invalid |= end.invalid;
                if end.has_digits {
                    end
                } else {
                    begin
                }
            }
            None => begin,
        };

        let mut token = VerseNumberToken {
            raw: text.to_string(),
            begin: begin.value,
            end: end.value,
            begin_segment: begin.segment,
            end_segment: end.segment,
            invalid,
        };

        let out_of_order = (token.begin, token.begin_segment) > (token.end, token.end_segment);
        if token.begin > self.max_verse || out_of_order {
            token.invalid = true;
            token.end = token.begin;
            token.end_segment = token.begin_segment;
        }
        if token.begin == 0 {
            token.invalid = true;
        }
        token
    }

    /// Parses a chapter number. Trailing garbage makes the result invalid but
    /// the digits found are still reported.
    pub fn parse_chapter(&self, text: &str) -> ChapterNumber {
        let trimmed = text.trim();
        let mut value: u32 = 0;
        let mut digits = 0usize;
        for c in trimmed.chars() {
            match digit_value(c) {
                Some(d) => {
                    value = (value * 10 + d).min(u32::from(u16::MAX));
                    digits += c.len_utf8();
                }
                None => break,
            }
        }

        if digits > 0 && digits == trimmed.len() && value > 0 {
            return ChapterNumber {
                raw: text.to_string(),
                value: value as u16,
                invalid: false,
            };
        }

        let fallback = self.parse_verse(trimmed);
        ChapterNumber {
            raw: text.to_string(),
            value: fallback.begin,
            invalid: true,
        }
    }

    /// Renders a verse or bridge in the configured digit system.
    pub fn format_verse(&self, begin: u16, begin_segment: u8, end: u16, end_segment: u8) -> String {
        let mut out = self.format_side(begin, begin_segment);
        if (begin, begin_segment) != (end, end_segment) {
            out.push_str(&self.bridge);
            out.push_str(&self.format_side(end, end_segment));
        }
        out
    }

    pub fn format_chapter(&self, chapter: u16) -> String {
        format_number(u32::from(chapter), self.digit_zero)
    }

    fn format_side(&self, value: u16, segment: u8) -> String {
        let mut out = format_number(u32::from(value), self.digit_zero);
        if (1..=26).contains(&segment) {
            out.push(char::from(b'a' + segment - 1));
        }
        out
    }
}
