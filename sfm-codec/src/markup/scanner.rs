//! Splits marker text into `(marker, text)` segments.
//!
//! A marker runs from a backslash to the next whitespace, backslash or `*`
//! (the `*` is kept, it makes an end marker). One whitespace character after
//! an opening marker separates it from its text and is dropped. Text runs up
//! to the next backslash.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Marker including the backslash, e.g. `\v` or `\nd*`.
    pub marker: String,
    /// Text following the marker. Line breaks inside it are folded into
    /// spaces and trailing whitespace up to a line break is removed.
    pub text: String,
    /// 1-based line the marker starts on.
    pub line: usize,
    /// The text ran up to a line break.
    pub ends_line: bool,
}

/// Tokenizes a whole stream. Text before the first marker is discarded.
pub fn scan(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut line = 1;
    let mut rest = source;

    if let Some(start) = rest.find('\\') {
        let skipped = &rest[..start];
        if !skipped.trim().is_empty() {
            tracing::debug!(text = skipped.trim(), "ignoring text before the first marker");
        }
        line += skipped.matches('\n').count();
        rest = &rest[start..];
    } else {
        return segments;
    }

    while let Some(after_slash) = rest.strip_prefix('\\') {
        let marker_len = after_slash
            .char_indices()
            .find(|&(_, c)| c.is_whitespace() || c == '\\' || c == '*')
            .map(|(i, c)| if c == '*' { i + 1 } else { i })
            .unwrap_or(after_slash.len());
        let marker = format!("\\{}", &after_slash[..marker_len]);

        let mut body = &after_slash[marker_len..];
        let mut separator_newline = false;
        if !marker.ends_with('*') {
            if let Some(c) = body.chars().next().filter(|c| c.is_whitespace()) {
                separator_newline = c == '\n' || c == '\r';
                body = &body[c.len_utf8()..];
                if c == '\r' {
                    body = body.strip_prefix('\n').unwrap_or(body);
                }
            }
        }

        let text_len = body.find('\\').unwrap_or(body.len());
        let raw = &body[..text_len];
        let trimmed = raw.trim_end();
        let ends_line =
            raw[trimmed.len()..].contains('\n') || (raw.is_empty() && separator_newline);
        let text = if ends_line { trimmed } else { raw };

        segments.push(Segment {
            marker,
            text: fold_line_breaks(text),
            line,
            ends_line,
        });

        let next = &body[text_len..];
        line += rest[..rest.len() - next.len()].matches('\n').count();
        rest = next;
    }

    segments
}

fn fold_line_breaks(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.split('\n')
        .map(|part| part.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// End markers present in a segment list.
pub fn end_markers(segments: &[Segment]) -> HashSet<String> {
    segments
        .iter()
        .filter(|s| s.marker.ends_with('*'))
        .map(|s| s.marker.clone())
        .collect()
}
