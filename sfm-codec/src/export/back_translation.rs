//! Splitting back translations at chapter/verse numbers and scheduling the
//! pieces between the vernacular verses.

use crate::model::StyledRun;
use crate::styles::{StyleCatalog, StyleFunction};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Chapter,
    Verse,
}

pub fn number_kind(run: &StyledRun, catalog: &StyleCatalog) -> Option<NumberKind> {
    if run.embed.is_some() {
        return None;
    }
    match catalog.function(run.style.as_deref()?) {
        StyleFunction::Chapter => Some(NumberKind::Chapter),
        StyleFunction::Verse => Some(NumberKind::Verse),
        _ => None,
    }
}

/// Consecutive chapter/verse number runs, compared by their trimmed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberGroup(Vec<(NumberKind, String)>);

impl NumberGroup {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, kind: NumberKind, text: &str) {
        self.0.push((kind, text.trim().to_string()));
    }

    /// The group that begins at `start`, or `None` when `start` is not the
    /// first run of a group.
    pub fn at(runs: &[StyledRun], start: usize, catalog: &StyleCatalog) -> Option<Self> {
        number_kind(runs.get(start)?, catalog)?;
        if start > 0 && number_kind(&runs[start - 1], catalog).is_some() {
            return None;
        }
        let mut group = Self::default();
        for run in &runs[start..] {
            match number_kind(run, catalog) {
                Some(kind) => group.push(kind, &run.text),
                None => break,
            }
        }
        Some(group)
    }
}

/// A piece of a back translation: the number runs that open it (possibly
/// none) followed by the text up to the next number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtSegment {
    pub header: NumberGroup,
    /// All runs of the segment, header included.
    pub range: Range<usize>,
    /// Index of the first run after the header.
    pub body: usize,
}

pub fn segment(runs: &[StyledRun], catalog: &StyleCatalog) -> Vec<BtSegment> {
    let mut segments = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        let start = i;
        let mut header = NumberGroup::default();
        while let Some(kind) = runs.get(i).and_then(|r| number_kind(r, catalog)) {
            header.push(kind, &runs[i].text);
            i += 1;
        }
        let body = i;
        while runs.get(i).is_some_and(|r| number_kind(r, catalog).is_none()) {
            i += 1;
        }
        segments.push(BtSegment {
            header,
            range: start..i,
            body,
        });
    }
    segments
}

/// One piece of back translation ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission<'a> {
    pub ws: &'a str,
    /// Number runs to write explicitly; `None` when the numbers equal the
    /// vernacular ones in force and the reader can infer them.
    pub header: Option<&'a [StyledRun]>,
    pub body: &'a [StyledRun],
}

#[derive(Debug)]
struct Stream<'a> {
    ws: &'a str,
    runs: &'a [StyledRun],
    segments: Vec<BtSegment>,
    next: usize,
}

impl<'a> Stream<'a> {
    fn emit(&self, index: usize, in_force: &NumberGroup) -> Emission<'a> {
        let seg = &self.segments[index];
        let explicit = seg.header != *in_force && !seg.header.is_empty();
        Emission {
            ws: self.ws,
            header: explicit.then(|| &self.runs[seg.range.start..seg.body]),
            body: &self.runs[seg.body..seg.range.end],
        }
    }
}

/// Schedules back-translation segments of one paragraph against the
/// vernacular number groups as they are written.
#[derive(Debug)]
pub struct Interleaver<'a> {
    streams: Vec<Stream<'a>>,
    in_force: NumberGroup,
}

impl<'a> Interleaver<'a> {
    pub fn new(translations: Vec<(&'a str, &'a [StyledRun])>, catalog: &StyleCatalog) -> Self {
        let streams = translations
            .into_iter()
            .map(|(ws, runs)| Stream {
                ws,
                runs,
                segments: segment(runs, catalog),
                next: 0,
            })
            .collect();
        Self {
            streams,
            in_force: NumberGroup::default(),
        }
    }

    /// The vernacular is about to write `group`. Returns the segments that
    /// belong before it: everything up to the segment whose numbers match,
    /// or only the unnumbered lead-in when nothing matches.
    pub fn cross(&mut self, group: &NumberGroup) -> Vec<Emission<'a>> {
        let mut out = Vec::new();
        for stream in &mut self.streams {
            let rest = &stream.segments[stream.next..];
            let target = match rest.iter().position(|s| s.header == *group) {
                Some(offset) => stream.next + offset,
                None => stream.next + rest.iter().take_while(|s| s.header.is_empty()).count(),
            };
            for index in stream.next..target {
                out.push(stream.emit(index, &self.in_force));
            }
            stream.next = target;
        }
        self.in_force = group.clone();
        out
    }

    /// Everything not yet written, at the end of the paragraph.
    pub fn finish(&mut self) -> Vec<Emission<'a>> {
        let mut out = Vec::new();
        for stream in &mut self.streams {
            for index in stream.next..stream.segments.len() {
                out.push(stream.emit(index, &self.in_force));
            }
            stream.next = stream.segments.len();
        }
        out
    }
}
