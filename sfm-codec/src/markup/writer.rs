//! Line-oriented output buffer for marker streams.

#[derive(Debug, Default)]
pub struct MarkerWriter {
    out: String,
    line_open: bool,
    /// The last thing written was an opening marker or token that needs a
    /// space before any following text.
    needs_space: bool,
}

impl MarkerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_line_open(&self) -> bool {
        self.line_open
    }

    /// Terminates the current line, dropping trailing spaces.
    pub fn end_line(&mut self) {
        if !self.line_open {
            return;
        }
        let kept = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(kept);
        self.out.push('\n');
        self.line_open = false;
        self.needs_space = false;
    }

    /// Starts a new line with a marker.
    pub fn start_line(&mut self, marker: &str) {
        self.end_line();
        self.out.push_str(marker);
        self.line_open = true;
        self.needs_space = true;
    }

    /// A complete `\marker text` line.
    pub fn line(&mut self, marker: &str, text: &str) {
        self.start_line(marker);
        self.push_text(text);
        self.end_line();
    }

    /// Appends text to the current line.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.needs_space {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.line_open = true;
        self.needs_space = false;
    }

    /// Appends a word that must stay separated from what follows (a verse
    /// number, a note caller).
    pub fn push_token(&mut self, token: &str) {
        self.push_text(token);
        self.needs_space = true;
    }

    /// Appends an opening marker inside the current line.
    pub fn push_marker(&mut self, marker: &str) {
        if self.needs_space {
            self.out.push(' ');
        }
        self.out.push_str(marker);
        self.line_open = true;
        self.needs_space = true;
    }

    /// Appends an end marker (`\marker*`) inside the current line.
    pub fn push_end_marker(&mut self, marker: &str) {
        self.out.push_str(marker);
        self.out.push('*');
        self.line_open = true;
        self.needs_space = false;
    }

    pub fn finish(mut self) -> String {
        self.end_line();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_layout() {
        let mut w = MarkerWriter::new();
        w.line("\\id", "MRK");
        w.start_line("\\v");
        w.push_token("1");
        w.push_text("In the ");
        w.push_marker("\\nd");
        w.push_text("Lord");
        w.push_end_marker("\\nd");
        w.push_text(" said ");
        w.start_line("\\v");
        w.push_token("2");
        assert_eq!(
            w.finish(),
            "\\id MRK\n\\v 1 In the \\nd Lord\\nd* said\n\\v 2\n"
        );
    }

    #[test]
    fn test_note_caller_spacing() {
        let mut w = MarkerWriter::new();
        w.start_line("\\p");
        w.push_text("text");
        w.push_marker("\\f");
        w.push_token("+");
        w.push_marker("\\ft");
        w.push_text("note");
        w.push_end_marker("\\f");
        assert_eq!(w.finish(), "\\p text\\f + \\ft note\\f*\n");
    }

    #[test]
    fn test_bare_marker_line() {
        let mut w = MarkerWriter::new();
        w.line("\\p", "");
        w.line("\\s", "Heading");
        assert_eq!(w.finish(), "\\p\n\\s Heading\n");
    }
}
