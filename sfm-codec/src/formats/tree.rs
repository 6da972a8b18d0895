//! Tree view of a document
//!
//! One node per line, nesting drawn with box connectors:
//!
//! ```text
//! ⧉ Scripture (1 books, 1 annotations)
//! └─ ▣ MRK (41)
//!   ├─ § MRK 1:1-1:2 John prepares the…
//!   │ ├─ ⊤ Section Head: John prepares…
//!   │ └─ ¶ Paragraph: 11The beginning…
//!   │   └─ ⇄ en: 1The beginning of t…
//!   └─ " MRK 1:2 check the quotation
//! ```
//!
//! Labels are truncated to 30 characters. The view is for inspection only and
//! cannot be parsed back.

use crate::error::FormatError;
use crate::format::Format;
use crate::model::{Book, NoteKind, Paragraph, Scripture, ScriptureSource, Section};

const LABEL_WIDTH: usize = 30;

fn get_icon(node: &str) -> &'static str {
    match node {
        "Scripture" => "⧉",
        "Book" => "▣",
        "Title" => "ℌ",
        "Section" => "§",
        "IntroSection" => "ⓘ",
        "Heading" => "⊤",
        "Paragraph" => "¶",
        "BackTranslation" => "⇄",
        "Footnote" => "³",
        "CrossReference" => "†",
        "Picture" => "▨",
        "Annotation" => "\"",
        _ => "○",
    }
}

struct Node {
    icon: &'static str,
    label: String,
    children: Vec<Node>,
}

impl Node {
    fn new(kind: &str, label: impl Into<String>) -> Self {
        Self {
            icon: get_icon(kind),
            label: truncate(&label.into()),
            children: Vec::new(),
        }
    }

    fn render(&self, prefix: &str, is_last: bool, out: &mut String) {
        let connector = if is_last { "└─" } else { "├─" };
        out.push_str(&format!("{prefix}{connector} {} {}\n", self.icon, self.label));
        let child_prefix = format!("{prefix}{}", if is_last { "  " } else { "│ " });
        render_children(&self.children, &child_prefix, out);
    }
}

fn render_children(children: &[Node], prefix: &str, out: &mut String) {
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        child.render(prefix, i + 1 == count, out);
    }
}

fn truncate(label: &str) -> String {
    let label = label.replace('\n', " ");
    if label.chars().count() <= LABEL_WIDTH {
        return label;
    }
    let mut short: String = label.chars().take(LABEL_WIDTH - 1).collect();
    short.push('…');
    short
}

fn paragraph_node(kind: &str, paragraph: &Paragraph) -> Node {
    let mut node = Node::new(kind, format!("{}: {}", paragraph.style, paragraph.text()));
    for (ws, translation) in paragraph.back_translations.iter() {
        node.children.push(Node::new(
            "BackTranslation",
            format!("{ws}: {}", translation.text()),
        ));
    }
    node
}

fn section_node(section: &Section) -> Node {
    let heading: Vec<String> = section.heading.iter().map(Paragraph::text).collect();
    let range = if section.start_ref == section.end_ref {
        section.start_ref.to_string()
    } else {
        format!("{}-{}", section.start_ref, section.end_ref.chapter_verse())
    };
    let kind = if section.intro { "IntroSection" } else { "Section" };
    let mut node = Node::new(kind, format!("{range} {}", heading.join(" ")).trim_end());
    node.children
        .extend(section.heading.iter().map(|p| paragraph_node("Heading", p)));
    node.children
        .extend(section.content.iter().map(|p| paragraph_node("Paragraph", p)));
    node
}

fn book_node(doc: &Scripture, book: &Book) -> Node {
    let mut node = Node::new("Book", format!("{} ({})", book.code, book.canonical_number));
    node.children
        .extend(book.title.iter().map(|p| paragraph_node("Title", p)));
    node.children.extend(book.sections.iter().map(section_node));
    for note in &book.footnotes {
        let kind = match note.kind {
            NoteKind::General => "Footnote",
            NoteKind::CrossReference => "CrossReference",
        };
        node.children.push(Node::new(
            kind,
            format!("{} {} {}", note.id, note.caller, note.paragraph.text()),
        ));
    }
    for picture in &book.pictures {
        let label = if picture.caption.is_empty() {
            picture.file_name.clone()
        } else {
            picture.caption.clone()
        };
        node.children.push(Node::new("Picture", label));
    }
    for annotation in doc.annotations_for(book.canonical_number) {
        node.children.push(Node::new(
            "Annotation",
            format!("{} {}", annotation.begin, annotation.discussion),
        ));
    }
    node
}

pub fn to_tree_str(doc: &Scripture) -> String {
    let mut output = format!(
        "{} Scripture ({} books, {} annotations)\n",
        get_icon("Scripture"),
        doc.books.len(),
        doc.annotations.len()
    );
    let books: Vec<Node> = doc.books.iter().map(|b| book_node(doc, b)).collect();
    render_children(&books, "", &mut output);
    output
}

/// Format implementation for the tree view
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeFormat;

impl Format for TreeFormat {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Visual tree of books, sections and paragraphs"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Scripture) -> Result<String, FormatError> {
        Ok(to_tree_str(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, ScriptureReference, StyledRun};

    fn sample() -> Scripture {
        let mut book = Book::new("mrk");
        let mut section = Section::new(false, ScriptureReference::new(41, 1, 1));
        section.end_ref = ScriptureReference::new(41, 1, 2);
        section.heading.push(Paragraph::with_runs(
            "Section Head",
            vec![StyledRun::plain("Heading", "und")],
        ));
        section.content.push(
            Paragraph::with_runs("Paragraph", vec![StyledRun::plain("Text", "und")])
                .with_back_translation("en", vec![StyledRun::plain("Gloss", "en")]),
        );
        book.sections.push(section);
        Scripture {
            books: vec![book],
            annotations: vec![Annotation::new(ScriptureReference::new(41, 1, 2), "check")],
        }
    }

    #[test]
    fn test_tree_layout() {
        insta::assert_snapshot!(to_tree_str(&sample()), @r#"
        ⧉ Scripture (1 books, 1 annotations)
        └─ ▣ MRK (41)
          ├─ § MRK 1:1-1:2 Heading
          │ ├─ ⊤ Section Head: Heading
          │ └─ ¶ Paragraph: Text
          │   └─ ⇄ en: Gloss
          └─ " MRK 1:2 check
        "#);
    }

    #[test]
    fn test_truncates_long_labels() {
        let label = truncate(&"x".repeat(40));
        assert_eq!(label.chars().count(), LABEL_WIDTH);
        assert!(label.ends_with('…'));
    }

    #[test]
    fn test_tree_cannot_parse() {
        assert!(TreeFormat.parse("anything").is_err());
    }
}
