//! HTML to plain text with one line per block element.
use scraper::{ElementRef, Html};

/// Subtrees that never contribute visible text.
const INVISIBLE: &[&str] = &[
    "script", "style", "noscript", "template", "head", "svg", "canvas", "iframe", "object",
];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "thead", "tfoot", "tr", "ul", "caption",
];

#[derive(Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineBuilder {
    fn push_text(&mut self, raw: &str) {
        let mut words = raw.split_whitespace().peekable();
        if words.peek().is_none() {
            if !raw.is_empty() {
                self.pending_space = true;
            }
            return;
        }
        if raw.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for word in words {
            if self.pending_space && !self.current.is_empty() {
                self.current.push(' ');
            }
            self.current.push_str(word);
            self.pending_space = true;
        }
        self.pending_space = raw.ends_with(char::is_whitespace);
    }

    fn separator(&mut self, sep: &str) {
        if !self.current.is_empty() {
            self.current.push_str(sep);
            self.pending_space = false;
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

fn walk<F>(el: ElementRef<'_>, skip: &F, out: &mut LineBuilder)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_text(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if INVISIBLE.contains(&name) || skip(&child_el) {
            continue;
        }
        match name {
            "br" => out.break_line(),
            "td" | "th" => {
                out.separator(" | ");
                walk(child_el, skip, out);
            }
            _ if BLOCKS.contains(&name) => {
                out.break_line();
                walk(child_el, skip, out);
                out.break_line();
            }
            _ => walk(child_el, skip, out),
        }
    }
}

/// Visible text under `root`, omitting any subtree for which `skip` holds.
pub fn element_text_filtered<F>(root: ElementRef<'_>, skip: F) -> String
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let mut out = LineBuilder::default();
    walk(root, &skip, &mut out);
    out.finish()
}

/// Visible text under `root`, one line per block.
pub fn element_text(root: ElementRef<'_>) -> String {
    element_text_filtered(root, |_| false)
}

/// Visible text of a whole document.
///
/// ```
/// let text = lucid_extract::text::html_to_text(
///     "<html><head><title>t</title><style>p{}</style></head>\
///      <body><h1>Headline</h1><p>First <b>bold</b> line.</p><p>Second</p></body></html>",
/// );
/// assert_eq!(text, "Headline\nFirst bold line.\nSecond");
/// ```
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    element_text(doc.root_element())
}

/// Same as [`html_to_text`] for a fragment such as a readability summary.
pub fn fragment_to_text(html: &str) -> String {
    let frag = Html::parse_fragment(html);
    element_text(frag.root_element())
}

/// Single-line text of an element (titles, headings).
pub fn inline_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
