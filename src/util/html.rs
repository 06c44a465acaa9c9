//! HTML text extraction and escaping.

use std::borrow::Cow;

use scraper::{ElementRef, Html, Node};

/// Elements whose whole subtree is dropped before text extraction.
const STRIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Markup nested deeper than this is not descended into.
/// Keeps the recursive walk bounded for hostile feed content.
const MAX_MARKUP_DEPTH: usize = 256;

/// Extracts the visible text of an HTML fragment.
///
/// The fragment is parsed into an inert html5ever tree (nothing is executed or
/// fetched), `script`/`style`/`noscript` subtrees are skipped, and the remaining
/// text nodes are concatenated in document order, the same way DOM `textContent`
/// joins them: no separators are inserted and nothing is trimmed.
///
/// # Examples
///
/// ```
/// use podcast_cards::util::strip_tags;
///
/// assert_eq!(strip_tags("<script>alert(1)</script><p>Hi</p>"), "Hi");
/// assert_eq!(strip_tags("Plain &amp; simple"), "Plain & simple");
/// assert_eq!(strip_tags(""), "");
/// ```
pub fn strip_tags(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), 0, &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, depth: usize, out: &mut String) {
    if depth > MAX_MARKUP_DEPTH {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if STRIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, depth + 1, out);
                }
            }
            _ => {}
        }
    }
}

/// Escapes `&`, `<`, `>`, `'` and `"` so text is safe inside element content
/// and quoted attribute values.
///
/// Returns `Cow::Borrowed` when nothing needs escaping.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}
