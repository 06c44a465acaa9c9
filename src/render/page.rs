//! In-place editing of named regions in an HTML page.

use std::ops::Range;

/// Region holding a single card for the most recent episode.
pub const LATEST_EPISODE_ID: &str = "latest-episode";
/// Region(s) holding cards for every episode.
pub const EPISODE_LIST_ID: &str = "episode-list";

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is text, never markup.
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

/// An HTML page with named regions that can have their content replaced.
///
/// Regions are elements carrying an `id` attribute (`latest-episode`,
/// `episode-list`). Edits only touch the content between a region's start and
/// end tag (and, for class additions, the start tag itself); every other byte
/// of the page is preserved.
///
/// Uses simple tag scanning (no HTML tree), so the page is never reformatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    html: String,
}

impl Page {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Number of regions with the given id (nested duplicates not counted).
    pub fn region_count(&self, id: &str) -> usize {
        find_regions(&self.html, id).len()
    }

    /// Current content of every region with the given id, in document order.
    pub fn region_contents(&self, id: &str) -> Vec<&str> {
        find_regions(&self.html, id)
            .into_iter()
            .map(|region| &self.html[region.content])
            .collect()
    }

    /// Replaces the content of the first `latest-episode` region and adds
    /// `classes` to its `class` attribute. Returns `false` if the page has
    /// no such region.
    pub fn fill_latest(&mut self, content: &str, classes: &[&str]) -> bool {
        let Some(region) = find_regions(&self.html, LATEST_EPISODE_ID).into_iter().next() else {
            return false;
        };

        // Content comes after the start tag, so start tag offsets stay valid
        self.html.replace_range(region.content.clone(), content);
        self.add_classes(&region, classes);
        true
    }

    /// Replaces the content of every `episode-list` region. Returns how many
    /// regions were filled.
    pub fn fill_lists(&mut self, content: &str) -> usize {
        let regions = find_regions(&self.html, EPISODE_LIST_ID);
        // Back to front so earlier offsets remain valid
        for region in regions.iter().rev() {
            self.html.replace_range(region.content.clone(), content);
        }
        regions.len()
    }

    /// Replaces the content of the first `episode-list` region only.
    pub fn fill_first_list(&mut self, content: &str) -> bool {
        match find_regions(&self.html, EPISODE_LIST_ID).into_iter().next() {
            Some(region) => {
                self.html.replace_range(region.content, content);
                true
            }
            None => false,
        }
    }

    fn add_classes(&mut self, region: &Region, classes: &[&str]) {
        let existing = region
            .class
            .as_ref()
            .and_then(|attr| attr.value.clone())
            .map(|range| &self.html[range])
            .unwrap_or("");
        let mut tokens: Vec<&str> = existing.split_ascii_whitespace().collect();
        let before = tokens.len();
        for &class in classes {
            if !tokens.contains(&class) {
                tokens.push(class);
            }
        }
        if tokens.len() == before {
            return;
        }
        // Existing value may have been single-quoted
        let attribute = format!("class=\"{}\"", tokens.join(" ").replace('"', "&quot;"));

        match &region.class {
            Some(attr) => self.html.replace_range(attr.range.clone(), &attribute),
            None => self
                .html
                .insert_str(region.name_end, &format!(" {attribute}")),
        }
    }
}

/// A matched element: where its start tag ends and where its content lies.
#[derive(Debug, Clone)]
struct Region {
    /// Byte offset just past the tag name in the start tag.
    name_end: usize,
    class: Option<Attribute>,
    content: Range<usize>,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    /// The whole `name=value` text.
    range: Range<usize>,
    /// The value without quotes, if the attribute has one.
    value: Option<Range<usize>>,
}

#[derive(Debug)]
enum Token {
    Start {
        name: String,
        name_end: usize,
        attributes: Vec<Attribute>,
        self_closing: bool,
        end: usize,
    },
    End {
        name: String,
        start: usize,
        end: usize,
    },
    /// Comment, doctype or processing instruction.
    Other { end: usize },
}

impl Token {
    fn end(&self) -> usize {
        match self {
            Token::Start { end, .. } | Token::End { end, .. } | Token::Other { end } => *end,
        }
    }
}

/// Finds every element whose `id` equals `id`, skipping matches nested
/// inside an earlier match and elements that cannot have content.
fn find_regions(html: &str, id: &str) -> Vec<Region> {
    let lower = html.to_ascii_lowercase();
    let mut regions = Vec::new();
    let mut pos = 0;

    while let Some(token) = next_token(html, pos) {
        pos = token.end();
        let Token::Start {
            name,
            name_end,
            attributes,
            self_closing,
            end,
        } = token
        else {
            continue;
        };

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            pos = skip_raw_text(&lower, end, &name);
            continue;
        }

        let is_match = attributes
            .iter()
            .any(|attr| attr.name == "id" && attr.value.clone().map(|v| &html[v]) == Some(id));
        if !is_match || self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }

        let Some((close_start, close_end)) = find_closing_tag(html, &lower, end, &name) else {
            tracing::debug!(id = %id, element = %name, "Region has no closing tag, skipping");
            continue;
        };

        let class = attributes.into_iter().find(|attr| attr.name == "class");
        regions.push(Region {
            name_end,
            class,
            content: end..close_start,
        });
        pos = close_end;
    }

    regions
}

/// Returns `(start, end)` of the end tag closing an element opened just
/// before `from`, counting nested elements of the same name.
fn find_closing_tag(html: &str, lower: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut pos = from;

    while let Some(token) = next_token(html, pos) {
        pos = token.end();
        match token {
            Token::Start {
                name: inner,
                self_closing,
                end,
                ..
            } => {
                if RAW_TEXT_ELEMENTS.contains(&inner.as_str()) {
                    pos = skip_raw_text(lower, end, &inner);
                } else if inner == name && !self_closing {
                    depth += 1;
                }
            }
            Token::End {
                name: inner,
                start,
                end,
            } if inner == name => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, end));
                }
            }
            _ => {}
        }
    }
    None
}

/// Skips to just after `</name ...>`, or to the end of input.
fn skip_raw_text(lower: &str, from: usize, name: &str) -> usize {
    let closing = format!("</{name}");
    match lower[from..].find(&closing) {
        Some(offset) => {
            let close_start = from + offset;
            lower[close_start..]
                .find('>')
                .map_or(lower.len(), |gt| close_start + gt + 1)
        }
        None => lower.len(),
    }
}

/// Lexes the next tag-like token at or after `from`.
fn next_token(html: &str, from: usize) -> Option<Token> {
    let bytes = html.as_bytes();
    let mut search = from;

    loop {
        let lt = search + html.get(search..)?.find('<')?;
        let rest = &html[lt..];

        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map_or(html.len(), |i| lt + 4 + i + 3);
            return Some(Token::Other { end });
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(html.len(), |i| lt + i + 1);
            return Some(Token::Other { end });
        }
        if rest.starts_with("</") && bytes.get(lt + 2).is_some_and(u8::is_ascii_alphabetic) {
            let name_start = lt + 2;
            let name_end = scan_name(bytes, name_start);
            let end = rest.find('>').map_or(html.len(), |i| lt + i + 1);
            return Some(Token::End {
                name: html[name_start..name_end].to_ascii_lowercase(),
                start: lt,
                end,
            });
        }
        if bytes.get(lt + 1).is_some_and(u8::is_ascii_alphabetic) {
            if let Some(token) = lex_start_tag(html, lt) {
                return Some(token);
            }
        }

        // A stray '<' in text
        search = lt + 1;
    }
}

fn scan_name(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/'
    {
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Lexes a start tag beginning at `start` (`html[start] == '<'`).
/// Returns `None` if the tag is never terminated.
fn lex_start_tag(html: &str, start: usize) -> Option<Token> {
    let bytes = html.as_bytes();
    let name_end = scan_name(bytes, start + 1);
    let name = html[start + 1..name_end].to_ascii_lowercase();
    let mut attributes = Vec::new();
    let mut i = name_end;

    loop {
        i = skip_whitespace(bytes, i);
        match bytes.get(i)? {
            b'>' => {
                let self_closing = bytes[i - 1] == b'/';
                return Some(Token::Start {
                    name,
                    name_end,
                    attributes,
                    self_closing,
                    end: i + 1,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'>' | b'/' | b'=')
        {
            i += 1;
        }
        if i == attr_start {
            // Lone '=' where a name should be
            i += 1;
            continue;
        }
        let attr_name = html[attr_start..i].to_ascii_lowercase();

        let after_name = skip_whitespace(bytes, i);
        if bytes.get(after_name) != Some(&b'=') {
            attributes.push(Attribute {
                name: attr_name,
                range: attr_start..i,
                value: None,
            });
            continue;
        }

        i = skip_whitespace(bytes, after_name + 1);
        let (value, value_end) = match *bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let value_start = i + 1;
                let close = value_start + html[value_start..].find(quote as char)?;
                (value_start..close, close + 1)
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                (value_start..i, i)
            }
        };
        attributes.push(Attribute {
            name: attr_name,
            range: attr_start..value_end,
            value: Some(value),
        });
        i = value_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
  <title>My Show</title>
  <script>document.write('<div id="episode-list">fake</div>');</script>
</head>
<body>
  <!-- <section id="latest-episode">commented</section> -->
  <section id="latest-episode" class="cards"><p>Loading…</p></section>
  <div class='list' id='episode-list'><div class="placeholder">Loading</div></div>
  <footer><div id=episode-list>second</div></footer>
</body>
</html>"#;

    #[test]
    fn test_finds_regions_skipping_comments_and_scripts() {
        let page = Page::new(PAGE);
        assert_eq!(page.region_count(LATEST_EPISODE_ID), 1);
        assert_eq!(
            page.region_contents(EPISODE_LIST_ID),
            vec![r#"<div class="placeholder">Loading</div>"#, "second"]
        );
        assert_eq!(page.region_contents(LATEST_EPISODE_ID), vec!["<p>Loading…</p>"]);
    }

    #[test]
    fn test_fill_lists_replaces_every_region() {
        let mut page = Page::new(PAGE);
        assert_eq!(page.fill_lists("<b>cards</b>"), 2);
        assert_eq!(
            page.region_contents(EPISODE_LIST_ID),
            vec!["<b>cards</b>", "<b>cards</b>"]
        );
        // Everything outside the regions is untouched
        assert!(page.as_str().contains("<div class='list' id='episode-list'><b>cards</b></div>"));
        assert!(page.as_str().contains(r#"document.write('<div id="episode-list">fake</div>');"#));
    }

    #[test]
    fn test_fill_first_list_only() {
        let mut page = Page::new(PAGE);
        assert!(page.fill_first_list("oops"));
        assert_eq!(page.region_contents(EPISODE_LIST_ID), vec!["oops", "second"]);
    }

    #[test]
    fn test_fill_latest_merges_classes() {
        let mut page = Page::new(PAGE);
        assert!(page.fill_latest("<article/>", &["cards", "one"]));
        assert!(page
            .as_str()
            .contains(r#"<section id="latest-episode" class="cards one"><article/></section>"#));
    }

    #[test]
    fn test_fill_latest_adds_missing_class_attribute() {
        let mut page = Page::new(r#"<div id="latest-episode"></div>"#);
        assert!(page.fill_latest("x", &["cards", "one"]));
        assert_eq!(page.as_str(), r#"<div class="cards one" id="latest-episode">x</div>"#);
    }

    #[test]
    fn test_fill_latest_is_idempotent_for_classes() {
        let mut page = Page::new(r#"<div id="latest-episode"></div>"#);
        page.fill_latest("a", &["cards", "one"]);
        page.fill_latest("b", &["cards", "one"]);
        assert_eq!(page.as_str(), r#"<div class="cards one" id="latest-episode">b</div>"#);
    }

    #[test]
    fn test_unquoted_class_is_requoted() {
        let mut page = Page::new("<DIV CLASS=grid ID=latest-episode>old</DIV>");
        page.fill_latest("new", &["cards", "one"]);
        assert_eq!(page.as_str(), r#"<DIV class="grid cards one" ID=latest-episode>new</DIV>"#);
    }

    #[test]
    fn test_nested_same_name_elements() {
        let html = r#"<div id="episode-list"><div><div>a</div></div><div>b</div></div><p>after</p>"#;
        let mut page = Page::new(html);
        assert_eq!(
            page.region_contents(EPISODE_LIST_ID),
            vec!["<div><div>a</div></div><div>b</div>"]
        );
        page.fill_lists("new");
        assert_eq!(page.as_str(), r#"<div id="episode-list">new</div><p>after</p>"#);
    }

    #[test]
    fn test_page_without_regions_is_untouched() {
        let html = "<html><body><p>No episodes here</p></body></html>";
        let mut page = Page::new(html);
        assert!(!page.fill_latest("x", &["cards"]));
        assert_eq!(page.fill_lists("x"), 0);
        assert!(!page.fill_first_list("x"));
        assert_eq!(page.as_str(), html);
    }

    #[test]
    fn test_self_closing_and_unclosed_regions_skipped() {
        let page = Page::new(r#"<div id="episode-list"/><section id="episode-list">open"#);
        assert_eq!(page.region_count(EPISODE_LIST_ID), 0);
    }

    #[test]
    fn test_id_must_match_exactly() {
        let page = Page::new(r#"<div id="episode-list-old">x</div><div data-id="episode-list">y</div>"#);
        assert_eq!(page.region_count(EPISODE_LIST_ID), 0);
    }

    #[test]
    fn test_stray_angle_brackets_in_text() {
        let page = Page::new(r#"<p>1 < 2 and 3 > 2</p><ul id="episode-list"><li>x</li></ul>"#);
        assert_eq!(page.region_contents(EPISODE_LIST_ID), vec!["<li>x</li>"]);
    }

    #[test]
    fn test_multibyte_text_around_regions() {
        let mut page = Page::new("<p>ünïcödé 日本</p><div id=\"episode-list\">—</div><p>終わり</p>");
        page.fill_lists("ok");
        assert_eq!(
            page.as_str(),
            "<p>ünïcödé 日本</p><div id=\"episode-list\">ok</div><p>終わり</p>"
        );
    }

    #[test]
    fn test_into_html_returns_edited_document() {
        let mut page = Page::new("<body><div id=\"latest-episode\"></div></body>");
        assert!(page.fill_latest("<article></article>", &["cards"]));
        assert_eq!(
            page.into_html(),
            "<body><div class=\"cards\" id=\"latest-episode\"><article></article></div></body>"
        );
    }
}
