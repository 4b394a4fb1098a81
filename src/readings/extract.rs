//! Structured extraction over a parsed HTML document.
//!
//! These primitives know nothing about any particular readings site. They
//! answer questions like "which paragraphs follow the first heading whose text
//! satisfies P, up to the next heading of the same level?".

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("static selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static SECTION_NODES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("static selector"));

/// Heading level of an `h1`–`h6` element.
fn heading_level(el: &ElementRef<'_>) -> Option<u8> {
    let level: u8 = el.value().name().strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Collapse whitespace runs to single spaces.
fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element. `<br>` becomes a line break; each line is
/// whitespace-normalized and blank lines are dropped.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(normalize_line)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of every heading, in document order.
pub fn heading_texts(doc: &Html) -> Vec<String> {
    doc.select(&HEADING).map(element_text).collect()
}

/// Text of the first element matching `selector`, if it has any.
pub fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// First non-empty paragraph whose text satisfies `predicate`.
pub fn first_paragraph_matching<P>(doc: &Html, predicate: P) -> Option<String>
where
    P: Fn(&str) -> bool,
{
    doc.select(&PARAGRAPH)
        .map(element_text)
        .find(|t| !t.is_empty() && predicate(t))
}

/// Paragraphs following the first heading whose text satisfies `predicate`,
/// stopping at the next heading of the same or a higher level. Lower-level
/// subheadings inside the section are skipped.
///
/// Returns `None` when no heading matches. A matching heading with no
/// paragraphs yields `Some(vec![])`.
pub fn section_after_heading<P>(doc: &Html, predicate: P) -> Option<Vec<String>>
where
    P: Fn(&str) -> bool,
{
    let mut nodes = doc.select(&SECTION_NODES);

    let heading = nodes
        .by_ref()
        .find(|el| heading_level(el).is_some() && predicate(&element_text(*el)))?;
    let level = heading_level(&heading)?;

    let mut paragraphs = Vec::new();
    for el in nodes {
        match heading_level(&el) {
            Some(next) if next <= level => break,
            Some(_) => continue,
            None => {}
        }
        let text = element_text(el);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }
    Some(paragraphs)
}

/// Case-insensitive "heading contains label as whole words" predicate.
///
/// `reading i` matches "Reading I" but not "Reading II".
pub fn contains_label(label: &str) -> impl Fn(&str) -> bool + '_ {
    move |text: &str| {
        let text = text.to_lowercase();
        let label = label.to_lowercase();
        text.match_indices(label.as_str()).any(|(start, found)| {
            let before = text[..start].chars().next_back();
            let after = text[start + found.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    }
}
