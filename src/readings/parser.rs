//! Turns a raw readings page into a `ReadingSet`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::extract::{
    contains_label, first_paragraph_matching, first_text, heading_texts, section_after_heading,
};
use super::model::ReadingSet;
use crate::error::ParseError;

pub const DEFAULT_FEAST_NAME: &str = "Daily Mass Readings";
pub const DEFAULT_LITURGICAL_COLOR: &str = "Not specified";
pub const FIRST_READING_PLACEHOLDER: &str = "First reading not available.";
pub const PSALM_PLACEHOLDER: &str = "Responsorial psalm not available.";

static FEAST_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)memorial|feast|solemnity|weekday|saint|lord").expect("static regex")
});
static COLOR_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*?colou?r\s*[:\-–]?\s*").expect("static regex"));
static TOP_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("static selector"));

/// Separator between paragraphs of a section.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Stateless parser for readings pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingsParser;

impl ReadingsParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw` into a reading set for `date` (ISO `YYYY-MM-DD`).
    ///
    /// Fails only when the gospel section is absent or empty.
    pub fn parse(&self, raw: &str, date: &str, source_url: &str) -> Result<ReadingSet, ParseError> {
        let doc = Html::parse_document(raw);
        debug!(date, headings = heading_texts(&doc).len(), "Parsing readings page");

        let gospel = section(&doc, &["gospel"]);
        if gospel.is_empty() {
            warn!(date, "Readings page has no gospel section");
            return Err(ParseError::MissingGospel {
                date: date.to_string(),
            });
        }

        let first_reading = or_placeholder(
            section(&doc, &["reading i", "first reading"]),
            FIRST_READING_PLACEHOLDER,
        );
        let psalm = or_placeholder(section(&doc, &["responsorial psalm"]), PSALM_PLACEHOLDER);

        Ok(ReadingSet {
            date: date.to_string(),
            source_url: source_url.to_string(),
            feast_name: feast_name(&doc),
            liturgical_color: liturgical_color(&doc),
            first_reading,
            psalm,
            gospel,
        })
    }
}

/// Joined section text for the first label that yields any paragraphs.
fn section(doc: &Html, labels: &[&str]) -> String {
    labels
        .iter()
        .filter_map(|label| section_after_heading(doc, contains_label(label)))
        .find(|paragraphs| !paragraphs.is_empty())
        .map(|paragraphs| paragraphs.join(PARAGRAPH_SEPARATOR))
        .unwrap_or_default()
}

fn or_placeholder(text: String, placeholder: &str) -> String {
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text
    }
}

fn feast_name(doc: &Html) -> String {
    first_paragraph_matching(doc, |t| FEAST_KEYWORDS.is_match(t))
        .or_else(|| first_text(doc, &TOP_HEADING))
        .unwrap_or_else(|| DEFAULT_FEAST_NAME.to_string())
}

fn liturgical_color(doc: &Html) -> String {
    first_paragraph_matching(doc, |t| t.to_lowercase().contains("color"))
        .map(|p| COLOR_LABEL.replace(&p, "").trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_LITURGICAL_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.org/101526.cfm";

    fn parse(raw: &str) -> Result<ReadingSet, ParseError> {
        ReadingsParser::new().parse(raw, "2026-10-15", URL)
    }

    #[test]
    fn extracts_three_sections() {
        let raw = "<h3>Reading I</h3><p>One paragraph.</p>\
                   <h3>Responsorial Psalm</h3><p>Ps. text.</p>\
                   <h3>Gospel</h3><p>Gospel text.</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.first_reading, "One paragraph.");
        assert_eq!(set.psalm, "Ps. text.");
        assert_eq!(set.gospel, "Gospel text.");
        assert_eq!(set.date, "2026-10-15");
        assert_eq!(set.source_url, URL);
    }

    #[test]
    fn sections_in_any_order_keep_paragraph_order() {
        let raw = "<h3>Gospel</h3><p>G1</p><p>G2</p>\
                   <h3>Responsorial Psalm</h3><p>P1</p>\
                   <h3>Reading I</h3><p>R1</p><p>R2</p><p>R3</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.gospel, "G1\n\nG2");
        assert_eq!(set.psalm, "P1");
        assert_eq!(set.first_reading, "R1\n\nR2\n\nR3");
    }

    #[test]
    fn first_reading_falls_back_to_first_reading_label() {
        let raw = "<h2>First Reading</h2><p>Fallback text.</p><h2>Gospel</h2><p>G</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.first_reading, "Fallback text.");
    }

    #[test]
    fn reading_two_is_not_taken_for_reading_one() {
        let raw = "<h3>First Reading</h3><p>Acts text.</p>\
                   <h3>Reading II</h3><p>Letter text.</p>\
                   <h3>Gospel</h3><p>G</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.first_reading, "Acts text.");
    }

    #[test]
    fn gospel_excludes_footer_paragraphs() {
        let raw = "<main><h3>Gospel</h3><p>Gospel text.</p></main>\
                   <footer><h2>Stay connected</h2><p>Subscribe to our newsletter</p></footer>";
        assert_eq!(parse(raw).unwrap().gospel, "Gospel text.");
    }

    #[test]
    fn missing_gospel_is_parse_error() {
        let raw = "<h3>Reading I</h3><p>One.</p><h3>Responsorial Psalm</h3><p>Ps.</p>";
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ParseError::MissingGospel { ref date } if date == "2026-10-15"));
    }

    #[test]
    fn empty_gospel_is_parse_error() {
        let raw = "<h3>Reading I</h3><p>One.</p><h3>Gospel</h3><p>  </p><h3>After</h3><p>x</p>";
        assert!(parse(raw).is_err());
    }

    #[test]
    fn absent_optional_sections_get_placeholders() {
        let set = parse("<h3>Gospel</h3><p>Only the gospel.</p>").unwrap();
        assert_eq!(set.first_reading, FIRST_READING_PLACEHOLDER);
        assert_eq!(set.psalm, PSALM_PLACEHOLDER);
        assert_eq!(set.feast_name, DEFAULT_FEAST_NAME);
        assert_eq!(set.liturgical_color, DEFAULT_LITURGICAL_COLOR);
    }

    #[test]
    fn feast_from_keyword_paragraph() {
        let raw = "<h1>Readings</h1><p>Memorial of Saint Teresa of Jesus</p>\
                   <p>Liturgical Color: White</p><h3>Gospel</h3><p>G</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.feast_name, "Memorial of Saint Teresa of Jesus");
        assert_eq!(set.liturgical_color, "White");
    }

    #[test]
    fn feast_falls_back_to_top_heading() {
        let raw = "<h1>Thursday of the Twenty-eighth Week</h1><h3>Gospel</h3><p>G</p>";
        let set = parse(raw).unwrap();
        assert_eq!(set.feast_name, "Thursday of the Twenty-eighth Week");
    }

    #[test]
    fn color_label_variants() {
        let raw = "<p>color - Green</p><h3>Gospel</h3><p>G</p>";
        assert_eq!(parse(raw).unwrap().liturgical_color, "Green");
    }

    #[test]
    fn parsing_is_deterministic() {
        let raw = "<h1>Day</h1><p>Feast of Saint Luke</p><p>Color: Red</p>\
                   <h3>Reading I</h3><p>a<br>b</p><h3>Gospel</h3><p>g</p>";
        let first = parse(raw).unwrap();
        let second = parse(raw).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.first_reading, "a\nb");
    }
}
