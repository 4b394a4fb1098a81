//! Turns readings plus reflection into the outgoing email.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Zone;
use crate::readings::ReadingSet;
use crate::reflection::Reflection;

const ISO_DATE: &str = "%Y-%m-%d";
const HUMAN_DATE: &str = "%A, %B %-d, %Y";
const HUMAN_DATE_PARSE: &str = "%A, %B %d, %Y";

/// Final subject and body pair handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// HTML alternative with the same content.
    pub html_body: String,
}

/// Pure renderer. Never fails: a bad date is replaced by today's date.
#[derive(Debug, Clone, Copy)]
pub struct MessageRenderer {
    zone: Zone,
}

impl MessageRenderer {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }

    pub fn render(&self, readings: &ReadingSet, reflection: &Reflection) -> RenderedMessage {
        let date = self.date_label(&readings.date);
        let subject = format!("Daily Mass Readings – {date}");

        let body = format!(
            "{feast}\n\
             Liturgical color: {color}\n\
             {date}\n\n\
             FIRST READING\n{first}\n\n\
             RESPONSORIAL PSALM\n{psalm}\n\n\
             GOSPEL\n{gospel}\n\n\
             REFLECTION\n{commentary}\n\n\
             Question for reflection: {question}\n\n\
             Read today's readings at the source: {url}\n",
            feast = readings.feast_name,
            color = readings.liturgical_color,
            first = readings.first_reading,
            psalm = readings.psalm,
            gospel = readings.gospel,
            commentary = reflection.commentary,
            question = reflection.question,
            url = readings.source_url,
        );

        let html_body = format!(
            "<html><body>\
             <h1>{feast}</h1>\
             <p><strong>Liturgical color:</strong> {color}<br>{date}</p>\
             <h2>First Reading</h2><p>{first}</p>\
             <h2>Responsorial Psalm</h2><p>{psalm}</p>\
             <h2>Gospel</h2><p>{gospel}</p>\
             <h2>Reflection</h2><p>{commentary}</p>\
             <p><em>Question for reflection:</em> {question}</p>\
             <p><a href=\"{url}\">Read today's readings at the source</a></p>\
             </body></html>",
            feast = html_text(&readings.feast_name),
            color = html_text(&readings.liturgical_color),
            date = html_text(&date),
            first = html_text(&readings.first_reading),
            psalm = html_text(&readings.psalm),
            gospel = html_text(&readings.gospel),
            commentary = html_text(&reflection.commentary),
            question = html_text(&reflection.question),
            url = escape_html(&readings.source_url),
        );

        RenderedMessage {
            subject,
            body,
            html_body,
        }
    }

    /// Human-readable label for an ISO date, falling back to today.
    pub fn date_label(&self, iso_date: &str) -> String {
        match human_date(iso_date) {
            Some(label) => label,
            None => {
                let today = self.zone.today();
                warn!(raw = iso_date, %today, "Unparsable readings date, using today");
                today.format(HUMAN_DATE).to_string()
            }
        }
    }
}

/// Format and validate by re-parsing; `None` if either step fails.
fn human_date(iso_date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(iso_date.trim(), ISO_DATE).ok()?;
    let label = date.format(HUMAN_DATE).to_string();
    let reparsed = NaiveDate::parse_from_str(&label, HUMAN_DATE_PARSE).ok()?;
    (reparsed == date).then_some(label)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escaped text with line breaks kept as `<br>`.
fn html_text(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(date: &str) -> ReadingSet {
        ReadingSet {
            date: date.to_string(),
            source_url: "https://example.org/101526.cfm".to_string(),
            feast_name: "Memorial of Saint Teresa of Jesus".to_string(),
            liturgical_color: "White".to_string(),
            first_reading: "Para one.\n\nPara two.".to_string(),
            psalm: "R. The Lord is my shepherd.".to_string(),
            gospel: "Jesus said, \"Come <and> see.\"".to_string(),
        }
    }

    fn reflection() -> Reflection {
        Reflection {
            commentary: "A short commentary.".to_string(),
            question: "What will you do?".to_string(),
        }
    }

    fn renderer() -> MessageRenderer {
        MessageRenderer::new(Zone::parse("America/New_York").unwrap())
    }

    #[test]
    fn subject_has_fixed_shape() {
        let msg = renderer().render(&readings("2026-10-15"), &reflection());
        assert_eq!(msg.subject, "Daily Mass Readings – Thursday, October 15, 2026");
    }

    #[test]
    fn body_embeds_every_part() {
        let msg = renderer().render(&readings("2026-10-15"), &reflection());
        for part in [
            "Memorial of Saint Teresa of Jesus",
            "Liturgical color: White",
            "Para one.\n\nPara two.",
            "R. The Lord is my shepherd.",
            "Come <and> see.",
            "A short commentary.",
            "What will you do?",
            "https://example.org/101526.cfm",
        ] {
            assert!(msg.body.contains(part), "body missing {part:?}");
        }
    }

    #[test]
    fn html_escapes_and_keeps_breaks() {
        let msg = renderer().render(&readings("2026-10-15"), &reflection());
        assert!(msg.html_body.contains("Para one.<br><br>Para two."));
        assert!(msg.html_body.contains("&quot;Come &lt;and&gt; see.&quot;"));
        assert!(msg.html_body.contains("href=\"https://example.org/101526.cfm\""));
    }

    #[test]
    fn malformed_date_substitutes_today() {
        let r = renderer();
        let today = Zone::parse("America/New_York").unwrap().today();
        let expected = format!("Daily Mass Readings – {}", today.format(HUMAN_DATE));
        for bad in ["", "not a date", "2026-13-45", "15/10/2026"] {
            let msg = r.render(&readings(bad), &reflection());
            assert_eq!(msg.subject, expected, "input {bad:?}");
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = renderer().render(&readings("2026-01-01"), &reflection());
        let b = renderer().render(&readings("2026-01-01"), &reflection());
        assert_eq!(a, b);
        assert!(a.subject.ends_with("Thursday, January 1, 2026"));
    }
}
