use crate::document::{BodyEntry, DailyDocument, DailyHeader};

const HEAD: &str = include_str!("../templates/daily_xml/head.xml");
const BODY: &str = include_str!("../templates/daily_xml/body.xml");
const TAIL: &str = include_str!("../templates/daily_xml/tail.xml");

/// Three-part skeleton of a daily 80020 XML document.
///
/// The head is filled once from the header, the body once per hourly
/// entry, and the tail is written verbatim. Placeholders use the
/// `{{name}}` form; values are XML-escaped on substitution.
#[derive(Debug, Clone)]
pub struct DailyTemplate {
    head: String,
    body: String,
    tail: String,
}

impl Default for DailyTemplate {
    fn default() -> Self {
        Self::new(HEAD, BODY, TAIL)
    }
}

impl DailyTemplate {
    pub fn new(head: impl Into<String>, body: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            body: body.into(),
            tail: tail.into(),
        }
    }

    pub fn render(&self, document: &DailyDocument) -> String {
        let mut out = self.render_head(&document.header);
        for entry in &document.entries {
            out.push_str(&self.render_entry(entry));
        }
        out.push_str(&self.tail);
        out
    }

    fn render_head(&self, header: &DailyHeader) -> String {
        substitute(
            &self.head,
            &[
                ("day", header.day.as_str()),
                ("month", header.month.as_str()),
                ("year", header.year.as_str()),
                ("contract", header.contract.as_str()),
                ("company_name", header.company_name.as_str()),
                ("meter", header.meter.as_str()),
            ],
        )
    }

    fn render_entry(&self, entry: &BodyEntry) -> String {
        substitute(
            &self.body,
            &[
                ("start_hour", entry.start_hour.as_str()),
                ("end_hour", entry.end_hour.as_str()),
                ("value", entry.value.as_str()),
            ],
        )
    }
}

/// Fill `{{name}}` placeholders in one pass over the skeleton. Substituted
/// values are never rescanned; unknown or unterminated placeholders are
/// copied through unchanged.
fn substitute(skeleton: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(skeleton.len());
    let mut rest = skeleton;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match fields.iter().find(|(field, _)| *field == name) {
            Some((_, value)) => out.push_str(&escape_xml(value)),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
