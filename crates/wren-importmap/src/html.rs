use once_cell::sync::Lazy;
use regex::Regex;

use crate::map::ImportMap;

static EXISTING_IMPORT_MAP: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*\btype\s*=\s*["']?importmap["']?[^>]*>.*?</script\s*>"#).ok()
});
static HEAD_CLOSE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)</head\s*>").ok());
static BODY_OPEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)<body\b[^>]*>").ok());
static HTML_OPEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)<html\b[^>]*>").ok());

impl ImportMap {
    /// Put this map into an HTML document as `<script type="importmap">`.
    ///
    /// An existing import map script is replaced. Otherwise the script goes right
    /// before `</head>`, else right after `<body>`, else after `<html>`, else first.
    pub fn inject_html(&self, html: &str) -> String {
        // `</` inside a JSON string would end the script element early.
        let snippet = format!(
            "<script type=\"importmap\">\n{}\n</script>",
            self.to_json_pretty().replace("</", "<\\/")
        );

        if let Some(found) = find(&EXISTING_IMPORT_MAP, html) {
            return splice(html, found.0, found.1, &snippet);
        }
        if let Some((start, _)) = find(&HEAD_CLOSE, html) {
            return splice(html, start, start, &snippet);
        }
        for tag in [&BODY_OPEN, &HTML_OPEN] {
            if let Some((_, end)) = find(tag, html) {
                return splice(html, end, end, &snippet);
            }
        }
        format!("{}{}", snippet, html)
    }
}

fn find(pattern: &Lazy<Option<Regex>>, html: &str) -> Option<(usize, usize)> {
    pattern
        .as_ref()?
        .find(html)
        .map(|m| (m.start(), m.end()))
}

fn splice(html: &str, start: usize, end: usize, snippet: &str) -> String {
    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..start]);
    out.push_str(snippet);
    out.push_str(&html[end..]);
    out
}
