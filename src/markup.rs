// HTML and URL helpers for table emission

use crate::data::Cell;
use crate::parser::ast::{LinkTemplate, LinkValue};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Query values keep unreserved characters, everything else is escaped
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escape text for use in element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
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

pub fn url_encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Build the `href` for one row. The result is already HTML-escaped.
pub fn build_href(link: &LinkTemplate, row: &[Cell]) -> String {
    let mut href = escape_html(&link.base);
    let Some(params) = &link.query else {
        return href;
    };

    href.push('?');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            href.push_str("&amp;");
        }
        href.push_str(&escape_html(&param.key));
        match &param.value {
            LinkValue::Column(idx) => {
                href.push('=');
                href.push_str(&url_encode(&row[*idx].to_string()));
            }
            LinkValue::Literal(value) => {
                href.push('=');
                href.push_str(&url_encode(value));
            }
            LinkValue::Absent => {}
        }
    }
    href
}

/// Render ` name="value"` pairs, skipping absent ones
pub fn attributes(pairs: &[(&str, Option<String>)]) -> String {
    pairs
        .iter()
        .filter_map(|(name, value)| {
            value
                .as_ref()
                .map(|v| format!(" {}=\"{}\"", name, escape_html(v)))
        })
        .collect()
}
