//! Markup sanitization for untrusted model output.
//!
//! Input is parsed with an HTML5 tokenizer into a tree and re-serialized.
//! Only allow-listed elements are written back:
//!
//! - dangerous elements (`script`, `iframe`, `object`, …) are dropped together
//!   with everything inside them
//! - any other element outside the allow-list is unwrapped, its children kept
//! - `on*` event-handler attributes are dropped
//! - `href`/`src` values using a `javascript:` or `data:` scheme are replaced
//!   (`href="#"`, `src=""`)
//! - comments and doctypes are dropped, text is re-escaped
//!
//! The output is a fixed point of [`sanitize`].

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde_json::Value;
use std::sync::LazyLock;

/// Elements written back to the output.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "b", "i", "u", "code", "pre", "ul", "ol", "li", "h1", "h2", "h3",
    "h4", "h5", "h6", "blockquote", "a", "span", "div", "img",
];

/// Elements removed together with their content.
pub const DROPPED_TAGS: &[&str] = &[
    "script", "iframe", "object", "embed", "style", "link", "meta", "base", "form", "template",
];

/// Event-handler attributes removed by name.
pub const EVENT_ATTRS: &[&str] = &[
    "onclick",
    "onerror",
    "onload",
    "onmouseover",
    "onfocus",
    "onblur",
    "onchange",
    "onsubmit",
    "onkeydown",
    "onkeyup",
];

/// URL schemes refused in `href`/`src`.
pub const BLOCKED_SCHEMES: &[&str] = &["javascript:", "data:"];

const VOID_TAGS: &[&str] = &["br", "img"];

/// Re-parsing the output of a pass can move nodes (an unwrapped element may
/// have been a scope boundary). Passes repeat until the output is stable.
const MAX_PASSES: usize = 4;

static ANY_EVENT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^on[a-z]+$").expect("valid regex"));
static ATTR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_:.\-]*$").expect("valid regex"));

/// Strip executable markup from `html`. Never fails.
pub fn sanitize(html: &str) -> String {
    let mut out = sanitize_once(html);
    for _ in 1..MAX_PASSES {
        let next = sanitize_once(&out);
        if next == out {
            break;
        }
        out = next;
    }
    out
}

/// [`sanitize`] for a JSON value; anything but a string yields `""`.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}

/// Render a note body for a note store: both parts sanitized, body newlines
/// turned into `<br/>`.
pub fn render_note(title: &str, body: &str) -> String {
    format!(
        "<h2>{}</h2>\n<div>{}</div>",
        sanitize(title),
        sanitize(body).replace('\n', "<br/>")
    )
}

fn sanitize_once(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            // comments, doctypes, processing instructions
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if DROPPED_TAGS.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);

    let mut attrs: Vec<(&str, &str)> = element
        .value()
        .attrs()
        .filter(|(attr, _)| is_safe_attr_name(attr))
        .collect();
    attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    for (attr, value) in attrs {
        let value = match attr {
            "href" if has_blocked_scheme(value) => "#",
            "src" if has_blocked_scheme(value) => "",
            _ => value,
        };
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    // The parser eats one newline right after `<pre>`.
    if name == "pre" {
        let leading_newline = element.children().next().is_some_and(|first| match first.value() {
            Node::Text(text) => text.starts_with('\n'),
            _ => false,
        });
        if leading_newline {
            out.push('\n');
        }
    }

    write_children(element, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_safe_attr_name(name: &str) -> bool {
    ATTR_NAME.is_match(name)
        && !EVENT_ATTRS.contains(&name)
        && !ANY_EVENT_ATTR.is_match(name)
}

/// Browsers ignore whitespace and control characters inside a scheme, so
/// they are ignored here too.
fn has_blocked_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect();
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| compact.starts_with(scheme))
}
