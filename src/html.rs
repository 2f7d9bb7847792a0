//! Targeted regex scanning over HTML text. No tree is built: each helper
//! looks for one construct and reports slices or offsets into the input.

use std::ops::Range;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::formats::{AttrValue, HeadTag, ScriptRecord};

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("ATTRIBUTE regex")
});

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b([^>]*)>").expect("BODY_OPEN regex"));

static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head\s*>").expect("HEAD regex"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("TITLE regex"));

static META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("META regex"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").expect("LINK regex"));

static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("SCRIPT regex")
});

static IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b([^>]*)>").expect("IMG regex"));

static HEAD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<link\b(?P<link>[^>]*)>|<style\b(?P<style>[^>]*)>(?P<css>.*?)</style\s*>|<script\b(?P<script>[^>]*)>(?P<js>.*?)</script\s*>",
    )
    .expect("HEAD_TOKEN regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("TAG regex"));

pub const LD_JSON: &str = "application/ld+json";

/// Parses the attribute text of an opening tag. Names are lowercased and
/// the first occurrence of a name wins.
pub fn parse_attributes(raw: &str) -> IndexMap<String, AttrValue> {
    let mut attributes = IndexMap::new();
    for caps in ATTRIBUTE.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| AttrValue::Text(m.as_str().to_owned()))
            .unwrap_or(AttrValue::Flag(true));
        attributes.entry(name).or_insert(value);
    }
    attributes
}

pub fn attribute<'a>(attributes: &'a IndexMap<String, AttrValue>, name: &str) -> Option<&'a str> {
    attributes.get(name).and_then(AttrValue::as_str)
}

fn has_token(value: Option<&str>, token: &str) -> bool {
    value.is_some_and(|value| {
        value
            .split_ascii_whitespace()
            .any(|t| t.eq_ignore_ascii_case(token))
    })
}

pub fn has_class(attributes: &IndexMap<String, AttrValue>, class: &str) -> bool {
    has_token(attribute(attributes, "class"), class)
}

/// The `<body>` element split into its attribute text and inner range.
#[derive(Debug, Clone)]
pub struct Body<'a> {
    pub attributes: &'a str,
    pub inner: Range<usize>,
}

/// Locates `<body ...>` and the last `</body>`.
pub fn find_body(html: &str) -> Option<Body<'_>> {
    let open = BODY_OPEN.captures(html)?;
    let open_match = open.get(0)?;
    let attributes = open.get(1).map_or("", |m| m.as_str());
    let close = html.to_ascii_lowercase().rfind("</body")?;
    if close < open_match.end() {
        return None;
    }
    Some(Body {
        attributes,
        inner: open_match.end()..close,
    })
}

/// Finds the first element whose opening tag matches `open`, returning the
/// byte range of the whole element including its closing tag. `tags` must
/// match both opening and closing tags of the same element name, with the
/// slash captured in group 1, so nested elements of that name are skipped.
pub fn find_element(html: &str, open: &Regex, tags: &Regex) -> Option<Range<usize>> {
    let start = open.find(html)?;
    let mut depth = 1usize;
    for caps in tags.captures_iter(&html[start.end()..]) {
        let whole = caps.get(0)?;
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Some(start.start()..start.end() + whole.end());
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}

pub fn head(html: &str) -> &str {
    HEAD.captures(html)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

pub fn title(html: &str) -> String {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_owned())
        .unwrap_or_default()
}

pub fn meta_description(head: &str) -> String {
    for caps in META.captures_iter(head) {
        let attributes = parse_attributes(&caps[1]);
        let is_description =
            attribute(&attributes, "name").is_some_and(|n| n.eq_ignore_ascii_case("description"));
        if is_description {
            return attribute(&attributes, "content")
                .map(|c| decode_entities(c).trim().to_owned())
                .unwrap_or_default();
        }
    }
    String::new()
}

/// Tokenizes stylesheet links, inline styles and scripts in one pass, so
/// the result is already in document order.
pub fn head_tags(head: &str) -> Vec<HeadTag> {
    let mut tags = Vec::new();
    for caps in HEAD_TOKEN.captures_iter(head) {
        if let Some(raw) = caps.name("link") {
            let attributes = parse_attributes(raw.as_str());
            if !has_token(attribute(&attributes, "rel"), "stylesheet") {
                continue;
            }
            let Some(href) = attribute(&attributes, "href") else {
                continue;
            };
            tags.push(HeadTag::Link {
                href: href.to_owned(),
                media: attribute(&attributes, "media").map(str::to_owned),
                id: attribute(&attributes, "id").map(str::to_owned),
                kind: attribute(&attributes, "type").map(str::to_owned),
            });
        } else if let Some(raw) = caps.name("style") {
            let attributes = parse_attributes(raw.as_str());
            tags.push(HeadTag::Style {
                css: caps.name("css").map_or("", |m| m.as_str()).to_owned(),
                id: attribute(&attributes, "id").map(str::to_owned),
                media: attribute(&attributes, "media").map(str::to_owned),
                kind: attribute(&attributes, "type").map(str::to_owned),
            });
        } else if let Some(raw) = caps.name("script") {
            let content = caps.name("js").map_or("", |m| m.as_str());
            tags.push(HeadTag::Script {
                attributes: parse_attributes(raw.as_str()),
                content: (!content.trim().is_empty()).then(|| content.to_owned()),
            });
        }
    }
    tags
}

/// `href`s of every `<link rel="stylesheet">` in `html`.
pub fn stylesheet_links(html: &str) -> Vec<String> {
    LINK.captures_iter(html)
        .filter_map(|caps| {
            let attributes = parse_attributes(&caps[1]);
            if !has_token(attribute(&attributes, "rel"), "stylesheet") {
                return None;
            }
            attribute(&attributes, "href").map(str::to_owned)
        })
        .collect()
}

/// Removes every `<script>` except JSON-LD blocks and returns the stripped
/// HTML together with the removed scripts.
pub fn extract_scripts(html: &str) -> (String, Vec<ScriptRecord>) {
    let mut out = String::with_capacity(html.len());
    let mut scripts = Vec::new();
    let mut cursor = 0usize;

    for caps in SCRIPT.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let attributes = parse_attributes(&caps[1]);
        let is_ld_json =
            attribute(&attributes, "type").is_some_and(|t| t.trim().eq_ignore_ascii_case(LD_JSON));
        if is_ld_json {
            continue;
        }

        out.push_str(&html[cursor..whole.start()]);
        cursor = whole.end();

        let content = caps[2].trim();
        scripts.push(ScriptRecord {
            src: attribute(&attributes, "src").map(str::to_owned),
            content: (!content.is_empty()).then(|| content.to_owned()),
        });
    }

    out.push_str(&html[cursor..]);
    (out, scripts)
}

/// `src` of every `<img>`, deduplicated in document order.
pub fn image_sources(html: &str) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for caps in IMG.captures_iter(html) {
        let attributes = parse_attributes(&caps[1]);
        if let Some(src) = attribute(&attributes, "src")
            && !src.is_empty()
            && !sources.iter().any(|s| s == src)
        {
            sources.push(src.to_owned());
        }
    }
    sources
}

pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Decodes HTML character references, named and numeric.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
