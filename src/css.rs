use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

// Stands in for the migrated site's origin; only path, query and fragment
// of URLs joined onto it are read.
static SITE_ROOT: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://site.invalid/").expect("SITE_ROOT url"));

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"']*))\s*\)"#).expect("CSS_URL regex")
});

/// Whether a `url(...)` value names a fetchable file: a relative
/// reference or an http(s) URL. `data:`, `blob:`, fragment-only and other
/// schemes are not.
pub fn is_file_reference(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return false;
    }
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => true,
    }
}

/// Inner values of every `url(...)` token, quotes removed.
pub fn urls(css: &str) -> Vec<&str> {
    CSS_URL
        .captures_iter(css)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim())
        })
        .collect()
}

/// Replaces `url(...)` tokens for which `f` returns a new value, keeping
/// the original quoting style.
pub fn rewrite_urls(css: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
    CSS_URL
        .replace_all(css, |caps: &Captures<'_>| {
            let (quote, value) = if let Some(m) = caps.get(1) {
                ("\"", m.as_str())
            } else if let Some(m) = caps.get(2) {
                ("'", m.as_str())
            } else {
                ("", caps.get(3).map_or("", |m| m.as_str()))
            };
            match f(value.trim()) {
                Some(new) => format!("url({quote}{new}{quote})"),
                None => caps[0].to_owned(),
            }
        })
        .into_owned()
}

/// Resolves `reference` as a browser would inside the document at
/// `base_path`, a site path such as `/wp-content/themes/x/style.css`.
/// Absolute and protocol-relative references keep their own host.
pub fn resolve(base_path: &str, reference: &str) -> Option<Url> {
    SITE_ROOT.join(base_path).ok()?.join(reference.trim()).ok()
}

/// Path of a resolved URL (still percent-encoded) and its `?query#fragment`
/// suffix.
pub fn split_suffix(url: &Url) -> (String, String) {
    let mut suffix = String::new();
    if let Some(query) = url.query() {
        suffix.push('?');
        suffix.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        suffix.push('#');
        suffix.push_str(fragment);
    }
    (url.path().to_owned(), suffix)
}
