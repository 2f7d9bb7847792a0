use regex::{Captures, Regex};
use url::Url;

/// Rewrites absolute and protocol-relative references to the source site
/// into root-relative paths. `https://site/wp-content/x` becomes
/// `/wp-content/x`, `https://site/about/` becomes `/about/` and a bare
/// `https://site` becomes `/`.
#[derive(Debug, Clone)]
pub struct Localizer {
    pattern: Regex,
}

impl Localizer {
    pub fn new(site: &Url) -> anyhow::Result<Self> {
        let host = site
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("site url must have host: {site}"))?;
        let host = host.strip_prefix("www.").unwrap_or(host);

        let pattern = format!(
            r#"(?i)(?:https?:)?//(?:www\.)?{}(?::\d+)?(?P<tail>[/?#"'\s<>)]|$)"#,
            regex::escape(host)
        );
        let pattern = Regex::new(&pattern)?;

        Ok(Self { pattern })
    }

    pub fn localize(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let tail = caps.name("tail").map_or("", |m| m.as_str());
                if tail == "/" {
                    "/".to_owned()
                } else {
                    format!("/{tail}")
                }
            })
            .into_owned()
    }
}
