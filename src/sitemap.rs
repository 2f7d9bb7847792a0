use std::collections::HashSet;

use anyhow::Context as _;
use quick_xml::events::Event;
use url::Url;

use crate::crawl::fetch_text;
use crate::layout::normalize_path;

pub const SITEMAP_PATH: &str = "/wp-sitemap.xml";

/// `<loc>` entries of a sitemap or sitemap index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    pub is_index: bool,
    pub locs: Vec<String>,
}

pub fn parse_sitemap(xml: &str) -> anyhow::Result<SitemapDocument> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut doc = SitemapDocument::default();
    let mut loc: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("parse sitemap xml")? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemapindex" => doc.is_index = true,
                b"loc" => loc = Some(String::new()),
                _ => {}
            },
            Event::Text(e) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&e.unescape().context("unescape sitemap text")?);
                }
            }
            Event::CData(e) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                if let Some(text) = loc.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        doc.locs.push(text.to_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

/// Fetches the WordPress sitemap index and every sitemap it lists, and
/// returns the page URLs in sitemap order. Any failed fetch aborts.
pub async fn discover_page_urls(client: &reqwest::Client, site: &Url) -> anyhow::Result<Vec<Url>> {
    let index_url = site.join(SITEMAP_PATH).context("build sitemap url")?;
    let index = fetch_text(client, &index_url)
        .await
        .context("fetch sitemap index")?;

    let index = parse_sitemap(&index).context("read sitemap index")?;
    if !index.is_index {
        return page_urls(site, index.locs);
    }

    let mut locs = Vec::new();
    for loc in index.locs {
        let sitemap_url = Url::parse(&loc).with_context(|| format!("parse sitemap url: {loc}"))?;
        let xml = fetch_text(client, &sitemap_url)
            .await
            .with_context(|| format!("fetch sitemap: {sitemap_url}"))?;
        let found = parse_sitemap(&xml)
            .with_context(|| format!("read sitemap: {sitemap_url}"))?
            .locs;
        tracing::debug!(sitemap = %sitemap_url, pages = found.len(), "read sitemap");
        locs.extend(found);
    }

    page_urls(site, locs)
}

/// Keeps same-site URLs, first occurrence per normalized path.
fn page_urls(site: &Url, locs: Vec<String>) -> anyhow::Result<Vec<Url>> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for loc in locs {
        let url = Url::parse(&loc).with_context(|| format!("parse page url: {loc}"))?;
        if !is_same_site(site, &url) {
            tracing::debug!(url = %url, "skipping off-site sitemap entry");
            continue;
        }
        if seen.insert(normalize_path(url.path())) {
            urls.push(url);
        }
    }

    Ok(urls)
}

fn bare_host(url: &Url) -> Option<&str> {
    url.host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host))
}

fn is_same_site(site: &Url, url: &Url) -> bool {
    bare_host(site).is_some_and(|host| bare_host(url) == Some(host))
        && site.port_or_known_default() == url.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sitemap_decodes_entities() -> anyhow::Result<()> {
        let xml = r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><sitemap><loc>https://example.com/wp-sitemap-posts-page-1.xml</loc></sitemap>
<sitemap><loc>
  https://example.com/wp-sitemap.xml?a=1&amp;b=2
</loc></sitemap></sitemapindex>"#;
        let doc = parse_sitemap(xml)?;
        assert!(doc.is_index);
        assert_eq!(
            doc.locs,
            vec![
                "https://example.com/wp-sitemap-posts-page-1.xml",
                "https://example.com/wp-sitemap.xml?a=1&b=2",
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_sitemap_reads_urlset_with_cdata_and_prefixes() -> anyhow::Result<()> {
        let xml = r#"<s:urlset xmlns:s="http://www.sitemaps.org/schemas/sitemap/0.9">
<s:url><s:loc><![CDATA[https://example.com/caf%C3%A9/?a=1&b=2]]></s:loc></s:url>
<s:url><s:loc>https://example.com/&#x61;bout/</s:loc><s:lastmod>2024-01-01</s:lastmod></s:url>
<s:url><s:loc>   </s:loc></s:url>
</s:urlset>"#;
        let doc = parse_sitemap(xml)?;
        assert!(!doc.is_index);
        assert_eq!(
            doc.locs,
            vec![
                "https://example.com/caf%C3%A9/?a=1&b=2",
                "https://example.com/about/",
            ]
        );
        Ok(())
    }

    #[test]
    fn page_urls_dedupe_by_path_and_drop_other_hosts() -> anyhow::Result<()> {
        let site = Url::parse("https://www.example.com/")?;
        let urls = page_urls(
            &site,
            vec![
                "https://example.com/about/".to_owned(),
                "https://www.example.com/about".to_owned(),
                "https://other.com/".to_owned(),
                "https://example.com/".to_owned(),
            ],
        )?;
        let paths = urls.iter().map(Url::path).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/about/", "/"]);
        Ok(())
    }
}
