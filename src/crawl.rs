use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::Context as _;
use regex::Regex;
use reqwest::header::ACCEPT;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::cli::CrawlArgs;
use crate::formats::{AttrValue, HeadTag, ManifestEntry};
use crate::fragment_store::{FragmentKind, FragmentStore};
use crate::localize::Localizer;

static HEADER_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<header\b[^>]*\bdata-elementor-type\s*=\s*["']?header["']?[^>]*>"#)
        .expect("HEADER_OPEN regex")
});

static HEADER_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(/?)header\b[^>]*>").expect("HEADER_TAGS regex"));

static FOOTER_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<footer\b[^>]*\bdata-elementor-type\s*=\s*["']?footer["']?[^>]*>"#)
        .expect("FOOTER_OPEN regex")
});

static FOOTER_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(/?)footer\b[^>]*>").expect("FOOTER_TAGS regex"));

const USER_AGENT: &str = "sitemigrate/0.1";

pub async fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let site = Url::parse(&args.site).context("parse --site")?;
    if site.scheme() != "http" && site.scheme() != "https" {
        anyhow::bail!("--site must be http/https: {site}");
    }

    let content_dir = PathBuf::from(&args.content_dir);
    let wp_dir = crate::layout::wp_dir(&content_dir);
    if wp_dir.exists() && !args.force {
        anyhow::bail!(
            "crawl output directory already exists (pass --force to replace): {}",
            wp_dir.display()
        );
    }

    let client = build_client()?;
    let page_urls = crate::sitemap::discover_page_urls(&client, &site)
        .await
        .context("discover pages")?;
    tracing::info!(site = %site, pages = page_urls.len(), "crawl: sitemap read");

    let bodies = fetch_pages(&client, &page_urls, args.concurrency).await?;
    let localizer = Localizer::new(&site).context("build url localizer")?;

    reset_snapshot_dir(&wp_dir)?;
    let result = write_snapshot(&content_dir, &wp_dir, &localizer, &page_urls, bodies);
    if result.is_err()
        && let Err(err) = std::fs::remove_dir_all(&wp_dir)
    {
        tracing::warn!(dir = %wp_dir.display(), error = %err, "could not remove partial snapshot");
    }
    result
}

fn write_snapshot(
    content_dir: &Path,
    wp_dir: &Path,
    localizer: &Localizer,
    page_urls: &[Url],
    bodies: Vec<String>,
) -> anyhow::Result<()> {
    let mut store = FragmentStore::new(wp_dir);
    let mut manifest = Vec::with_capacity(page_urls.len());
    for (url, html) in page_urls.iter().zip(bodies) {
        let entry = store_page(&mut store, localizer, url, &html)
            .with_context(|| format!("process page: {url}"))?;
        tracing::debug!(path = %entry.path, header = %entry.header_path, "stored page");
        manifest.push(entry);
    }

    let manifest_path = crate::layout::manifest_path(content_dir);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest")?;
    crate::layout::write_text(&manifest_path, &json).context("write manifest")?;

    tracing::info!(
        pages = manifest.len(),
        headers = store.unique_count(FragmentKind::Header),
        footers = store.unique_count(FragmentKind::Footer),
        manifest = %manifest_path.display(),
        "crawl: done"
    );
    Ok(())
}

/// Clears a previous snapshot. Only called once every page has been fetched.
fn reset_snapshot_dir(wp_dir: &Path) -> anyhow::Result<()> {
    if wp_dir.exists() {
        std::fs::remove_dir_all(wp_dir)
            .with_context(|| format!("remove previous snapshot: {}", wp_dir.display()))?;
    }
    std::fs::create_dir_all(wp_dir)
        .with_context(|| format!("create snapshot dir: {}", wp_dir.display()))?;
    Ok(())
}

pub fn build_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}

/// GETs `url` and returns its body; any non-2xx status is an error.
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &Url) -> anyhow::Result<String> {
    let response = client
        .get(url.clone())
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("GET {url}: unexpected status {status}");
    }

    response
        .text()
        .await
        .with_context(|| format!("read body: {url}"))
}

/// Fetches every page with at most `concurrency` requests in flight and
/// returns the bodies in the order of `urls`.
async fn fetch_pages(
    client: &reqwest::Client,
    urls: &[Url],
    concurrency: usize,
) -> anyhow::Result<Vec<String>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (idx, url) in urls.iter().cloned().enumerate() {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("acquire fetch permit")?;
            let html = fetch_text(&client, &url).await?;
            tracing::debug!(url = %url, bytes = html.len(), "fetched page");
            Ok::<_, anyhow::Error>((idx, html))
        });
    }

    let mut bodies: Vec<Option<String>> = vec![None; urls.len()];
    while let Some(joined) = tasks.join_next().await {
        let (idx, html) = joined.context("join page fetch")??;
        bodies[idx] = Some(html);
    }

    bodies
        .into_iter()
        .zip(urls)
        .map(|(body, url)| body.ok_or_else(|| anyhow::anyhow!("missing body for {url}")))
        .collect()
}

/// The five ordered regions of a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRegions<'a> {
    pub before: &'a str,
    pub header: &'a str,
    pub main: &'a str,
    pub footer: &'a str,
    pub after: &'a str,
}

/// Splits a page around its Elementor header and footer. All four
/// boundaries (body open/close, header, footer) are required.
pub fn split_regions(html: &str) -> anyhow::Result<(&str, PageRegions<'_>)> {
    let Some(body) = crate::html::find_body(html) else {
        anyhow::bail!("page has no <body> element");
    };
    let inner = &html[body.inner];

    let Some(header) = crate::html::find_element(inner, &HEADER_OPEN, &HEADER_TAGS) else {
        anyhow::bail!("page has no <header data-elementor-type=\"header\"> element");
    };
    let rest = &inner[header.end..];
    let Some(footer) = crate::html::find_element(rest, &FOOTER_OPEN, &FOOTER_TAGS) else {
        anyhow::bail!("page has no <footer data-elementor-type=\"footer\"> after the header");
    };

    let regions = PageRegions {
        before: &inner[..header.start],
        header: &inner[header.clone()],
        main: &rest[..footer.start],
        footer: &rest[footer.clone()],
        after: &rest[footer.end..],
    };
    Ok((body.attributes, regions))
}

fn body_class(body_attributes: &str) -> String {
    let attributes = crate::html::parse_attributes(body_attributes);
    crate::html::attribute(&attributes, "class")
        .unwrap_or_default()
        .split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn localize_head_tag(localizer: &Localizer, tag: HeadTag) -> HeadTag {
    match tag {
        HeadTag::Link {
            href,
            media,
            id,
            kind,
        } => HeadTag::Link {
            href: localizer.localize(&href),
            media,
            id,
            kind,
        },
        // Inline CSS keeps absolute urls; the asset migrator handles them.
        style @ HeadTag::Style { .. } => style,
        HeadTag::Script {
            attributes,
            content,
        } => HeadTag::Script {
            attributes: attributes
                .into_iter()
                .map(|(name, value)| match value {
                    AttrValue::Text(text) => (name, AttrValue::Text(localizer.localize(&text))),
                    flag @ AttrValue::Flag(_) => (name, flag),
                })
                .collect(),
            content: content.map(|c| localizer.localize(&c)),
        },
    }
}

fn store_page(
    store: &mut FragmentStore,
    localizer: &Localizer,
    url: &Url,
    html: &str,
) -> anyhow::Result<ManifestEntry> {
    let path = crate::layout::normalize_path(url.path());
    let (body_attributes, regions) = split_regions(html)?;

    let before = localizer.localize(regions.before);
    let header = localizer.localize(regions.header);
    let main = localizer.localize(regions.main);
    let footer = localizer.localize(regions.footer);
    let after = localizer.localize(regions.after);

    let header_path = store.store(FragmentKind::Header, &header)?;
    let footer_path = store.store(FragmentKind::Footer, &footer)?;

    let page_dir = crate::layout::page_dir_rel(&path)?;
    let html_path = format!("{page_dir}/index.html");
    crate::layout::write_text(&store.root().join(&html_path), &main)
        .context("write main fragment")?;

    let before_path = write_optional(store.root(), &page_dir, "before.html", &before)?;
    let after_path = write_optional(store.root(), &page_dir, "after.html", &after)?;

    let head = crate::html::head(html);
    let head_tags = crate::html::head_tags(head)
        .into_iter()
        .map(|tag| localize_head_tag(localizer, tag))
        .collect();

    Ok(ManifestEntry {
        path,
        url: url.to_string(),
        retrieved_at: chrono::Utc::now().to_rfc3339(),
        html_path,
        before_path,
        after_path,
        header_path,
        footer_path,
        title: crate::html::title(head),
        description: crate::html::meta_description(head),
        body_class: body_class(body_attributes),
        head_tags,
    })
}

fn write_optional(
    root: &Path,
    page_dir: &str,
    file_name: &str,
    html: &str,
) -> anyhow::Result<Option<String>> {
    if html.trim().is_empty() {
        return Ok(None);
    }
    let rel = format!("{page_dir}/{file_name}");
    crate::layout::write_text(&root.join(&rel), html)
        .with_context(|| format!("write {file_name}"))?;
    Ok(Some(rel))
}
