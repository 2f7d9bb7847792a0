use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use indexmap::IndexSet;

use crate::cli::CompileArgs;
use crate::formats::{HeadTag, ManifestEntry, PageDocument, PagesDocument};
use crate::fragment_store::FragmentKind;
use crate::layout::read_or_empty;

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    let content_dir = PathBuf::from(&args.content_dir);
    let public_dir = PathBuf::from(&args.public_dir);

    let manifest_path = crate::layout::manifest_path(&content_dir);
    let manifest_json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("read manifest: {}", manifest_path.display()))?;
    let manifest: Vec<ManifestEntry> =
        serde_json::from_str(&manifest_json).context("parse manifest")?;

    let partials_dir = crate::layout::partials_dir(&content_dir);
    if partials_dir.exists() {
        std::fs::remove_dir_all(&partials_dir)
            .with_context(|| format!("remove previous partials: {}", partials_dir.display()))?;
    }

    let mut compiler = Compiler::new(
        crate::layout::wp_dir(&content_dir),
        crate::layout::marketing_dir(&content_dir),
    );
    let mut pages = PagesDocument::new();
    for entry in &manifest {
        let page = compiler
            .compile_entry(entry)
            .with_context(|| format!("compile page: {}", entry.path))?;
        tracing::debug!(
            path = %page.path,
            css = page.css.len(),
            scripts = page.scripts.len(),
            forms = page.hubspot_forms.len(),
            "compiled page"
        );
        pages.insert(page.path.clone(), page);
    }

    let pages_path = crate::layout::pages_document_path(&content_dir);
    let json = serde_json::to_string_pretty(&pages).context("serialize pages document")?;
    crate::layout::write_text(&pages_path, &json).context("write pages document")?;

    let inline_css_path = crate::layout::inline_css_path(&public_dir);
    crate::layout::write_text(&inline_css_path, &compiler.inline_css())
        .context("write inline css")?;

    tracing::info!(
        pages = pages.len(),
        partials = compiler.partials.len(),
        inline_styles = compiler.inline_styles.len(),
        out = %pages_path.display(),
        "compile: done"
    );
    Ok(())
}

/// Per-run state: partials already copied and inline styles seen so far.
#[derive(Debug)]
pub struct Compiler {
    wp_dir: PathBuf,
    marketing_dir: PathBuf,
    partials: HashMap<String, String>,
    inline_styles: IndexSet<String>,
}

impl Compiler {
    pub fn new(wp_dir: impl Into<PathBuf>, marketing_dir: impl Into<PathBuf>) -> Self {
        Self {
            wp_dir: wp_dir.into(),
            marketing_dir: marketing_dir.into(),
            partials: HashMap::new(),
            inline_styles: IndexSet::new(),
        }
    }

    pub fn compile_entry(&mut self, entry: &ManifestEntry) -> anyhow::Result<PageDocument> {
        let main = read_or_empty(&self.wp_dir.join(&entry.html_path));
        let before = read_optional(&self.wp_dir, entry.before_path.as_deref());
        let after = read_optional(&self.wp_dir, entry.after_path.as_deref());

        let header = self.link_partial(FragmentKind::Header, &entry.header_path)?;
        let footer = self.link_partial(FragmentKind::Footer, &entry.footer_path)?;

        let (html, mut scripts) = crate::html::extract_scripts(&main);
        let (_, before_scripts) = crate::html::extract_scripts(&before);
        let (_, after_scripts) = crate::html::extract_scripts(&after);
        scripts.extend(before_scripts);
        scripts.extend(after_scripts);

        let raw_html = format!("{before}{main}{after}");
        let embeds = crate::embeds::extract_embeds(scripts, &raw_html);

        for tag in &entry.head_tags {
            if let HeadTag::Style { css, .. } = tag {
                let css = css.trim();
                if !css.is_empty() {
                    self.inline_styles.insert(css.to_owned());
                }
            }
        }

        Ok(PageDocument {
            path: entry.path.clone(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            body_class: crate::rules::normalize_body_class(&entry.body_class),
            header,
            footer,
            html,
            css: collect_stylesheets(&entry.head_tags, &after),
            structured_data: structured_data(&entry.head_tags),
            hubspot_forms: embeds.forms,
            hubspot_meetings: embeds.meetings,
            scripts: embeds.scripts,
        })
    }

    /// Copies a header/footer fragment into the partials tree once per
    /// source path and returns its path relative to the marketing dir.
    fn link_partial(&mut self, kind: FragmentKind, source_rel: &str) -> anyhow::Result<Option<String>> {
        if source_rel.is_empty() {
            return Ok(None);
        }
        if let Some(existing) = self.partials.get(source_rel) {
            return Ok(Some(existing.clone()));
        }

        let source = self.wp_dir.join(source_rel);
        if !source.is_file() {
            tracing::warn!(fragment = %source.display(), "partial source missing");
            return Ok(None);
        }

        let file_name = Path::new(source_rel)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("fragment path has no file name: {source_rel}"))?;
        let rel = format!("partials/{}/{file_name}", kind.dir_name());
        let dest = self.marketing_dir.join(&rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create partials dir: {}", parent.display()))?;
        }
        std::fs::copy(&source, &dest)
            .with_context(|| format!("copy partial: {} -> {}", source.display(), dest.display()))?;

        self.partials.insert(source_rel.to_owned(), rel.clone());
        Ok(Some(rel))
    }

    /// Unique inline `<style>` bodies across all pages, in first-seen order.
    pub fn inline_css(&self) -> String {
        let mut out = String::new();
        for css in &self.inline_styles {
            out.push_str(css);
            out.push_str("\n\n");
        }
        out
    }
}

fn read_optional(dir: &Path, rel: Option<&str>) -> String {
    rel.map(|rel| read_or_empty(&dir.join(rel)))
        .unwrap_or_default()
}

pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Head stylesheets followed by stylesheet links in the after-footer
/// fragment, minus exclusions, query-stripped and deduplicated.
pub fn collect_stylesheets(head_tags: &[HeadTag], after_html: &str) -> Vec<String> {
    let head_links = head_tags.iter().filter_map(|tag| match tag {
        HeadTag::Link { href, .. } => Some(href.clone()),
        _ => None,
    });
    let after_links = crate::html::stylesheet_links(after_html);

    let mut css = IndexSet::new();
    for href in head_links.chain(after_links) {
        if crate::rules::is_excluded_stylesheet(&href) {
            continue;
        }
        let href = strip_query(&href);
        if !href.is_empty() {
            css.insert(href.to_owned());
        }
    }
    css.into_iter().collect()
}

pub fn structured_data(head_tags: &[HeadTag]) -> Vec<String> {
    head_tags
        .iter()
        .filter_map(|tag| match tag {
            HeadTag::Script {
                attributes,
                content,
            } => {
                let is_ld_json = crate::html::attribute(attributes, "type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(crate::html::LD_JSON));
                if is_ld_json { content.clone() } else { None }
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::formats::AttrValue;

    fn link(href: &str) -> HeadTag {
        HeadTag::Link {
            href: href.to_owned(),
            media: None,
            id: None,
            kind: None,
        }
    }

    fn script(kind: Option<&str>, content: &str) -> HeadTag {
        let mut attributes = IndexMap::new();
        if let Some(kind) = kind {
            attributes.insert("type".to_owned(), AttrValue::Text(kind.to_owned()));
        }
        HeadTag::Script {
            attributes,
            content: Some(content.to_owned()),
        }
    }

    #[test]
    fn stylesheets_are_filtered_stripped_and_deduplicated() {
        let tags = vec![
            link("/wp-content/themes/x/style.css?ver=1"),
            link("/wp-includes/css/dist/block-library/style.min.css"),
            link("/wp-content/plugins/cookie-notice/css/front.min.css"),
        ];
        let after = r#"<link rel="stylesheet" href="/wp-content/themes/x/style.css?ver=2"><link rel="stylesheet" href="https://fonts.googleapis.com/css?family=A"><link rel='stylesheet' href='/wp-content/uploads/elementor/css/post-9.css?ver=3'>"#;

        assert_eq!(
            collect_stylesheets(&tags, after),
            vec![
                "/wp-content/themes/x/style.css",
                "/wp-content/uploads/elementor/css/post-9.css",
            ]
        );
    }

    #[test]
    fn structured_data_keeps_head_order() {
        let tags = vec![
            script(Some("application/ld+json"), r#"{"a":1}"#),
            script(None, "console.log(1)"),
            script(Some("application/ld+json"), r#"{"b":2}"#),
        ];
        assert_eq!(structured_data(&tags), vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn compile_entry_builds_page_document() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let wp_dir = temp.path().join("wp");
        let marketing_dir = temp.path().join("marketing");

        crate::layout::write_text(
            &wp_dir.join("pages/contact/index.html"),
            r##"<main><div class="meetings-iframe-container"></div><script src="https://www.googletagmanager.com/gtag/js"></script><script>hbspt.forms.create({portalId: 1, formId: "f", target: "#t"});</script></main>"##,
        )?;
        crate::layout::write_text(
            &wp_dir.join("pages/contact/after.html"),
            r#"<script src="//js.hsforms.net/forms/embed/v2.js"></script>"#,
        )?;
        crate::layout::write_text(&wp_dir.join("headers/aaa.html"), "<header>H</header>")?;
        crate::layout::write_text(&wp_dir.join("footers/bbb.html"), "<footer>F</footer>")?;

        let entry = ManifestEntry {
            path: "/contact/".to_owned(),
            url: "https://example.com/contact/".to_owned(),
            retrieved_at: "2024-01-01T00:00:00Z".to_owned(),
            html_path: "pages/contact/index.html".to_owned(),
            before_path: None,
            after_path: Some("pages/contact/after.html".to_owned()),
            header_path: "headers/aaa.html".to_owned(),
            footer_path: "footers/bbb.html".to_owned(),
            title: "Contact".to_owned(),
            description: String::new(),
            body_class: "woocommerce-no-js page-template".to_owned(),
            head_tags: vec![
                HeadTag::Style {
                    css: " .a{} ".to_owned(),
                    id: None,
                    media: None,
                    kind: None,
                },
                link("/wp-content/themes/x/style.css?ver=1"),
            ],
        };

        let mut compiler = Compiler::new(&wp_dir, &marketing_dir);
        let page = compiler.compile_entry(&entry)?;
        let again = compiler.compile_entry(&entry)?;

        assert_eq!(page.header.as_deref(), Some("partials/headers/aaa.html"));
        assert_eq!(page.footer.as_deref(), Some("partials/footers/bbb.html"));
        assert!(marketing_dir.join("partials/headers/aaa.html").is_file());
        assert_eq!(page, again);

        assert_eq!(page.body_class, "woocommerce-js page-template");
        assert_eq!(page.css, vec!["/wp-content/themes/x/style.css"]);
        assert_eq!(page.hubspot_forms.len(), 1);
        assert_eq!(page.hubspot_meetings.len(), 1);
        assert_eq!(
            page.scripts
                .iter()
                .map(|s| s.src.as_deref().unwrap_or(""))
                .collect::<Vec<_>>(),
            vec!["//js.hsforms.net/forms/embed/v2.js"]
        );
        assert!(!page.html.contains("<script"));
        assert!(page.html.contains("meetings-iframe-container"));
        assert_eq!(compiler.inline_css(), ".a{}\n\n");
        Ok(())
    }
}
