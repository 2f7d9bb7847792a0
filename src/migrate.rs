//! Moves every legacy `/wp-content/` reference into the `/marketing/assets/`
//! namespace.
//!
//! The run is two passes over the same corpus. The scan pass builds the
//! rewrite map (and follows `url()` references through stylesheets); the
//! rewrite pass replaces occurrences using that map, extending it if it
//! meets something new. The map is memoized, so one legacy path always
//! rewrites to one target path. Afterwards the referenced stylesheets are
//! combined into one bundle and every mapped asset is copied from the first
//! source root that has it.

use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use indexmap::{IndexMap, IndexSet};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::cli::MigrateArgs;
use crate::layout::read_or_empty;

pub const LEGACY_PREFIX: &str = "/wp-content/";
pub const TARGET_PREFIX: &str = "/marketing/assets/";

const MISSING_DISPLAY_LIMIT: usize = 20;

static LEGACY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i:https?:)?(?://[A-Za-z0-9.-]+(?::[0-9]+)?)?/wp-content/[^\s"'()<>\\&]+"#)
        .expect("LEGACY_URL regex")
});

// Same reference inside a JSON-escaped string (`\/wp-content\/...`), as
// found in Elementor `data-settings` attributes.
static ESCAPED_LEGACY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i:https?:)?(?:\\/\\/[A-Za-z0-9.-]+(?::[0-9]+)?)?\\/wp-content\\/(?:[^\s"'()<>\\&]|\\/)+"#,
    )
    .expect("ESCAPED_LEGACY_URL regex")
});

pub fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let content_dir = PathBuf::from(&args.content_dir);
    let public_dir = PathBuf::from(&args.public_dir);
    let roots = SourceRoots::new(vec![public_dir.clone(), PathBuf::from(&args.archive_root)]);
    let mut ctx = MigrationContext::new(roots);

    let pages_path = crate::layout::pages_document_path(&content_dir);
    let mut pages = read_json(&pages_path).context("load pages document")?;
    let content_files = load_content_files(&content_dir)?;
    let partials = load_partials(&crate::layout::partials_dir(&content_dir))?;
    let inline_css_path = crate::layout::inline_css_path(&public_dir);
    let inline_css = read_or_empty(&inline_css_path);

    for base in crate::rules::BASE_STYLESHEETS {
        ctx.add_stylesheet(base);
    }
    for href in page_stylesheets(&pages) {
        ctx.add_stylesheet(&href);
    }

    ctx.scan_json(&pages);
    for (_, value) in &content_files {
        ctx.scan_json(value);
    }
    for (_, html) in &partials {
        ctx.scan_text(html);
    }
    ctx.scan_css(&inline_css, "/");
    let stylesheets = ctx.stylesheets().iter().cloned().collect::<Vec<_>>();
    for stylesheet in &stylesheets {
        ctx.scan_stylesheet(stylesheet);
    }
    tracing::info!(
        assets = ctx.rewrites().len(),
        stylesheets = stylesheets.len(),
        "migrate: scan done"
    );

    let mut report = MigrationReport::default();
    if ctx.rewrite_json(&mut pages) {
        write_json(&pages_path, &pages).context("write pages document")?;
        report.rewritten_files += 1;
    }
    for (path, mut value) in content_files {
        if ctx.rewrite_json(&mut value) {
            write_json(&path, &value)
                .with_context(|| format!("write content file: {}", path.display()))?;
            report.rewritten_files += 1;
        }
    }
    for (path, html) in partials {
        let rewritten = ctx.rewrite_text(&html);
        if rewritten != html {
            crate::layout::write_text(&path, &rewritten).context("write partial")?;
            report.rewritten_files += 1;
        }
    }
    let rewritten_inline = ctx.rewrite_css(&inline_css, "/");
    if rewritten_inline != inline_css {
        crate::layout::write_text(&inline_css_path, &rewritten_inline)
            .context("write inline css")?;
        report.rewritten_files += 1;
    }

    let bundle = ctx.combine_stylesheets();
    let bundle_path = crate::layout::bundle_css_path(&public_dir);
    crate::layout::write_text(&bundle_path, &bundle).context("write css bundle")?;

    let copied = ctx.copy_assets(&public_dir)?;
    report.copied = copied.copied;
    report.missing = copied.missing;
    report.log();
    Ok(())
}

/// Directories searched for legacy files, first match wins.
#[derive(Debug, Clone)]
pub struct SourceRoots {
    roots: Vec<PathBuf>,
}

impl SourceRoots {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Finds the file for a legacy path such as `/wp-content/a.png`.
    pub fn locate(&self, legacy_path: &str) -> Option<PathBuf> {
        let rel = relative_fs_path(legacy_path);
        if rel.is_empty() {
            return None;
        }
        self.roots
            .iter()
            .map(|root| root.join(&rel))
            .find(|candidate| candidate.is_file())
    }
}

/// Canonical legacy path of a reference plus its query/fragment suffix.
/// Returns `None` for anything outside `/wp-content/`, including paths
/// already moved under `/marketing/`.
pub fn split_legacy(raw: &str) -> Option<(String, String)> {
    legacy_parts(&crate::css::resolve("/", raw)?)
}

fn legacy_parts(url: &Url) -> Option<(String, String)> {
    let (path, suffix) = crate::css::split_suffix(url);
    if !path.starts_with(LEGACY_PREFIX) || path.len() == LEGACY_PREFIX.len() {
        return None;
    }
    Some((path, suffix))
}

/// Filesystem form of a site path: percent-escapes decoded, no leading `/`.
fn relative_fs_path(site_path: &str) -> String {
    percent_decode_str(site_path.trim_start_matches('/'))
        .decode_utf8_lossy()
        .into_owned()
}

/// `/wp-content/X` → `/marketing/assets/X`.
pub fn target_path(legacy_path: &str) -> String {
    let rest = legacy_path
        .strip_prefix(LEGACY_PREFIX)
        .unwrap_or(legacy_path.trim_start_matches('/'));
    format!("{TARGET_PREFIX}{rest}")
}

/// Legacy source of a page stylesheet, accepting hrefs a previous run
/// already rewrote.
pub fn stylesheet_source(href: &str) -> Option<String> {
    if let Some((path, _)) = split_legacy(href) {
        return Some(path);
    }
    let path = crate::compile::strip_query(href);
    let rest = path.strip_prefix(TARGET_PREFIX)?;
    split_legacy(&format!("{LEGACY_PREFIX}{rest}")).map(|(path, _)| path)
}

fn is_stylesheet(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".css")
}

#[derive(Debug, Clone)]
struct LegacyRef {
    range: Range<usize>,
    path: String,
    suffix: String,
    escaped: bool,
}

fn legacy_refs(text: &str) -> Vec<LegacyRef> {
    let mut refs = Vec::new();
    for (re, escaped) in [(&*LEGACY_URL, false), (&*ESCAPED_LEGACY_URL, true)] {
        for m in re.find_iter(text) {
            let before = &text[..m.start()];
            if before.ends_with("/marketing/assets") || before.ends_with("\\/marketing\\/assets") {
                continue;
            }
            let raw = if escaped {
                m.as_str().replace("\\/", "/")
            } else {
                m.as_str().to_owned()
            };
            if let Some((path, suffix)) = split_legacy(&raw) {
                refs.push(LegacyRef {
                    range: m.range(),
                    path,
                    suffix,
                    escaped,
                });
            }
        }
    }
    refs.sort_by_key(|r| r.range.start);
    refs
}

/// Where each step of the copy ended up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub copied: usize,
    pub missing: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub rewritten_files: usize,
    pub copied: usize,
    pub missing: Vec<String>,
}

impl MigrationReport {
    /// Warning lines for missing assets, capped at the display limit.
    pub fn missing_summary(&self) -> Vec<String> {
        if self.missing.is_empty() {
            return Vec::new();
        }
        let mut lines = vec![format!(
            "{} assets not found in any source root",
            self.missing.len()
        )];
        lines.extend(
            self.missing
                .iter()
                .take(MISSING_DISPLAY_LIMIT)
                .map(|path| format!("  {path}")),
        );
        if self.missing.len() > MISSING_DISPLAY_LIMIT {
            lines.push(format!(
                "  ...and {} more",
                self.missing.len() - MISSING_DISPLAY_LIMIT
            ));
        }
        lines
    }

    pub fn log(&self) {
        tracing::info!(
            rewritten_files = self.rewritten_files,
            copied = self.copied,
            missing = self.missing.len(),
            "migrate: done"
        );
        for line in self.missing_summary() {
            tracing::warn!("{line}");
        }
    }
}

/// Shared state of one migration run.
#[derive(Debug)]
pub struct MigrationContext {
    roots: SourceRoots,
    rewrites: IndexMap<String, String>,
    stylesheets: IndexSet<String>,
    scanned_stylesheets: HashSet<String>,
}

impl MigrationContext {
    pub fn new(roots: SourceRoots) -> Self {
        Self {
            roots,
            rewrites: IndexMap::new(),
            stylesheets: IndexSet::new(),
            scanned_stylesheets: HashSet::new(),
        }
    }

    pub fn rewrites(&self) -> &IndexMap<String, String> {
        &self.rewrites
    }

    /// Bundle members in insertion order.
    pub fn stylesheets(&self) -> &IndexSet<String> {
        &self.stylesheets
    }

    /// Maps a legacy path, reusing an earlier mapping if there is one.
    pub fn record(&mut self, legacy_path: &str) -> String {
        if let Some(target) = self.rewrites.get(legacy_path) {
            return target.clone();
        }
        let target = target_path(legacy_path);
        self.rewrites
            .insert(legacy_path.to_owned(), target.clone());
        target
    }

    pub fn add_stylesheet(&mut self, href: &str) {
        match stylesheet_source(href) {
            Some(legacy) => {
                self.stylesheets.insert(legacy);
            }
            None => tracing::debug!(href, "stylesheet outside the legacy namespace; not bundled"),
        }
    }

    pub fn scan_text(&mut self, text: &str) {
        for r in legacy_refs(text) {
            self.record(&r.path);
        }
    }

    pub fn scan_json(&mut self, value: &Value) {
        match value {
            Value::String(text) => self.scan_text(text),
            Value::Array(items) => items.iter().for_each(|item| self.scan_json(item)),
            Value::Object(map) => map.values().for_each(|item| self.scan_json(item)),
            _ => {}
        }
    }

    /// Records a stylesheet and everything its `url()`s reach, following
    /// nested stylesheets. Each stylesheet is read once per run.
    pub fn scan_stylesheet(&mut self, legacy_path: &str) {
        if !self.scanned_stylesheets.insert(legacy_path.to_owned()) {
            return;
        }
        self.record(legacy_path);
        let Some(file) = self.roots.locate(legacy_path) else {
            tracing::debug!(stylesheet = legacy_path, "stylesheet not found; not scanned");
            return;
        };
        let css = read_or_empty(&file);
        self.scan_css(&css, legacy_path);
    }

    /// Scans stylesheet text whose own site path is `site_path`.
    pub fn scan_css(&mut self, css: &str, site_path: &str) {
        for raw in crate::css::urls(css) {
            let Some((legacy, _)) = resolve_css_url(raw, site_path) else {
                continue;
            };
            self.record(&legacy);
            if is_stylesheet(&legacy) {
                self.scan_stylesheet(&legacy);
            }
        }
        self.scan_text(css);
    }

    pub fn rewrite_text(&mut self, text: &str) -> String {
        let refs = legacy_refs(text);
        if refs.is_empty() {
            return text.to_owned();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for r in refs {
            if r.range.start < cursor {
                continue;
            }
            let mut replacement = format!("{}{}", self.record(&r.path), r.suffix);
            if r.escaped {
                replacement = replacement.replace('/', "\\/");
            }
            out.push_str(&text[cursor..r.range.start]);
            out.push_str(&replacement);
            cursor = r.range.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Rewrites every string in `value`; returns whether anything changed.
    pub fn rewrite_json(&mut self, value: &mut Value) -> bool {
        match value {
            Value::String(text) => {
                let rewritten = self.rewrite_text(text);
                if rewritten == *text {
                    return false;
                }
                *text = rewritten;
                true
            }
            Value::Array(items) => items
                .iter_mut()
                .fold(false, |changed, item| self.rewrite_json(item) | changed),
            Value::Object(map) => map
                .values_mut()
                .fold(false, |changed, item| self.rewrite_json(item) | changed),
            _ => false,
        }
    }

    /// Rewrites `url()` references (resolving relative ones against
    /// `site_path`), then any remaining legacy text.
    pub fn rewrite_css(&mut self, css: &str, site_path: &str) -> String {
        let rewritten = crate::css::rewrite_urls(css, |raw| {
            let (legacy, suffix) = resolve_css_url(raw, site_path)?;
            Some(format!("{}{suffix}", self.record(&legacy)))
        });
        self.rewrite_text(&rewritten)
    }

    /// Concatenates the bundle members, each rewritten, in insertion order.
    pub fn combine_stylesheets(&mut self) -> String {
        let stylesheets = self.stylesheets.iter().cloned().collect::<Vec<_>>();
        let mut bundle = String::new();
        for legacy in stylesheets {
            let Some(file) = self.roots.locate(&legacy) else {
                tracing::warn!(stylesheet = %legacy, "stylesheet not found; left out of bundle");
                continue;
            };
            let css = read_or_empty(&file);
            let rewritten = self.rewrite_css(&css, &legacy);
            bundle.push_str(&format!("/* {legacy} */\n"));
            bundle.push_str(rewritten.trim_end());
            bundle.push_str("\n\n");
        }
        bundle
    }

    /// Copies every mapped asset under `public_dir`. Stylesheets are written
    /// with their references rewritten; entries the rewrite adds on the way
    /// are copied too.
    pub fn copy_assets(&mut self, public_dir: &Path) -> anyhow::Result<CopyOutcome> {
        let mut outcome = CopyOutcome::default();
        let mut idx = 0usize;
        while let Some((legacy, target)) = self
            .rewrites
            .get_index(idx)
            .map(|(legacy, target)| (legacy.clone(), target.clone()))
        {
            idx += 1;
            let Some(source) = self.roots.locate(&legacy) else {
                outcome.missing.push(legacy);
                continue;
            };

            let dest = public_dir.join(relative_fs_path(&target));
            if is_stylesheet(&legacy) {
                let css = read_or_empty(&source);
                let rewritten = self.rewrite_css(&css, &legacy);
                crate::layout::write_text(&dest, &rewritten).context("write stylesheet asset")?;
            } else {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create asset dir: {}", parent.display()))?;
                }
                std::fs::copy(&source, &dest).with_context(|| {
                    format!("copy asset: {} -> {}", source.display(), dest.display())
                })?;
            }
            tracing::debug!(from = %legacy, to = %target, "copied asset");
            outcome.copied += 1;
        }
        Ok(outcome)
    }
}

fn resolve_css_url(raw: &str, site_path: &str) -> Option<(String, String)> {
    if !crate::css::is_file_reference(raw) {
        return None;
    }
    legacy_parts(&crate::css::resolve(site_path, raw)?)
}

fn page_stylesheets(pages: &Value) -> Vec<String> {
    let Some(pages) = pages.as_object() else {
        return Vec::new();
    };
    pages
        .values()
        .filter_map(|page| page.get("css").and_then(Value::as_array))
        .flatten()
        .filter_map(|href| href.as_str().map(str::to_owned))
        .collect()
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read json: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse json: {}", path.display()))
}

fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json")?;
    crate::layout::write_text(path, &json)
}

/// Legacy JSON content files: every `*.json` directly under the content dir.
fn load_content_files(content_dir: &Path) -> anyhow::Result<Vec<(PathBuf, Value)>> {
    let entries = match std::fs::read_dir(content_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("read content dir: {}", content_dir.display()));
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.context("read content dir entry")?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let value = read_json(&path)?;
            Ok((path, value))
        })
        .collect()
}

fn load_partials(partials_dir: &Path) -> anyhow::Result<Vec<(PathBuf, String)>> {
    if !partials_dir.exists() {
        return Ok(Vec::new());
    }
    let mut partials = Vec::new();
    for entry in walkdir::WalkDir::new(partials_dir).sort_by_file_name() {
        let entry = entry.context("walk partials dir")?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|e| e.to_str()) == Some("html")
        {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("read partial: {}", path.display()))?;
            partials.push((path.to_path_buf(), html));
        }
    }
    Ok(partials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roots: &[&Path]) -> MigrationContext {
        MigrationContext::new(SourceRoots::new(
            roots.iter().map(|r| r.to_path_buf()).collect(),
        ))
    }

    #[test]
    fn split_legacy_normalizes_hosts_and_suffixes() {
        assert_eq!(
            split_legacy("https://cdn.example.com/wp-content/uploads/a.png?v=1"),
            Some(("/wp-content/uploads/a.png".to_owned(), "?v=1".to_owned()))
        );
        assert_eq!(
            split_legacy("//example.com/wp-content/themes/x/../y/a.css"),
            Some(("/wp-content/themes/y/a.css".to_owned(), String::new()))
        );
        assert_eq!(split_legacy("/marketing/assets/uploads/a.png"), None);
        assert_eq!(split_legacy("/wp-includes/js/a.js"), None);
    }

    #[test]
    fn rewrite_text_maps_every_form() {
        let mut ctx = context(&[]);
        let html = r#"<img src="https://example.com/wp-content/uploads/a.png" srcset="/wp-content/uploads/a-300.png 300w, //example.com/wp-content/uploads/a.png 600w"><div data-settings="{&quot;bg&quot;:&quot;https:\/\/example.com\/wp-content\/uploads\/b.jpg&quot;}"></div>"#;
        let out = ctx.rewrite_text(html);
        assert_eq!(
            out,
            r#"<img src="/marketing/assets/uploads/a.png" srcset="/marketing/assets/uploads/a-300.png 300w, /marketing/assets/uploads/a.png 600w"><div data-settings="{&quot;bg&quot;:&quot;\/marketing\/assets\/uploads\/b.jpg&quot;}"></div>"#
        );
        assert_eq!(ctx.rewrites().len(), 3);
        assert_eq!(ctx.rewrite_text(&out), out);
    }

    #[test]
    fn scheme_matching_ignores_case() {
        let mut ctx = context(&[]);
        assert_eq!(
            ctx.rewrite_text("HTTPS://example.com/wp-content/uploads/a.png"),
            "/marketing/assets/uploads/a.png"
        );
        assert_eq!(
            ctx.rewrite_text(r"Http:\/\/example.com\/wp-content\/uploads\/b.png"),
            r"\/marketing\/assets\/uploads\/b.png"
        );
    }

    #[test]
    fn query_only_css_reference_points_at_its_stylesheet() {
        let mut ctx = context(&[]);
        let css = ctx.rewrite_css("a{src:url(?v=1)}", "/wp-content/themes/x/fonts.css");
        assert_eq!(css, "a{src:url(/marketing/assets/themes/x/fonts.css?v=1)}");
        assert_eq!(
            ctx.rewrites().get("/wp-content/themes/x/fonts.css").map(String::as_str),
            Some("/marketing/assets/themes/x/fonts.css")
        );
    }

    #[test]
    fn missing_summary_caps_listed_paths() {
        let report = MigrationReport {
            rewritten_files: 0,
            copied: 0,
            missing: (0..25).map(|i| format!("/wp-content/uploads/{i}.png")).collect(),
        };
        let lines = report.missing_summary();
        assert_eq!(lines.len(), 22);
        assert_eq!(lines[0], "25 assets not found in any source root");
        assert_eq!(lines[1], "  /wp-content/uploads/0.png");
        assert_eq!(lines[20], "  /wp-content/uploads/19.png");
        assert_eq!(lines[21], "  ...and 5 more");

        let short = MigrationReport {
            rewritten_files: 0,
            copied: 0,
            missing: vec!["/wp-content/a.png".to_owned()],
        };
        assert_eq!(short.missing_summary().len(), 2);
        assert!(MigrationReport::default().missing_summary().is_empty());
    }

    #[test]
    fn html_and_css_references_share_one_mapping() {
        let mut ctx = context(&[]);
        let html = ctx.rewrite_text(r#"<img src="/wp-content/themes/x/img/bg.png">"#);
        let css = ctx.rewrite_css(
            "a{background:url('../img/bg.png')}",
            "/wp-content/themes/x/css/style.css",
        );
        assert_eq!(html, r#"<img src="/marketing/assets/themes/x/img/bg.png">"#);
        assert_eq!(css, "a{background:url('/marketing/assets/themes/x/img/bg.png')}");
        assert_eq!(ctx.rewrites().len(), 1);
    }

    #[test]
    fn already_migrated_paths_pass_through() {
        let mut ctx = context(&[]);
        let text = "/marketing/assets/wp-content/uploads/a.png url(/marketing/assets/b.png)";
        assert_eq!(ctx.rewrite_text(text), text);
        assert_eq!(ctx.rewrite_css(text, "/"), text);
        assert!(ctx.rewrites().is_empty());
    }

    #[test]
    fn rewrite_json_walks_strings() {
        let mut ctx = context(&[]);
        let mut value = serde_json::json!({
            "/": { "css": ["/wp-content/a.css"], "count": 1 },
            "image": "https://example.com/wp-content/uploads/a.png"
        });
        assert!(ctx.rewrite_json(&mut value));
        assert_eq!(value["/"]["css"][0], "/marketing/assets/a.css");
        assert_eq!(value["image"], "/marketing/assets/uploads/a.png");
        assert!(!ctx.rewrite_json(&mut value));
    }

    #[test]
    fn stylesheet_source_accepts_rewritten_hrefs() {
        assert_eq!(
            stylesheet_source("/marketing/assets/themes/x/style.css"),
            Some("/wp-content/themes/x/style.css".to_owned())
        );
        assert_eq!(
            stylesheet_source("https://example.com/wp-content/themes/x/style.css?ver=1"),
            Some("/wp-content/themes/x/style.css".to_owned())
        );
        assert_eq!(stylesheet_source("https://fonts.example.com/css"), None);
    }

    #[test]
    fn scan_follows_nested_stylesheets_and_archive_root() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let public = temp.path().join("public");
        let archive = temp.path().join("archive");
        crate::layout::write_text(
            &public.join("wp-content/themes/x/style.css"),
            "@import url(\"parts/more.css\");\nbody{background:url(img/bg.png)}",
        )?;
        crate::layout::write_text(
            &archive.join("wp-content/themes/x/parts/more.css"),
            "p{background:url(../fonts/a.woff2?v=3)}",
        )?;

        let mut ctx = context(&[&public, &archive]);
        ctx.scan_stylesheet("/wp-content/themes/x/style.css");

        let keys = ctx.rewrites().keys().cloned().collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "/wp-content/themes/x/style.css",
                "/wp-content/themes/x/parts/more.css",
                "/wp-content/themes/x/fonts/a.woff2",
                "/wp-content/themes/x/img/bg.png",
            ]
        );
        Ok(())
    }

    #[test]
    fn copy_reports_every_entry_as_copied_or_missing() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let public = temp.path().join("public");
        let archive = temp.path().join("archive");
        crate::layout::write_text(&public.join("wp-content/uploads/a.png"), "png")?;
        crate::layout::write_text(
            &archive.join("wp-content/themes/x/style.css"),
            "a{background:url(../../uploads/a.png)}",
        )?;

        let mut ctx = context(&[&public, &archive]);
        ctx.scan_text("/wp-content/uploads/a.png /wp-content/uploads/gone.pdf");
        ctx.add_stylesheet("/wp-content/themes/x/style.css?ver=2");
        ctx.scan_stylesheet("/wp-content/themes/x/style.css");

        let outcome = ctx.copy_assets(&public)?;
        assert_eq!(outcome.copied, 2);
        assert_eq!(outcome.missing, vec!["/wp-content/uploads/gone.pdf"]);

        for (legacy, target) in ctx.rewrites() {
            let dest = public.join(target.trim_start_matches('/'));
            assert!(dest.is_file() || outcome.missing.contains(legacy));
        }
        let css = std::fs::read_to_string(public.join("marketing/assets/themes/x/style.css"))?;
        assert_eq!(css, "a{background:url(/marketing/assets/uploads/a.png)}");

        let bundle = ctx.combine_stylesheets();
        assert!(bundle.starts_with("/* /wp-content/themes/x/style.css */\n"));
        assert!(bundle.contains("url(/marketing/assets/uploads/a.png)"));
        Ok(())
    }
}
