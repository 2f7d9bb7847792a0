//! Copies per-tab preview images from compiled look pages into the look
//! catalog.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;
use serde_json::Value;

use crate::cli::PreviewsArgs;
use crate::formats::{PagesDocument, Previews};

const TAB_TITLE_CLASS: &str = "e-n-tab-title";

static TAB_BUTTON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<button\b([^>]*)>(.*?)</button\s*>").expect("TAB_BUTTON regex")
});

static TAB_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span\b[^>]*\bclass\s*=\s*["'][^"']*\be-n-tab-title-text\b[^"']*["'][^>]*>(.*?)</span\s*>"#,
    )
    .expect("TAB_LABEL regex")
});

static TAB_CONTENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bid\s*=\s*["'](e-n-tab-content-[^"']+)["']"#).expect("TAB_CONTENT_ID regex")
});

pub fn run(args: PreviewsArgs) -> anyhow::Result<()> {
    let content_dir = PathBuf::from(&args.content_dir);
    let pages_path = crate::layout::pages_document_path(&content_dir);
    let pages_json = std::fs::read_to_string(&pages_path)
        .with_context(|| format!("read pages document: {}", pages_path.display()))?;
    let pages: PagesDocument = serde_json::from_str(&pages_json)
        .with_context(|| format!("parse pages document: {}", pages_path.display()))?;

    let catalog_path = PathBuf::from(&args.catalog);
    let catalog_json = std::fs::read_to_string(&catalog_path)
        .with_context(|| format!("read catalog: {}", catalog_path.display()))?;
    let mut catalog: Value = serde_json::from_str(&catalog_json)
        .with_context(|| format!("parse catalog: {}", catalog_path.display()))?;

    let updated = sync_catalog(&mut catalog, &pages)?;
    if updated == 0 {
        tracing::info!(catalog = %catalog_path.display(), "previews: catalog unchanged");
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&catalog).context("serialize catalog")?;
    crate::layout::write_text(&catalog_path, &json).context("write catalog")?;
    tracing::info!(
        catalog = %catalog_path.display(),
        updated,
        "previews: catalog updated"
    );
    Ok(())
}

/// Fills `previews` on every catalog entry whose look page yields at least
/// one image. Returns how many entries changed.
pub fn sync_catalog(catalog: &mut Value, pages: &PagesDocument) -> anyhow::Result<usize> {
    let Some(entries) = catalog.as_array_mut() else {
        anyhow::bail!("catalog must be a JSON array of looks");
    };

    let mut updated = 0usize;
    for entry in entries {
        let Some(object) = entry.as_object_mut() else {
            continue;
        };
        let Some(slug) = object.get("slug").and_then(Value::as_str) else {
            continue;
        };
        let path = format!("/looks/{slug}/");
        let Some(page) = pages.get(&path) else {
            tracing::debug!(%path, "no compiled page for look");
            continue;
        };

        let previews = extract_previews(&page.html);
        if previews.is_empty() {
            tracing::debug!(%path, "look page has no preview images; entry left as is");
            continue;
        }

        let value = serde_json::to_value(&previews).context("serialize previews")?;
        if object.get("previews") != Some(&value) {
            object.insert("previews".to_owned(), value);
            updated += 1;
        }
    }
    Ok(updated)
}

/// Images of each recognized tab, keyed by the tab's label.
pub fn extract_previews(html: &str) -> Previews {
    let blocks = content_blocks(html);
    let mut previews = Previews::default();

    for caps in TAB_BUTTON.captures_iter(html) {
        let attributes = crate::html::parse_attributes(&caps[1]);
        if !crate::html::has_class(&attributes, TAB_TITLE_CLASS) {
            continue;
        }
        let Some(controls) = crate::html::attribute(&attributes, "aria-controls") else {
            continue;
        };
        let Some(label) = TAB_LABEL.captures(&caps[2]).map(|label| {
            crate::html::decode_entities(&crate::html::strip_tags(&label[1]))
        }) else {
            continue;
        };
        let Some(key) = crate::rules::preview_key(&label) else {
            tracing::debug!(label = label.trim(), "unmapped preview tab");
            continue;
        };
        let (Some(block), Some(slot)) = (blocks.get(controls), previews.slot_mut(key)) else {
            continue;
        };

        for src in crate::html::image_sources(block) {
            if !slot.contains(&src) {
                slot.push(src);
            }
        }
    }
    previews
}

/// Splits `html` on tab content ids; each block runs to the next id.
fn content_blocks(html: &str) -> HashMap<&str, &str> {
    let ids = TAB_CONTENT_ID.captures_iter(html).collect::<Vec<_>>();
    let mut blocks = HashMap::new();
    for (idx, caps) in ids.iter().enumerate() {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = ids
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(html.len(), |next| next.start());
        blocks.entry(id.as_str()).or_insert(&html[whole.end()..end]);
    }
    blocks
}
