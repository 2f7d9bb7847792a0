//! Where each pipeline artifact lives, and the small file helpers every
//! stage shares.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub fn wp_dir(content_dir: &Path) -> PathBuf {
    content_dir.join("wp")
}

pub fn manifest_path(content_dir: &Path) -> PathBuf {
    wp_dir(content_dir).join("manifest.json")
}

pub fn marketing_dir(content_dir: &Path) -> PathBuf {
    content_dir.join("marketing")
}

pub fn pages_document_path(content_dir: &Path) -> PathBuf {
    marketing_dir(content_dir).join("pages.json")
}

pub fn partials_dir(content_dir: &Path) -> PathBuf {
    marketing_dir(content_dir).join("partials")
}

pub fn public_marketing_dir(public_dir: &Path) -> PathBuf {
    public_dir.join("marketing")
}

pub fn inline_css_path(public_dir: &Path) -> PathBuf {
    public_marketing_dir(public_dir).join("inline.css")
}

pub fn bundle_css_path(public_dir: &Path) -> PathBuf {
    public_marketing_dir(public_dir).join("marketing.css")
}

/// Normalizes a URL path to the trailing-slash form used as the page key.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    if segments.is_empty() {
        return "/".to_owned();
    }
    format!("/{}/", segments.join("/"))
}

/// Directory (relative to the `wp` snapshot) holding one page's fragments.
pub fn page_dir_rel(path: &str) -> anyhow::Result<String> {
    let mut rel = String::from("pages");
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            anyhow::bail!("page path must not contain '..': {path}");
        }
        rel.push('/');
        rel.push_str(segment);
    }
    Ok(rel)
}

/// Writes `contents`, creating parent directories first.
pub fn write_text(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write: {}", path.display()))?;
    Ok(())
}

/// Reads a text file; any failure (usually an absent optional fragment)
/// yields an empty string.
pub fn read_or_empty(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "read failed; using empty string");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_always_has_trailing_slash() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/about"), "/about/");
        assert_eq!(normalize_path("/looks/blue//"), "/looks/blue/");
        assert_eq!(normalize_path("/a/b?x=1#top"), "/a/b/");
    }

    #[test]
    fn page_dir_rel_nests_segments() -> anyhow::Result<()> {
        assert_eq!(page_dir_rel("/")?, "pages");
        assert_eq!(page_dir_rel("/looks/blue/")?, "pages/looks/blue");
        assert!(page_dir_rel("/a/../b/").is_err());
        Ok(())
    }

    #[test]
    fn read_or_empty_swallows_missing_files() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        assert_eq!(read_or_empty(&temp.path().join("missing.html")), "");

        let path = temp.path().join("nested").join("a.html");
        write_text(&path, "<p>a</p>")?;
        assert_eq!(read_or_empty(&path), "<p>a</p>");
        Ok(())
    }
}
