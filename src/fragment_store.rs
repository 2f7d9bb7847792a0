use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::Digest as _;

/// Hex characters of the SHA-256 digest used as a fragment key.
const HASH_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Header,
    Footer,
}

impl FragmentKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            FragmentKind::Header => "headers",
            FragmentKind::Footer => "footers",
        }
    }
}

pub fn content_hash(html: &str) -> String {
    let digest = sha2::Sha256::digest(html.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Content-addressed storage for header/footer fragments shared between
/// pages. A fragment is written the first time its hash is seen in a run.
#[derive(Debug)]
pub struct FragmentStore {
    root: PathBuf,
    seen: HashSet<(FragmentKind, String)>,
}

impl FragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seen: HashSet::new(),
        }
    }

    /// Stores `html` and returns its path relative to the store root.
    pub fn store(&mut self, kind: FragmentKind, html: &str) -> anyhow::Result<String> {
        let hash = content_hash(html);
        let rel = format!("{}/{hash}.html", kind.dir_name());

        if self.seen.insert((kind, hash)) {
            let path = self.root.join(&rel);
            crate::layout::write_text(&path, html)
                .with_context(|| format!("write {} fragment", kind.dir_name()))?;
            tracing::debug!(fragment = %rel, "stored fragment");
        }

        Ok(rel)
    }

    pub fn unique_count(&self, kind: FragmentKind) -> usize {
        self.seen.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_twelve_hex_chars() {
        let hash = content_hash("<header>H</header>");
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash("<header>H</header>"));
        assert_ne!(hash, content_hash("<header>G</header>"));
    }

    #[test]
    fn identical_fragments_share_one_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let mut store = FragmentStore::new(temp.path());

        let a = store.store(FragmentKind::Header, "<header>H</header>")?;
        let b = store.store(FragmentKind::Header, "<header>H</header>")?;
        let c = store.store(FragmentKind::Footer, "<header>H</header>")?;

        assert_eq!(a, b);
        assert!(a.starts_with("headers/"));
        assert!(c.starts_with("footers/"));
        assert_eq!(store.unique_count(FragmentKind::Header), 1);
        assert_eq!(std::fs::read_dir(temp.path().join("headers"))?.count(), 1);
        assert!(store.root().join(&c).is_file());
        Ok(())
    }
}
