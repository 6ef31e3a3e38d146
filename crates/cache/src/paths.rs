//! On-disk layout of a single document's tile cache.
//!
//! Every document URL maps to a stable directory under the configured cache
//! base. The URL is SHA-1 hashed and the hex digest split into a
//! `H[0:1]/H[1:3]/H[3:5]/H[5:]` fan-out so no single directory accumulates
//! every document on the host.

use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Name of the file under the document root holding the last observed
/// document modtime, in integer microseconds since the Unix epoch.
pub const MODTIME_FILE: &str = "modtime.txt";

/// The two storage tiers of a document cache.
///
/// `Persistent` holds tiles consistent with the last saved document state;
/// `Editing` shadows it while the document has unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Persistent,
    Editing,
}

impl Tier {
    fn dir_name(self) -> &'static str {
        match self {
            Tier::Persistent => "persistent",
            Tier::Editing => "editing",
        }
    }
}

/// Resolved paths for one document's cache subtree.
#[derive(Debug, Clone)]
pub struct DocLayout {
    root: PathBuf,
}

impl DocLayout {
    /// Derive the layout for `doc_url` under `cache_base`.
    ///
    /// The mapping is pure: the same URL always resolves to the same root,
    /// and nothing is created on disk here.
    pub fn new(cache_base: &Path, doc_url: &str) -> Self {
        let digest = hex::encode(Sha1::digest(doc_url.as_bytes()));

        let root = cache_base
            .join(&digest[0..1])
            .join(&digest[1..3])
            .join(&digest[3..5])
            .join(&digest[5..]);

        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.root.join(tier.dir_name())
    }

    pub fn modtime_file(&self) -> PathBuf {
        self.root.join(MODTIME_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_stable_for_equal_urls() {
        let a = DocLayout::new(Path::new("/var/cache/inkwave"), "file:///tmp/report.odt");
        let b = DocLayout::new(Path::new("/var/cache/inkwave"), "file:///tmp/report.odt");

        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn distinct_urls_get_distinct_roots() {
        let a = DocLayout::new(Path::new("/var/cache/inkwave"), "file:///tmp/report.odt");
        let b = DocLayout::new(Path::new("/var/cache/inkwave"), "file:///tmp/report2.odt");

        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn root_splits_digest_one_two_two_rest() {
        let layout = DocLayout::new(Path::new("/base"), "file:///tmp/doc.odt");

        let segments: Vec<String> = layout
            .root()
            .strip_prefix("/base")
            .expect("root under base")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].len(), 1);
        assert_eq!(segments[1].len(), 2);
        assert_eq!(segments[2].len(), 2);
        assert_eq!(segments[3].len(), 35);

        let digest = segments.concat();
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tier_dirs_live_under_the_root() {
        let layout = DocLayout::new(Path::new("/base"), "file:///tmp/doc.odt");

        assert_eq!(layout.tier_dir(Tier::Persistent), layout.root().join("persistent"));
        assert_eq!(layout.tier_dir(Tier::Editing), layout.root().join("editing"));
        assert_eq!(layout.modtime_file(), layout.root().join("modtime.txt"));
    }
}
