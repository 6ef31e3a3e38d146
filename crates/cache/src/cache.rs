//! Two-tier tile cache bound to a single document.
//!
//! Lookups consult the editing overlay first while the document has unsaved
//! changes, then the invalidation ledger, then the persistent store. Saves
//! land in whichever tier the save lifecycle dictates, and a document save
//! promotes the overlay into the persistent store.
//!
//! Filesystem failures never reach the caller: a failed write or removal is
//! logged and the cache degrades to not caching. Callers observe only the
//! presence or absence of tiles.

use crate::config::CacheConfig;
use crate::invalidation::{self, Ledger};
use crate::paths::{DocLayout, Tier};
use crate::tile_name;
use inkwave_doc_model::{TileKey, TileRegion};
use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::UNIX_EPOCH;
use url::Url;

const STATUS_FILE: &str = "status.txt";

/// Per-instance mutable state, guarded by one lock so that ledger updates,
/// the editing flags, and tier contents stay serialized per document.
struct CacheState {
    is_editing: bool,
    has_unsaved_changes: bool,
    ledger: Ledger,
}

impl CacheState {
    /// The tier save operations currently write into.
    fn write_tier(&self) -> Tier {
        if self.has_unsaved_changes {
            Tier::Editing
        } else {
            Tier::Persistent
        }
    }
}

/// On-disk cache of rendered tiles for a single document.
///
/// Two instances bound to the same document URL would race on the same
/// subtree; the host must keep the binding unique.
#[derive(Clone)]
pub struct TileCache {
    layout: DocLayout,
    state: Arc<Mutex<CacheState>>,
}

impl TileCache {
    /// Bind a cache to `doc_url` under the configured cache base.
    ///
    /// For local documents (a `file:` URL or a plain path) the document is
    /// stat'ed and the freshness gate runs; for any other URL the gate is
    /// skipped and previous cache content is reused as-is.
    pub fn new(config: &CacheConfig, doc_url: &str) -> Self {
        Self::with_modtime(config, doc_url, local_modtime(doc_url))
    }

    /// Like [`TileCache::new`], but with the document's modtime supplied by
    /// the host in microseconds since the Unix epoch. `None` skips the
    /// freshness gate.
    pub fn with_modtime(
        config: &CacheConfig,
        doc_url: &str,
        modtime_micros: Option<u64>,
    ) -> Self {
        let cache = Self {
            layout: DocLayout::new(&config.cache_base, doc_url),
            state: Arc::new(Mutex::new(CacheState {
                is_editing: false,
                has_unsaved_changes: false,
                ledger: Ledger::default(),
            })),
        };

        if let Some(modtime) = modtime_micros {
            cache.run_freshness_gate(modtime);
        }

        cache
    }

    /// Root of this document's cache subtree.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Returns a read handle for the tile, or `None` when it is not cached.
    ///
    /// The editing overlay wins while there are unsaved changes; names the
    /// ledger has scheduled for deletion are treated as absent even though
    /// the persistent file still exists.
    pub fn lookup_tile(&self, key: &TileKey) -> Option<File> {
        let name = tile_name::encode(key);
        let state = self.state.lock().unwrap();

        if state.has_unsaved_changes {
            if let Ok(file) = File::open(self.layout.tier_dir(Tier::Editing).join(&name)) {
                return Some(file);
            }
        }

        if state.ledger.hides(&name) {
            return None;
        }

        File::open(self.layout.tier_dir(Tier::Persistent).join(&name)).ok()
    }

    /// Store the rendered bytes for a tile.
    ///
    /// The first save of an editing session flips the cache into its
    /// unsaved-changes mode; from then on writes shadow the persistent tier
    /// until [`TileCache::document_saved`].
    pub fn save_tile(&self, key: &TileKey, data: &[u8]) {
        let mut state = self.state.lock().unwrap();

        if state.is_editing && !state.has_unsaved_changes {
            state.has_unsaved_changes = true;
        }

        let name = tile_name::encode(key);
        let dir = self.layout.tier_dir(state.write_tier());

        if let Err(err) = write_file(&dir, &name, data) {
            warn!("dropping tile {name}: {err}");
        }
    }

    /// The cached document status line, with the trailing newline stripped;
    /// empty when no status has been cached.
    pub fn get_status(&self) -> String {
        let state = self.state.lock().unwrap();

        let mut dir = self.layout.tier_dir(Tier::Persistent);
        if state.has_unsaved_changes {
            let editing = self.layout.tier_dir(Tier::Editing);
            if editing.join(STATUS_FILE).is_file() {
                dir = editing;
            }
        }

        match fs::read_to_string(dir.join(STATUS_FILE)) {
            Ok(mut status) => {
                if status.ends_with('\n') {
                    status.pop();
                }
                status
            }
            Err(_) => String::new(),
        }
    }

    /// Persist a renderer status line (`status: …`) next to the tiles of
    /// the currently written tier.
    pub fn save_status(&self, status: &str) {
        let Some(first) = status.split_whitespace().next() else {
            return;
        };
        debug_assert_eq!(first, "status:");

        let state = self.state.lock().unwrap();
        let dir = self.layout.tier_dir(state.write_tier());

        if let Err(err) = write_file(&dir, STATUS_FILE, format!("{status}\n").as_bytes()) {
            warn!("dropping status line: {err}");
        }
    }

    /// Enter or leave editing mode. Unsaved changes are only accrued while
    /// editing; leaving the mode does not discard them.
    pub fn set_editing(&self, editing: bool) {
        let mut state = self.state.lock().unwrap();
        state.is_editing = editing;
    }

    /// Drop every cached tile intersecting `region`.
    ///
    /// Editing-tier tiles are removed immediately. Persistent-tier tiles
    /// are recorded in the ledger and kept on disk until the next
    /// [`TileCache::document_saved`], hidden from lookups in the meantime.
    pub fn invalidate_tiles(&self, region: &TileRegion) {
        let mut state = self.state.lock().unwrap();

        let editing = self.layout.tier_dir(Tier::Editing);
        for name in tile_names_in(&editing) {
            if tile_name::intersects(&name, region) {
                remove_existing(&editing.join(&name));
            }
        }

        let persistent = self.layout.tier_dir(Tier::Persistent);
        for name in tile_names_in(&persistent) {
            if !state.ledger.hides(&name) && tile_name::intersects(&name, region) {
                state.ledger.schedule(name);
            }
        }
    }

    /// Apply an `invalidatetiles:` protocol line against `part`, the
    /// session's current document part. Malformed lines are ignored.
    pub fn invalidate_command(&self, part: i32, msg: &str) {
        if let Some(region) = invalidation::parse_command(part, msg) {
            self.invalidate_tiles(&region);
        }
    }

    /// Complete a document save.
    ///
    /// Deletes the persistent tiles the ledger scheduled, promotes every
    /// file of the editing overlay into the persistent tier (overwriting on
    /// collision), and clears the unsaved-changes state.
    pub fn document_saved(&self) {
        let mut state = self.state.lock().unwrap();
        let persistent = self.layout.tier_dir(Tier::Persistent);

        // invalidated tiles go first, before the overlay moves in
        for name in state.ledger.take() {
            remove_existing(&persistent.join(name));
        }

        let editing = self.layout.tier_dir(Tier::Editing);
        if let Ok(entries) = fs::read_dir(&editing) {
            match fs::create_dir_all(&persistent) {
                Ok(()) => {
                    for entry in entries.flatten() {
                        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                            continue;
                        }
                        let target = persistent.join(entry.file_name());
                        if let Err(err) = fs::rename(entry.path(), &target) {
                            warn!("could not promote {}: {err}", entry.path().display());
                        }
                    }
                }
                Err(err) => warn!("could not open persistent tier: {err}"),
            }
        }

        state.has_unsaved_changes = false;
    }

    /// Reconcile the on-disk cache with the document's current modtime.
    ///
    /// A matching modtime keeps the persistent tier and clears the editing
    /// overlay a previous session left behind; a mismatch (or a missing
    /// record) wipes the whole root. The observed modtime is recorded
    /// afterwards either way.
    fn run_freshness_gate(&self, modtime_micros: u64) {
        let root = self.layout.root();

        if root.is_dir() {
            if self.stored_modtime() == Some(modtime_micros) {
                let editing = self.layout.tier_dir(Tier::Editing);
                if editing.is_dir() {
                    if let Err(err) = fs::remove_dir_all(&editing) {
                        warn!("could not clear editing tier {}: {err}", editing.display());
                    }
                }
            } else {
                debug!("document changed externally, wiping {}", root.display());
                if let Err(err) = fs::remove_dir_all(root) {
                    warn!("could not wipe stale cache {}: {err}", root.display());
                }
            }
        }

        if let Err(err) = fs::create_dir_all(root) {
            warn!("could not create cache root {}: {err}", root.display());
            return;
        }

        if let Err(err) = fs::write(self.layout.modtime_file(), format!("{modtime_micros}\n")) {
            warn!("could not record modtime under {}: {err}", root.display());
        }
    }

    fn stored_modtime(&self) -> Option<u64> {
        let contents = fs::read_to_string(self.layout.modtime_file()).ok()?;
        contents.trim().parse().ok()
    }
}

/// Modtime of a local document in microseconds since the Unix epoch.
/// Non-file URLs and missing documents yield `None`.
fn local_modtime(doc_url: &str) -> Option<u64> {
    let path = match Url::parse(doc_url) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok()?,
        Ok(_) => return None,
        // not URL syntax; take it as a plain filesystem path
        Err(_) => PathBuf::from(doc_url),
    };

    let meta = fs::metadata(&path).ok()?;
    if !meta.is_file() {
        return None;
    }

    let modified = meta.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_micros() as u64)
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), data)
}

/// Remove a file, tolerating that it is already gone.
fn remove_existing(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("could not remove {}: {err}", path.display());
        }
    }
}

/// Names of the regular files in `dir`; a missing directory is empty.
fn tile_names_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if !entry.file_type().ok()?.is_file() {
                return None;
            }
            entry.file_name().into_string().ok()
        })
        .collect()
}
