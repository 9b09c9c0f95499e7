use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use feed_core::{CardTypeConfig, InventorySize};
use parking_lot::RwLock;

/// Content listing for card types. Implementations must be safe to share
/// between concurrent requests.
pub trait Inventory: Send + Sync {
    /// File names of `ctype`, newest first. `hidden` lists the hidden pool.
    fn list(&self, ctype: &CardTypeConfig, hidden: bool) -> Arc<Vec<String>>;

    fn size(&self, ctype: &CardTypeConfig) -> InventorySize {
        InventorySize::new(self.list(ctype, false).len(), self.list(ctype, true).len())
    }
}

/// Directory listings shared across requests.
///
/// Two requests that miss at once both list the directory and the later
/// insert wins; both listings are equivalent.
#[derive(Debug, Default)]
pub struct InventoryCache {
    entries: RwLock<HashMap<String, Arc<Vec<String>>>>,
}

impl InventoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<String>>> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, listing: Vec<String>) -> Arc<Vec<String>> {
        let listing = Arc::new(listing);
        self.entries.write().insert(key.into(), Arc::clone(&listing));
        listing
    }

    /// Drops every listing so the next request re-reads the directories.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Lists card files under `<root>/<directory>` and `<root>/<directory>/hidden`.
#[derive(Debug, Clone)]
pub struct DirInventory {
    root: PathBuf,
    cache: Arc<InventoryCache>,
    now: Option<i64>,
}

impl DirInventory {
    pub fn new(root: impl Into<PathBuf>, cache: Arc<InventoryCache>) -> Self {
        Self {
            root: root.into(),
            cache,
            now: None,
        }
    }

    /// Fixes the clock used to drop future-dated files.
    pub fn with_now(mut self, unix_seconds: i64) -> Self {
        self.now = Some(unix_seconds);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| chrono::Utc::now().timestamp())
    }

    fn read_listing(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.contains("placeholder") {
                continue;
            }
            names.push(name);
        }
        names.sort_by(|a, b| newest_first(a, b));

        let now = self.now();
        names.retain(|name| match timestamp_name(name) {
            Some(ts) => ts <= now,
            None => true,
        });
        Ok(names)
    }
}

impl Inventory for DirInventory {
    fn list(&self, ctype: &CardTypeConfig, hidden: bool) -> Arc<Vec<String>> {
        let key = if hidden {
            format!("{}/hidden", ctype.name)
        } else {
            ctype.name.clone()
        };
        if let Some(listing) = self.cache.get(&key) {
            return listing;
        }

        let mut dir = self.root.join(ctype.directory());
        if hidden {
            dir.push("hidden");
            if !dir.is_dir() {
                // Hidden pools are optional.
                return self.cache.insert(key, Vec::new());
            }
        }
        match self.read_listing(&dir) {
            Ok(listing) => {
                engine_debug!("listed {} file(s) for {key}", listing.len());
                self.cache.insert(key, listing)
            }
            Err(err) => {
                engine_warn!("cannot list {}: {err}", dir.display());
                Arc::new(Vec::new())
            }
        }
    }
}

/// All-digit names read as Unix timestamps.
pub(crate) fn timestamp_name(name: &str) -> Option<i64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Newest first: numeric names descending, ahead of other names in
/// reverse lexical order.
pub(crate) fn newest_first(a: &str, b: &str) -> Ordering {
    let key = |name: &str| (name.parse::<u64>().ok(), name.to_string());
    key(b).cmp(&key(a))
}
