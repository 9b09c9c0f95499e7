use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use feed_core::{BodyKind, FeedConfig};
use thiserror::Error;

use crate::inventory::{newest_first, Inventory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest<'a> {
    pub terms: &'a [String],
    /// Card types the results are restricted to; empty means all.
    pub card_filter: &'a [String],
    /// Zero-based page of results.
    pub page: usize,
    pub result_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Matching file names per card type, newest first.
    pub hits: BTreeMap<String, Vec<String>>,
    /// Matches on this page dropped by the card filter.
    pub filtered: usize,
}

impl SearchResults {
    pub fn hits_for(&self, ctype: &str) -> &[String] {
        self.hits.get(ctype).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
}

pub trait SearchIndex: Send + Sync {
    fn search(&self, request: &SearchRequest<'_>) -> Result<SearchResults, SearchError>;
}

/// Scans the text cards of searchable types on every query. Files that
/// cannot be read as text are logged and left out of the results.
pub struct ScanSearch {
    root: PathBuf,
    config: Arc<FeedConfig>,
    inventory: Arc<dyn Inventory>,
}

impl ScanSearch {
    pub fn new(root: impl Into<PathBuf>, config: Arc<FeedConfig>, inventory: Arc<dyn Inventory>) -> Self {
        Self {
            root: root.into(),
            config,
            inventory,
        }
    }

    fn matches(&self, path: &Path, terms: &[String]) -> Result<bool, SearchError> {
        let text = fs::read_to_string(path).map_err(|source| SearchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let text = text.to_lowercase();
        Ok(terms.iter().all(|t| text.contains(t.as_str())))
    }
}

impl SearchIndex for ScanSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<SearchResults, SearchError> {
        let terms: Vec<String> = request.terms.iter().map(|t| t.to_lowercase()).collect();
        let mut candidates: Vec<(String, String)> = Vec::new();

        for ty in &self.config.card_types {
            if self.config.is_pinned(&ty.name) {
                continue;
            }
            // A filter-only query lists every card of the filtered types.
            let scanned = if terms.is_empty() {
                request.card_filter.contains(&ty.name)
            } else {
                ty.searchable && matches!(ty.body, BodyKind::Text | BodyKind::Simple)
            };
            if !scanned {
                continue;
            }
            for file in self.inventory.list(ty, false).iter() {
                if !terms.is_empty() {
                    let path = self.root.join(ty.directory()).join(file);
                    match self.matches(&path, &terms) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(err) => {
                            engine_warn!("search skipped a card: {err}");
                            continue;
                        }
                    }
                }
                candidates.push((ty.name.clone(), file.clone()));
            }
        }
        candidates.sort_by(|(_, a), (_, b)| newest_first(a, b));

        let mut results = SearchResults::default();
        let start = request.page.saturating_mul(request.result_count);
        for (ctype, file) in candidates.into_iter().skip(start).take(request.result_count) {
            if !request.card_filter.is_empty() && !request.card_filter.contains(&ctype) {
                results.filtered += 1;
            } else {
                results.hits.entry(ctype).or_default().push(file);
            }
        }
        engine_debug!(
            "search {:?}: {} hit(s), {} filtered",
            request.terms,
            results.hits.values().map(Vec::len).sum::<usize>(),
            results.filtered
        );
        Ok(results)
    }
}
