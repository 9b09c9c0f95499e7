use std::collections::HashMap;

use crate::config::{CardTypeConfig, FeedConfig};
use crate::seed::Seed;
use crate::shuffle::ShuffleOrdering;

/// Sizes of a type's main inventory and hidden pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventorySize {
    pub main: usize,
    pub hidden: usize,
}

impl InventorySize {
    pub fn new(main: usize, hidden: usize) -> Self {
        Self { main, hidden }
    }
}

/// Per-request view of a configured card type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTypeDescriptor {
    pub name: String,
    pub prefix: char,
    pub quota: usize,
    pub spacing: usize,
    pub randomize: bool,
    pub searchable: bool,
    pub inventory_size: usize,
    pub hidden_size: usize,
    /// Slots that must separate two occurrences of one inventory item.
    pub window: usize,
}

impl CardTypeDescriptor {
    pub fn new(config: &CardTypeConfig, size: InventorySize) -> Self {
        Self {
            name: config.name.clone(),
            prefix: config.prefix(),
            quota: config.quota,
            spacing: config.spacing,
            randomize: config.randomize,
            searchable: config.searchable,
            inventory_size: size.main,
            hidden_size: size.hidden,
            window: anti_repeat_window(size.main, config.quota),
        }
    }
}

/// `2 × inventory / quota`, capped at the inventory size.
pub fn anti_repeat_window(inventory: usize, quota: usize) -> usize {
    if quota == 0 {
        0
    } else {
        (2 * inventory / quota).min(inventory)
    }
}

/// Pages the common type can fill before it runs out.
pub fn reachable_pages(common_inventory: usize, common_quota: usize) -> usize {
    if common_quota == 0 {
        0
    } else {
        common_inventory.div_ceil(common_quota)
    }
}

/// Pages a shuffle ordering must span: every page the common type reaches,
/// and at least up to the page being rendered. The result only depends on
/// `page` past the end of the feed, so every reachable page sees one ordering.
pub fn virtual_pages(common_inventory: usize, common_quota: usize, page: usize) -> usize {
    reachable_pages(common_inventory, common_quota).max(page.saturating_add(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub descriptor: CardTypeDescriptor,
    /// Empty for types that are not randomized.
    pub ordering: ShuffleOrdering,
}

/// Every configured card type for one request, keyed by name.
#[derive(Debug, Clone)]
pub struct Deck {
    entries: Vec<DeckEntry>,
    index: HashMap<String, usize>,
    common: String,
    pinned: Option<String>,
    /// Highest page counter worth rendering; later pages are past the end.
    page_limit: usize,
}

impl Deck {
    /// `page` is clamped to [`Deck::page_limit`], so orderings never grow
    /// past what the common inventory can fill.
    pub fn build(
        config: &FeedConfig,
        seed: &Seed,
        page: usize,
        sizes: impl Fn(&CardTypeConfig) -> InventorySize,
    ) -> Self {
        let descriptors: Vec<CardTypeDescriptor> = config
            .card_types
            .iter()
            .map(|ty| CardTypeDescriptor::new(ty, sizes(ty)))
            .collect();

        let common = descriptors
            .iter()
            .find(|d| config.is_common(&d.name))
            .map(|d| (d.inventory_size, d.quota))
            .unwrap_or((0, 0));
        let page_limit = reachable_pages(common.0, common.1).max(1);
        let pages = virtual_pages(common.0, common.1, page.min(page_limit));

        let entries: Vec<DeckEntry> = descriptors
            .into_iter()
            .map(|descriptor| {
                let ordering = if descriptor.randomize {
                    ShuffleOrdering::generate(seed, &descriptor, descriptor.quota * pages)
                } else {
                    ShuffleOrdering::default()
                };
                DeckEntry {
                    descriptor,
                    ordering,
                }
            })
            .collect();

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.descriptor.name.clone(), i))
            .collect();

        Self {
            entries,
            index,
            common: config.common_type.clone(),
            pinned: config.pinned_type.clone(),
            page_limit,
        }
    }

    /// Page counter past which the common type has nothing left. At least 1,
    /// so a feed with an empty common type can still show one page.
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    pub fn clamp_page(&self, page: usize) -> usize {
        page.min(self.page_limit)
    }

    pub fn get(&self, name: &str) -> Option<&DeckEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Entries in configuration order.
    pub fn entries(&self) -> &[DeckEntry] {
        &self.entries
    }

    pub fn common(&self) -> Option<&DeckEntry> {
        self.get(&self.common)
    }

    pub fn common_name(&self) -> &str {
        &self.common
    }

    pub fn is_common(&self, name: &str) -> bool {
        self.common == name
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.as_deref() == Some(name)
    }

    pub fn spacing(&self, name: &str) -> usize {
        self.get(name).map(|e| e.descriptor.spacing).unwrap_or(0)
    }
}
