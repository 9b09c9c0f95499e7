use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn, set_request_id};
use feed_core::{
    distribute, next_state, truncate_token, Card, Deck, FeedConfig, Heading, Page, PageMode,
    PageState, PageView, PlacementReport, ResolvedTheme, Seed, ThemeSet, TokenCodec,
};
use rand::Rng;

use crate::auth::{AuthGate, OpenGate, RequestEnv};
use crate::inventory::{DirInventory, Inventory, InventoryCache};
use crate::loader::{CardLoader, LoadError};
use crate::search::{ScanSearch, SearchIndex, SearchRequest, SearchResults};

/// Cards between the scrollstone and the end of a page.
const SCROLLSTONE_LEAD: usize = 7;

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub mode: PageMode,
    /// Full card list: placeholders for earlier pages, then this response.
    pub page: Page,
    /// State the page was rendered from, after reshuffling.
    pub state: PageState,
    pub next_state: PageState,
    pub next_token: String,
    pub theme: Option<ResolvedTheme>,
    pub headers: Vec<(String, String)>,
    pub report: PlacementReport,
}

impl RenderedPage {
    pub fn view(&self) -> PageView {
        PageView::new(self.mode, &self.page, self.next_token.clone(), self.theme.clone())
    }
}

#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Page(Box<RenderedPage>),
    Unauthorized { headers: Vec<(String, String)> },
}

/// Renders pages for tokens. Holds no per-feed state; everything a page
/// needs comes from the token and the content directory.
pub struct FeedEngine {
    config: Arc<FeedConfig>,
    root: PathBuf,
    inventory: Arc<dyn Inventory>,
    search: Arc<dyn SearchIndex>,
    auth: Arc<dyn AuthGate>,
    requests: AtomicU64,
}

impl FeedEngine {
    /// Engine over the directory tree at `root`, with a fresh listing cache,
    /// a scanning search and no authentication.
    pub fn new(config: FeedConfig, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = Arc::new(config);
        let inventory: Arc<dyn Inventory> = Arc::new(DirInventory::new(
            root.clone(),
            Arc::new(InventoryCache::new()),
        ));
        let search = Arc::new(ScanSearch::new(
            root.clone(),
            Arc::clone(&config),
            Arc::clone(&inventory),
        ));
        Self {
            config,
            root,
            inventory,
            search,
            auth: Arc::new(OpenGate),
            requests: AtomicU64::new(0),
        }
    }

    /// Replaces the inventory; the default search is rebuilt over it.
    pub fn with_inventory(mut self, inventory: Arc<dyn Inventory>) -> Self {
        self.search = Arc::new(ScanSearch::new(
            self.root.clone(),
            Arc::clone(&self.config),
            Arc::clone(&inventory),
        ));
        self.inventory = inventory;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchIndex>) -> Self {
        self.search = search;
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthGate>) -> Self {
        self.auth = auth;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn render(&self, token: &str, env: &RequestEnv) -> RenderOutcome {
        self.render_with(token, env, &mut rand::thread_rng())
    }

    /// Like [`render`](Self::render), drawing fresh seeds, placement jitter
    /// and random themes from `rng`.
    pub fn render_with<R: Rng + ?Sized>(&self, token: &str, env: &RequestEnv, rng: &mut R) -> RenderOutcome {
        set_request_id(self.requests.fetch_add(1, Ordering::Relaxed) + 1);

        let decision = self.auth.check(env);
        if !decision.authorized {
            engine_info!("request not authorized");
            return RenderOutcome::Unauthorized {
                headers: decision.headers,
            };
        }

        let config = self.config.as_ref();
        let codec = TokenCodec::new(config);
        let raw = truncate_token(token, config.max_token_bytes);
        let mut state = codec.decode(raw, rng).state;
        engine_debug!("decoded token {raw:?}");

        let mode = PageMode::classify(&state);
        if mode == PageMode::Reshuffle {
            let theme = state.theme;
            state = PageState::fresh(Seed::fresh(rng));
            state.theme = theme;
        }
        engine_info!("rendering {mode:?} page {}", state.page);

        let deck = Deck::build(config, &state.seed, state.prior_pages(), |ty| {
            self.inventory.size(ty)
        });
        if mode == PageMode::Continuation && state.page > deck.page_limit() {
            engine_debug!("page {} is past the end, using {}", state.page, deck.page_limit());
            state.page = deck.page_limit();
        }
        let loader = CardLoader::new(&self.root, self.inventory.as_ref(), &deck, state.seed);

        let mut filtered = state.filtered;
        let (page, report) = match mode {
            PageMode::Fresh | PageMode::Reshuffle => {
                let mut page = Page::new();
                self.fetch(&mut page, &state, true, &loader);
                let report = distribute(&mut page, &deck, &state, rng);
                page.insert_fresh(0, Card::heading(Heading::Welcome));
                close_feed(&mut page, &deck, &state);
                (page, report)
            }
            PageMode::Continuation => {
                let mut page = Page::reconstruct(&state, &deck);
                self.fetch(&mut page, &state, false, &loader);
                let report = distribute(&mut page, &deck, &state, rng);
                close_feed(&mut page, &deck, &state);
                (page, report)
            }
            PageMode::Search => {
                let mut page = Page::new();
                filtered = filtered.saturating_add(self.search_cards(&mut page, &state, &loader));
                let report = distribute(&mut page, &deck, &state, rng);
                let full_page = config
                    .max_items()
                    .saturating_sub(filtered)
                    .saturating_mul(state.page.saturating_add(1));
                if full_page <= page.len() {
                    push_more(&mut page);
                } else {
                    page.push(Card::heading(Heading::Bottom));
                }
                (page, report)
            }
            PageMode::Permalink => {
                let mut page = Page::new();
                self.permalink_card(&mut page, &state, &loader);
                let mut footer = Card::heading(Heading::Footer);
                footer.permalink = true;
                page.push(footer);
                (page, PlacementReport::default())
            }
        };

        let mut next = next_state(&state, page.cards(), &deck);
        next.filtered = filtered;
        let next_token = codec.encode(&next);
        engine_debug!("next token {next_token:?}");

        let theme_index = decision.theme.or(state.theme.map(usize::from));
        let theme = ThemeSet::from_config(config).resolve(theme_index, rng);

        RenderOutcome::Page(Box::new(RenderedPage {
            mode,
            page,
            state,
            next_state: next,
            next_token,
            theme,
            headers: decision.headers,
            report,
        }))
    }

    /// Appends one page of every type. Past the first page, types that never
    /// appeared are skipped.
    fn fetch(&self, page: &mut Page, state: &PageState, fresh: bool, loader: &CardLoader<'_>) {
        let start_page = state.prior_pages();
        for ty in &self.config.card_types {
            if ty.quota == 0 || state.excludes(&ty.name) {
                continue;
            }
            if !fresh && state.distance(&ty.name).is_none() {
                engine_debug!("{}: not on earlier pages, skipped", ty.name);
                continue;
            }
            let start = start_page.saturating_mul(ty.quota);
            for ordinal in start..start.saturating_add(ty.quota) {
                match loader.load(ty, ordinal) {
                    Ok(card) => page.push(card),
                    Err(err) => log_dropped(&err),
                }
            }
        }
    }

    /// Appends search hits and returns how many hits the card filter dropped.
    fn search_cards(&self, page: &mut Page, state: &PageState, loader: &CardLoader<'_>) -> usize {
        if let Some(card) = self.pinned_match(state, loader) {
            page.push(card);
        }

        let request = SearchRequest {
            terms: &state.search,
            card_filter: &state.card_filter,
            page: state.page,
            result_count: self.config.max_items(),
        };
        let results = self.search.search(&request).unwrap_or_else(|err| {
            engine_warn!("search failed: {err}");
            SearchResults::default()
        });

        for ty in &self.config.card_types {
            if self.config.is_pinned(&ty.name) || state.excludes(&ty.name) {
                continue;
            }
            for name in results.hits_for(&ty.name) {
                match loader.load_named(ty, name) {
                    Ok(mut card) => {
                        card.search_result = true;
                        page.push(card);
                    }
                    Err(err) => log_dropped(&err),
                }
            }
        }
        results.filtered
    }

    /// The pinned card whose file name equals the whole query, on the first
    /// results page only.
    fn pinned_match(&self, state: &PageState, loader: &CardLoader<'_>) -> Option<Card> {
        let pinned = self
            .config
            .pinned_type
            .as_deref()
            .and_then(|name| self.config.card_type(name))?;
        if state.page > 0 || state.search.is_empty() || state.excludes(&pinned.name) {
            return None;
        }
        let query = state.search.join(" ").to_lowercase();
        if !self.inventory.list(pinned, false).contains(&query) {
            return None;
        }
        match loader.load_named(pinned, &query) {
            Ok(mut card) => {
                card.search_result = true;
                Some(card)
            }
            Err(err) => {
                log_dropped(&err);
                None
            }
        }
    }

    fn permalink_card(&self, page: &mut Page, state: &PageState, loader: &CardLoader<'_>) {
        let Some(link) = &state.permalink else {
            return;
        };
        let Some(ty) = self.config.card_type(&link.ctype) else {
            return;
        };
        match loader.load_named(ty, &link.id) {
            Ok(mut card) => {
                card.permalink = true;
                page.push(card);
            }
            Err(err) => log_dropped(&err),
        }
    }
}

/// True once the common type has no cards left for the page after `page`.
pub fn out_of_content(deck: &Deck, page: usize) -> bool {
    deck.common()
        .map(|c| {
            page.saturating_add(1).saturating_mul(c.descriptor.quota) >= c.descriptor.inventory_size
        })
        .unwrap_or(true)
}

fn close_feed(page: &mut Page, deck: &Deck, state: &PageState) {
    if out_of_content(deck, state.prior_pages()) {
        page.push(Card::heading(Heading::Bottom));
    } else {
        push_more(page);
    }
}

fn push_more(page: &mut Page) {
    let at = page.len().saturating_sub(SCROLLSTONE_LEAD);
    page.insert_fresh(at, Card::heading(Heading::Scrollstone));
    page.push(Card::heading(Heading::Tombstone));
}

fn log_dropped(err: &LoadError) {
    match err {
        LoadError::Exhausted { .. } => engine_debug!("card skipped: {err}"),
        _ => engine_warn!("card dropped: {err}"),
    }
}
