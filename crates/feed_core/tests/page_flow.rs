use std::collections::BTreeMap;
use std::sync::Once;

use feed_core::{
    boundary_offset, distribute, last_distances, next_state, Card, CardTypeConfig, Deck,
    FeedConfig, Heading, InventorySize, Page, PageState, Seed, TokenCodec,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn mixed_config() -> FeedConfig {
    FeedConfig::new(
        vec![
            CardTypeConfig::new("news", 10, 0),
            CardTypeConfig::new("images", 3, 3).randomized(),
            CardTypeConfig::new("quotes", 2, 4).randomized(),
            CardTypeConfig::new("features", 1, 5),
        ],
        "news",
    )
}

fn deck_for(config: &FeedConfig, state: &PageState) -> Deck {
    Deck::build(config, &state.seed, state.prior_pages(), |_| {
        InventorySize::new(100, 0)
    })
}

/// Appends one page worth of placeholders, in configuration order.
fn fetch_page(page: &mut Page, config: &FeedConfig, state: &PageState) {
    let pages = state.prior_pages();
    for ty in &config.card_types {
        if state.excludes(&ty.name) {
            continue;
        }
        for n in ty.quota * pages..ty.quota * (pages + 1) {
            page.push(Card::placeholder(&ty.name, n));
        }
    }
}

fn positions(cards: &[Card], ctype: &str) -> Vec<usize> {
    cards
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_type(ctype))
        .map(|(i, _)| i)
        .collect()
}

fn labels(cards: &[Card]) -> Vec<(String, usize)> {
    let mut labels: Vec<(String, usize)> = cards
        .iter()
        .filter_map(|c| c.ctype().map(|t| (t.to_string(), c.num)))
        .collect();
    labels.sort();
    labels
}

#[test]
fn prior_run_is_placed_relative_to_the_page_end() {
    init_logging();
    let config = FeedConfig::new(
        vec![
            CardTypeConfig::new("daily", 20, 0),
            CardTypeConfig::new("news", 10, 0),
        ],
        "daily",
    );
    let mut state = PageState::fresh(Seed::new(0.5).unwrap());
    state.distances.insert("news".to_string(), 12);

    let page = Page::reconstruct(&state, &deck_for(&config, &state));

    assert_eq!(page.cur_len(), 30);
    assert_eq!(page.len(), 30);
    assert_eq!(positions(page.cards(), "news"), (7..17).collect::<Vec<_>>());
    assert_eq!(page.cards()[7].num, 0);
    assert_eq!(page.cards()[16].num, 9);
    assert!(page.cards().iter().all(|c| c.body.is_none()));
    assert!(page.fresh_cards().is_empty());
}

#[test]
fn prior_run_clamps_to_the_page_start() {
    init_logging();
    let config = FeedConfig::new(
        vec![
            CardTypeConfig::new("daily", 0, 0),
            CardTypeConfig::new("news", 10, 0),
        ],
        "daily",
    );
    let mut state = PageState::fresh(Seed::new(0.5).unwrap());
    state.distances.insert("news".to_string(), 12);

    let page = Page::reconstruct(&state, &deck_for(&config, &state));

    assert_eq!(page.cur_len(), 10);
    let nums: Vec<usize> = page.cards().iter().map(|c| c.num).collect();
    assert_eq!(nums, (0..10).collect::<Vec<_>>());
}

#[test]
fn filtered_out_types_are_not_reconstructed() {
    init_logging();
    let config = mixed_config();
    let mut state = PageState::fresh(Seed::new(0.5).unwrap());
    state.distances = BTreeMap::from([("images".to_string(), 2), ("quotes".to_string(), 1)]);
    state.card_filter = vec!["news".to_string(), "images".to_string()];

    let page = Page::reconstruct(&state, &deck_for(&config, &state));

    assert_eq!(page.cur_len(), 13);
    assert!(positions(page.cards(), "quotes").is_empty());
}

#[test]
fn single_type_page_exports_distance_zero() {
    init_logging();
    let config = FeedConfig::new(
        vec![
            CardTypeConfig::new("news", 0, 0),
            CardTypeConfig::new("images", 5, 0).randomized(),
        ],
        "news",
    );
    let state = PageState::fresh(Seed::new(0.5).unwrap());
    let deck = Deck::build(&config, &state.seed, 0, |_| InventorySize::new(20, 0));

    let mut page = Page::new();
    fetch_page(&mut page, &config, &state);
    let report = distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(1));

    assert!(report.degraded.is_empty());
    assert_eq!(page.fresh_cards().len(), 5);
    assert_eq!(
        last_distances(page.cards(), &deck),
        BTreeMap::from([("images".to_string(), 0)])
    );

    let next = next_state(&state, page.cards(), &deck);
    assert_eq!(TokenCodec::new(&config).encode(&next), "5:i0:xp1");
}

#[test]
fn spacing_holds_on_a_fresh_page() {
    init_logging();
    let config = mixed_config();
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);

    for jitter_seed in 0..100 {
        let mut page = Page::new();
        fetch_page(&mut page, &config, &state);
        let report = distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(jitter_seed));

        assert!(report.degraded.is_empty(), "degraded: {:?}", report.degraded);
        assert_eq!(page.len(), 16);
        for ty in &config.card_types {
            let at = positions(page.cards(), &ty.name);
            assert_eq!(at.len(), ty.quota);
            for pair in at.windows(2) {
                assert!(
                    pair[1] - pair[0] >= ty.spacing,
                    "{} at {at:?} closer than {} (jitter {jitter_seed})",
                    ty.name,
                    ty.spacing
                );
            }
        }
    }
}

#[test]
fn common_cards_keep_fetch_order() {
    init_logging();
    let config = mixed_config();
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);

    let mut page = Page::new();
    fetch_page(&mut page, &config, &state);
    distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(9));

    let nums: Vec<usize> = page
        .cards()
        .iter()
        .filter(|c| c.is_type("news"))
        .map(|c| c.num)
        .collect();
    assert_eq!(nums, (0..10).collect::<Vec<_>>());
}

#[test]
fn continuation_respects_prior_page_distances() {
    init_logging();
    let config = mixed_config();
    let mut state = PageState::fresh(Seed::new(0.3).unwrap());
    state.distances = BTreeMap::from([
        ("news".to_string(), 9),
        ("images".to_string(), 1),
        ("quotes".to_string(), 0),
    ]);
    state.page = 1;
    let deck = deck_for(&config, &state);

    for jitter_seed in 0..100 {
        let mut page = Page::reconstruct(&state, &deck);
        let prefix = page.cards().to_vec();
        let cur_len = page.cur_len();
        assert_eq!(cur_len, 15);

        fetch_page(&mut page, &config, &state);
        let report = distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(jitter_seed));
        assert!(report.degraded.is_empty(), "degraded: {:?}", report.degraded);

        assert_eq!(page.cur_len(), cur_len);
        assert_eq!(&page.cards()[..cur_len], prefix.as_slice());
        assert_eq!(page.fresh_cards().len(), 16);

        let fresh = page.fresh_cards();
        let first_image = positions(fresh, "images")[0];
        let first_quote = positions(fresh, "quotes")[0];
        assert!(first_image >= boundary_offset(3, Some(1), true));
        assert!(first_quote >= boundary_offset(4, Some(0), true));
    }
}

#[test]
fn infeasible_spacing_is_reported() {
    init_logging();
    let config = FeedConfig::new(
        vec![
            CardTypeConfig::new("news", 2, 0),
            CardTypeConfig::new("images", 4, 5),
        ],
        "news",
    );
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);

    let mut page = Page::new();
    fetch_page(&mut page, &config, &state);
    let report = distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(4));

    assert!(report.is_degraded("images"));
    assert!(!report.is_degraded("news"));
    assert_eq!(page.len(), 6);
    assert_eq!(positions(page.cards(), "images").len(), 4);
}

#[test]
fn pinned_cards_close_the_region() {
    init_logging();
    let mut config = FeedConfig::new(
        vec![
            CardTypeConfig::new("news", 3, 0),
            CardTypeConfig::new("topics", 1, 0),
            CardTypeConfig::new("images", 2, 1),
        ],
        "news",
    );
    config.pinned_type = Some("topics".to_string());
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);

    let mut page = Page::new();
    fetch_page(&mut page, &config, &state);
    distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(2));

    assert_eq!(page.len(), 6);
    assert!(page.cards()[5].is_type("topics"));
}

#[test]
fn headings_are_not_counted_in_distances() {
    init_logging();
    let config = mixed_config();
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);
    let cards = vec![
        Card::placeholder("news", 0),
        Card::placeholder("images", 4),
        Card::placeholder("news", 1),
        Card::heading(Heading::Tombstone),
    ];

    assert_eq!(
        last_distances(&cards, &deck),
        BTreeMap::from([("images".to_string(), 1), ("news".to_string(), 1)])
    );
}

#[test]
fn exported_token_rebuilds_the_shown_cards() {
    init_logging();
    let config = mixed_config();
    let codec = TokenCodec::new(&config);
    let state = PageState::fresh(Seed::new(0.3).unwrap());
    let deck = deck_for(&config, &state);

    let mut page = Page::new();
    fetch_page(&mut page, &config, &state);
    distribute(&mut page, &deck, &state, &mut StdRng::seed_from_u64(11));
    let shown = labels(page.cards());

    let token = codec.encode(&next_state(&state, page.cards(), &deck));
    let decoded = codec.decode(&token, &mut StdRng::seed_from_u64(0));
    assert!(decoded.leftover.is_empty());
    assert_eq!(decoded.state.seed, state.seed);
    assert_eq!(decoded.state.page, 1);

    let rebuilt = Page::reconstruct(&decoded.state, &deck_for(&config, &decoded.state));
    assert_eq!(rebuilt.cur_len(), page.len());
    assert_eq!(labels(rebuilt.cards()), shown);
}

#[test]
fn oversized_token_numbers_are_clamped() {
    init_logging();
    let config = mixed_config();
    let codec = TokenCodec::new(&config);

    let far = codec.decode("5:n0:i18446744073709551615", &mut StdRng::seed_from_u64(0));
    assert_eq!(far.state.distance("images"), Some(usize::MAX));
    let page = Page::reconstruct(&far.state, &deck_for(&config, &far.state));
    assert_eq!(page.cur_len(), 13);
    assert_eq!(positions(page.cards(), "images"), vec![0, 1, 2]);

    let late = codec.decode("5:n0:xp18446744073709551615", &mut StdRng::seed_from_u64(0));
    assert_eq!(late.state.page, usize::MAX);
    let deck = deck_for(&config, &late.state);
    assert_eq!(deck.page_limit(), 10);
    assert_eq!(deck.get("images").unwrap().ordering.len(), 3 * 11);
    let page = Page::reconstruct(&late.state, &deck);
    assert_eq!(page.cur_len(), 100);
    assert_eq!(next_state(&late.state, page.cards(), &deck).page, usize::MAX);
}
