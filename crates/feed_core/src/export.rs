use std::collections::BTreeMap;

use crate::card::Card;
use crate::deck::Deck;
use crate::token::PageState;

/// Walks `cards` from the end and records, per type, how many content cards
/// follow its last card. Headings are not counted. The common type records
/// the ordinal of its last card instead.
pub fn last_distances(cards: &[Card], deck: &Deck) -> BTreeMap<String, usize> {
    let mut distances = BTreeMap::new();
    let mut headings = 0usize;

    for (i, card) in cards.iter().enumerate().rev() {
        let Some(name) = card.ctype() else {
            headings += 1;
            continue;
        };
        if distances.contains_key(name) {
            continue;
        }
        let value = if deck.is_common(name) {
            card.num
        } else {
            cards.len() - 1 - i - headings
        };
        distances.insert(name.to_string(), value);
        if distances.len() >= deck.entries().len() {
            break;
        }
    }
    distances
}

/// State for the page after `current`: same seed and search context, new
/// distances, page counter one past the page being rendered.
pub fn next_state(current: &PageState, cards: &[Card], deck: &Deck) -> PageState {
    PageState {
        seed: current.seed,
        distances: last_distances(cards, deck),
        search: current.search.clone(),
        card_filter: current.card_filter.clone(),
        filtered: current.filtered,
        page: current.prior_pages().saturating_add(1),
        theme: current.theme,
        permalink: None,
        reshuffle: false,
    }
}
