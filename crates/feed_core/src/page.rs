use engine_logging::engine_debug;

use crate::card::Card;
use crate::deck::Deck;
use crate::token::PageState;

/// Ordered cards for one response.
///
/// Cards before `cur_len` stand in for earlier pages: they carry no body and
/// are never rendered again. Everything from `cur_len` on is rendered now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    cards: Vec<Card>,
    cur_len: usize,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds placeholders for what earlier pages showed, using only the
    /// decoded state. No inventory is touched.
    ///
    /// The common type fills `quota × prior_pages` slots in order. Every other
    /// type with a recorded distance then contributes its prior ordinals
    /// (`0 .. quota × prior_pages`) as one run inserted `distance + 1` cards
    /// from the end, clamped to the start of the page. The page count is
    /// capped by [`Deck::page_limit`].
    pub fn reconstruct(state: &PageState, deck: &Deck) -> Self {
        let pages = deck.clamp_page(state.prior_pages());
        let mut cards: Vec<Card> = Vec::new();

        if let Some(common) = deck.common() {
            let name = &common.descriptor.name;
            cards.extend((0..common.descriptor.quota * pages).map(|n| Card::placeholder(name, n)));
        }

        for entry in deck.entries() {
            let name = &entry.descriptor.name;
            if deck.is_common(name) || state.excludes(name) {
                continue;
            }
            let Some(distance) = state.distance(name) else {
                continue;
            };
            let shown = entry.descriptor.quota * pages;
            if shown == 0 {
                continue;
            }
            let distance = distance.min(cards.len());
            let put = cards.len().saturating_sub(distance + 1);
            engine_debug!("reconstruct {name}: {shown} card(s) at {put} (distance {distance})");
            cards.splice(put..put, (0..shown).map(|n| Card::placeholder(name, n)));
        }

        let cur_len = cards.len();
        Self { cards, cur_len }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cur_len(&self) -> usize {
        self.cur_len
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards rendered by this response.
    pub fn fresh_cards(&self) -> &[Card] {
        &self.cards[self.cur_len..]
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Inserts into the fresh region; indices before `cur_len` move up to it.
    pub fn insert_fresh(&mut self, index: usize, card: Card) {
        let index = index.clamp(self.cur_len, self.cards.len());
        self.cards.insert(index, card);
    }

    /// Removes and returns the fresh region, leaving the prefix in place.
    pub(crate) fn take_fresh(&mut self) -> Vec<Card> {
        self.cards.split_off(self.cur_len)
    }

    pub(crate) fn extend_fresh(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    /// Inserts at `offset` cards past `cur_len`, clamped to the end.
    pub(crate) fn insert_at_offset(&mut self, offset: usize, card: Card) {
        let index = (self.cur_len + offset).min(self.cards.len());
        self.cards.insert(index, card);
    }

    /// Number of fresh cards.
    pub(crate) fn fresh_len(&self) -> usize {
        self.cards.len() - self.cur_len
    }
}
