//! Interleaves freshly fetched cards into the new region of a page.
//!
//! The common type stays at the front of the region in fetch order and the
//! pinned type closes it. Every other type is re-inserted one card at a time,
//! smallest batch first, at a jittered offset inside a window that keeps each
//! card at least `spacing` positions from the previous card of its type,
//! including the last one shown on the prior page.

use std::collections::BTreeMap;

use engine_logging::engine_warn;
use rand::Rng;

use crate::card::Card;
use crate::deck::Deck;
use crate::page::Page;
use crate::token::PageState;

/// Types whose spacing could not be honored on this page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub degraded: Vec<String>,
}

impl PlacementReport {
    pub fn is_degraded(&self, ctype: &str) -> bool {
        self.degraded.iter().any(|d| d == ctype)
    }

    fn flag(&mut self, ctype: &str) {
        if !self.is_degraded(ctype) {
            self.degraded.push(ctype.to_string());
        }
    }
}

/// Offset from the page boundary before which a type may not appear, given
/// the distance of its last card on the prior page.
pub fn boundary_offset(spacing: usize, distance: Option<usize>, has_prior: bool) -> usize {
    let Some(distance) = distance else {
        return 0;
    };
    if distance >= spacing || (!has_prior && distance == 0) {
        0
    } else {
        spacing - distance
    }
}

/// Redistributes the fresh region of `page`. `jitter` should be a
/// non-deterministic source so that ordering varies between loads.
pub fn distribute<R: Rng + ?Sized>(
    page: &mut Page,
    deck: &Deck,
    state: &PageState,
    jitter: &mut R,
) -> PlacementReport {
    let mut report = PlacementReport::default();
    let has_prior = page.cur_len() > 0;
    let region = page.take_fresh();
    let p_dist = region.len();

    let mut common = Vec::new();
    let mut pinned = Vec::new();
    let mut batches: BTreeMap<String, Vec<Card>> = BTreeMap::new();
    for card in region {
        match card.ctype() {
            Some(name) if deck.is_common(name) => common.push(card),
            Some(name) if deck.is_pinned(name) => pinned.push(card),
            Some(name) => batches.entry(name.to_string()).or_default().push(card),
            None => common.push(card),
        }
    }
    page.extend_fresh(common);

    let mut order: Vec<(usize, String)> = deck
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| batches.contains_key(&e.descriptor.name))
        .map(|(i, e)| (i, e.descriptor.name.clone()))
        .collect();
    // Unconfigured types sort after configured ones with the same batch size.
    for name in batches.keys() {
        if deck.get(name).is_none() {
            order.push((usize::MAX, name.clone()));
        }
    }
    order.sort_by_key(|(i, name)| (batches[name].len(), *i));

    for (_, name) in order {
        let Some(batch) = batches.remove(&name) else {
            continue;
        };
        let spacing = deck.spacing(&name);
        let placement = Placement {
            name: &name,
            spacing,
            boundary: boundary_offset(spacing, state.distance(&name), has_prior),
            region: p_dist,
        };
        placement.place(page, batch, jitter, &mut report);
    }

    page.extend_fresh(pinned);
    report
}

/// Where one type's batch may go inside the fresh region.
struct Placement<'a> {
    name: &'a str,
    spacing: usize,
    /// First offset the type may take on this page.
    boundary: usize,
    /// Size of the fresh region before redistribution.
    region: usize,
}

impl Placement<'_> {
    fn place<R: Rng + ?Sized>(
        &self,
        page: &mut Page,
        batch: Vec<Card>,
        jitter: &mut R,
        report: &mut PlacementReport,
    ) {
        let name = self.name;
        let count = batch.len();
        let mut norm_dist = self.spacing;
        let effective = self.region.saturating_sub(self.boundary);
        let max_dist = effective / count;
        if max_dist < norm_dist {
            norm_dist = norm_dist.saturating_sub(1);
            report.flag(name);
            engine_warn!(
                "{name}: spacing {} infeasible for {count} card(s) in {effective} slot(s), using {norm_dist}",
                self.spacing
            );
        }

        let mut start = self.boundary;
        for (k, card) in batch.into_iter().enumerate() {
            let available = page.fresh_len();
            let ahead = count - k - 1;
            let end = available.saturating_sub(ahead * norm_dist);
            let mut jump = if start >= end {
                start
            } else {
                jitter.gen_range(start..=end)
            };
            if jump > available {
                jump = available;
                report.flag(name);
            }
            page.insert_at_offset(jump, card);
            start = jump + norm_dist;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::boundary_offset;

    #[test]
    fn boundary_offset_defers_close_cards() {
        assert_eq!(boundary_offset(3, Some(1), true), 2);
        assert_eq!(boundary_offset(3, Some(3), true), 0);
        assert_eq!(boundary_offset(3, None, false), 0);
        assert_eq!(boundary_offset(3, None, true), 0);
        assert_eq!(boundary_offset(3, Some(0), false), 0);
        assert_eq!(boundary_offset(0, Some(0), true), 0);
    }
}
