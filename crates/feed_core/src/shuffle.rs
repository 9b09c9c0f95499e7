//! Seeded anti-repeat ordering of a card type's inventory.
//!
//! The ordering maps virtual slots (the ordinals a page asks for) to inventory
//! indices. It is rebuilt from the page seed on every request, so two requests
//! carrying the same seed see the same sequence without anything being stored.

use engine_logging::engine_debug;
use rand::seq::SliceRandom;

use crate::deck::CardTypeDescriptor;
use crate::seed::Seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Item(usize),
    /// Draw from the type's hidden pool instead of the main inventory.
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShuffleOrdering {
    slots: Vec<Slot>,
}

impl ShuffleOrdering {
    /// Builds `total_slots` slots for `descriptor` from `seed`.
    ///
    /// No inventory index repeats within `descriptor.window` consecutive slots
    /// unless no replacement candidate exists, in which case the slot becomes
    /// [`Slot::Hidden`] when a hidden pool exists, or keeps a repeat otherwise.
    pub fn generate(seed: &Seed, descriptor: &CardTypeDescriptor, total_slots: usize) -> Self {
        let inventory = descriptor.inventory_size;
        if inventory == 0 || total_slots == 0 {
            return Self::default();
        }
        let mut rng = seed.rng_for(&descriptor.name);

        let mut pool: Vec<usize> = (0..inventory).cycle().take(total_slots).collect();
        pool.shuffle(&mut rng);

        let window = descriptor.window;
        let mut slots: Vec<Option<usize>> = pool.into_iter().map(Some).collect();
        mark_repeats(&mut slots, window);

        let mut unresolved = 0usize;
        let resolved = (0..slots.len())
            .map(|i| {
                if let Some(index) = slots[i] {
                    return Slot::Item(index);
                }
                let lo = (i + 1).saturating_sub(window);
                let hi = (i + window).min(slots.len());
                let mut choices: Vec<usize> = (0..inventory).collect();
                choices.shuffle(&mut rng);
                let free = choices
                    .iter()
                    .copied()
                    .find(|k| !slots[lo..hi].contains(&Some(*k)));
                let slot = match free {
                    Some(k) => Slot::Item(k),
                    None if descriptor.hidden_size > 0 => Slot::Hidden,
                    None => Slot::Item(choices[0]),
                };
                if free.is_none() {
                    unresolved += 1;
                }
                if let Slot::Item(k) = slot {
                    slots[i] = Some(k);
                }
                slot
            })
            .collect();

        if unresolved > 0 {
            engine_debug!(
                "{}: {unresolved} slot(s) without a repeat-free candidate (window {window}, inventory {inventory})",
                descriptor.name
            );
        }
        Self { slots: resolved }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot for a virtual ordinal; ordinals past the end wrap around.
    pub fn slot(&self, ordinal: usize) -> Option<Slot> {
        if self.slots.is_empty() {
            return None;
        }
        Some(self.slots[ordinal % self.slots.len()])
    }
}

/// Clears every later occurrence of an index seen within `window` slots.
fn mark_repeats(slots: &mut [Option<usize>], window: usize) {
    for i in 0..slots.len() {
        let Some(index) = slots[i] else { continue };
        let end = (i + window).min(slots.len());
        for later in slots.iter_mut().take(end).skip(i + 1) {
            if *later == Some(index) {
                *later = None;
            }
        }
    }
}
