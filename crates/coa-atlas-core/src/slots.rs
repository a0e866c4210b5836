use crate::model::{Item, Slot};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Ordering key of a slot: `y` ascending, `x` descending, then insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotKey {
    y: u32,
    x: Reverse<u32>,
    seq: u64,
}

/// Ordered collection of candidate slots for one packing attempt.
///
/// Slots are kept sorted on insert, so scanning never needs a re-sort.
/// Bound slots stay in place; they are skipped by [`SlotFrontier::open`].
#[derive(Debug, Clone)]
pub struct SlotFrontier<K> {
    slots: BTreeMap<SlotKey, Slot<K>>,
    next_seq: u64,
}

impl<K> SlotFrontier<K> {
    /// Frontier with its single starting slot at `(margin, margin)`.
    pub fn new(margin: u32) -> Self {
        let mut frontier = Self {
            slots: BTreeMap::new(),
            next_seq: 0,
        };
        frontier.insert(margin, margin);
        frontier
    }

    pub fn insert(&mut self, x: u32, y: u32) -> SlotKey {
        let key = SlotKey {
            y,
            x: Reverse(x),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.slots.insert(key, Slot::open(x, y));
        key
    }

    /// Open slots in frontier order.
    pub fn open(&self) -> impl Iterator<Item = (SlotKey, &Slot<K>)> {
        self.slots
            .iter()
            .filter(|(_, s)| s.is_open())
            .map(|(k, s)| (*k, s))
    }

    /// Bound slots in frontier order.
    pub fn bound(&self) -> impl Iterator<Item = (&Slot<K>, &Item<K>)> {
        self.slots
            .values()
            .filter_map(|s| s.item.as_ref().map(|item| (s, item)))
    }

    /// Binds `item` to the slot at `key`, returning the slot origin.
    /// Returns `None` if the key is unknown or the slot is already bound.
    pub fn bind(&mut self, key: SlotKey, item: Item<K>) -> Option<(u32, u32)> {
        let slot = self.slots.get_mut(&key)?;
        if slot.item.is_some() {
            return None;
        }
        slot.item = Some(item);
        Some((slot.x, slot.y))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consumes the frontier, yielding slots in order.
    pub fn into_slots(self) -> Vec<Slot<K>> {
        self.slots.into_values().collect()
    }
}
