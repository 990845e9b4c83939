//! Item containers (inventories, chests) as stored on the server.

use std::collections::HashMap;

/// A slot index in the container's own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataSlot(pub i8);

impl DataSlot {
    /// Slot index in the network window, if this slot maps onto one.
    pub fn network(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Namespaced item id, e.g. "minecraft:stone".
    pub id: String,
    pub count: i8,
    pub slot: DataSlot,
}

/// One slot as sent to the client. Empty slots have a count of 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkSlot {
    pub item_count: i8,
    pub item_id: i32,
}

/// Maps namespaced item ids to protocol ids.
pub trait ItemRegistry {
    fn lookup(&self, id: &str) -> Option<i32>;
}

impl ItemRegistry for HashMap<String, i32> {
    fn lookup(&self, id: &str) -> Option<i32> {
        self.get(id).copied()
    }
}

/// A container that holds items, at most one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container(pub Vec<Item>);

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `item` into its slot, replacing whatever was there.
    pub fn set_slot(&mut self, item: Item) {
        match self.0.iter_mut().find(|existing| existing.slot == item.slot) {
            Some(existing) => *existing = item,
            None => self.0.push(item),
        }
    }

    pub fn slot(&self, slot: DataSlot) -> Option<&Item> {
        self.0.iter().find(|item| item.slot == slot)
    }

    /// Encode the container as `size` network slots. Items the registry does
    /// not know, or whose slot falls outside the window, are skipped.
    pub fn network(&self, size: usize, registry: &impl ItemRegistry) -> Vec<NetworkSlot> {
        let mut slots = vec![NetworkSlot::default(); size];
        for item in &self.0 {
            let Some(item_id) = registry.lookup(&item.id) else {
                continue;
            };
            if let Some(target) = item.slot.network().and_then(|i| slots.get_mut(i)) {
                *target = NetworkSlot { item_count: item.count, item_id };
            }
        }
        slots
    }
}
