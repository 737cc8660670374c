//! Identity map from [`EntityId`] to the current [`UiItem`].

use std::collections::HashMap;

use courier_shared::EntityId;

use crate::item::UiItem;

/// Owns the canonical item for every entity the screen knows about.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    items: HashMap<EntityId, UiItem>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the item for `item.entity_id`, returning the previous one.
    pub fn upsert(&mut self, item: UiItem) -> Option<UiItem> {
        self.items.insert(item.entity_id, item)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<UiItem> {
        self.items.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&UiItem> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UiItem> {
        self.items.values()
    }
}
