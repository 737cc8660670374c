//! Single total order over the screen's items.
//!
//! Items are kept sorted by `(activity timestamp desc, secondary score desc,
//! display name asc, case-insensitive)`, with the entity id as the last
//! tie-break so the order is a function of the items alone. A changed item
//! is relocated with a binary search instead of re-sorting the whole list.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use courier_shared::EntityId;

use crate::item::UiItem;

// ---------------------------------------------------------------------------
// Sort key
// ---------------------------------------------------------------------------

/// Ordering key of an item. `a < b` means `a` is listed before `b`.
///
/// Keys of distinct entities never compare equal.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub timestamp: i64,
    pub score: f64,
    pub folded_name: String,
    pub entity_id: EntityId,
}

impl SortKey {
    pub fn of(item: &UiItem) -> Self {
        Self {
            timestamp: item.activity_timestamp(),
            score: item.secondary_score,
            folded_name: item.display_name.to_lowercase(),
            entity_id: item.entity_id,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.score.total_cmp(&self.score))
            .then_with(|| self.folded_name.cmp(&other.folded_name))
            .then_with(|| self.entity_id.cmp(&other.entity_id))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Compare two items by list position.
pub fn compare_items(a: &UiItem, b: &UiItem) -> Ordering {
    SortKey::of(a).cmp(&SortKey::of(b))
}

// ---------------------------------------------------------------------------
// Ordered projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    key: SortKey,
    item: UiItem,
}

/// Sorted list of items with at most one entry per entity.
#[derive(Debug, Clone, Default)]
pub struct OrderedProjection {
    entries: Vec<Entry>,
    keys: HashMap<EntityId, SortKey>,
}

impl OrderedProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or relocate `item`. An update that leaves the key unchanged
    /// is replaced in place.
    pub fn upsert(&mut self, item: UiItem) {
        let key = SortKey::of(&item);

        if self.keys.get(&item.entity_id) == Some(&key) {
            if let Some(pos) = self.locate(&key) {
                self.entries[pos].item = item;
                return;
            }
        }

        self.remove(&item.entity_id);

        let pos = self.entries.partition_point(|e| e.key < key);
        self.keys.insert(item.entity_id, key.clone());
        self.entries.insert(pos, Entry { key, item });
    }

    /// Remove the entry for `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        let Some(key) = self.keys.remove(id) else {
            return false;
        };

        match self.locate(&key) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    fn locate(&self, key: &SortKey) -> Option<usize> {
        self.entries.binary_search_by(|e| e.key.cmp(key)).ok()
    }

    /// Current list position of `id`.
    pub fn position(&self, id: &EntityId) -> Option<usize> {
        let key = self.keys.get(id)?;
        self.locate(key)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.keys.contains_key(id)
    }

    /// Copy of the ordered items, detached from the live list.
    pub fn snapshot(&self) -> Arc<[UiItem]> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }

    /// Recompute the whole order from scratch. The result equals the one
    /// reached by upserting the same items one at a time, in any order.
    pub fn rebuild_from<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = UiItem>,
    {
        self.clear();
        let mut entries: Vec<Entry> = items
            .into_iter()
            .map(|item| Entry {
                key: SortKey::of(&item),
                item,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        for entry in &entries {
            self.keys.insert(entry.item.entity_id, entry.key.clone());
        }
        self.entries = entries;
    }
}
