//! Sectioned search results, kept apart from the base projection.
//!
//! The overlay is active while the query is non-empty. Name search answers
//! fill the Contacts and Groups pools, content search answers fill the
//! Messages pool; each arrives independently and is only accepted if it
//! answers the current query. The query is matched as typed, whitespace
//! included.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use courier_shared::constants::MIN_RESULTS_VISIBLE;
use courier_shared::{EntityKind, SharedError};

use crate::item::UiItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Contacts,
    Groups,
    Messages,
}

impl SectionKey {
    /// Fixed display order of sections.
    pub const ORDER: [SectionKey; 3] = [Self::Contacts, Self::Groups, Self::Messages];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    All,
    Contacts,
    Groups,
    Messages,
}

impl SearchFilter {
    fn only(self) -> Option<SectionKey> {
        match self {
            Self::All => None,
            Self::Contacts => Some(SectionKey::Contacts),
            Self::Groups => Some(SectionKey::Groups),
            Self::Messages => Some(SectionKey::Messages),
        }
    }
}

impl FromStr for SearchFilter {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "contacts" => Ok(Self::Contacts),
            "groups" => Ok(Self::Groups),
            "messages" => Ok(Self::Messages),
            other => Err(SharedError::UnknownFilter(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeader {
    pub key: SectionKey,
    /// Total number of matches in the section, shown or not.
    pub total: usize,
}

/// "Show N more" action below a capped section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFooter {
    pub hidden: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    pub key: SectionKey,
    pub header: Option<SectionHeader>,
    pub items: Vec<UiItem>,
    pub footer: Option<SectionFooter>,
    pub expanded: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPools {
    pub contacts: Vec<UiItem>,
    pub groups: Vec<UiItem>,
    pub messages: Vec<UiItem>,
}

impl SearchPools {
    fn pool(&self, key: SectionKey) -> &[UiItem] {
        match key {
            SectionKey::Contacts => &self.contacts,
            SectionKey::Groups => &self.groups,
            SectionKey::Messages => &self.messages,
        }
    }
}

/// Search state of one screen.
#[derive(Debug, Clone)]
pub struct SearchOverlay {
    query: String,
    expanded: HashSet<SectionKey>,
    pools: SearchPools,
    min_visible: usize,
}

impl Default for SearchOverlay {
    fn default() -> Self {
        Self::new(MIN_RESULTS_VISIBLE)
    }
}

impl SearchOverlay {
    pub fn new(min_visible: usize) -> Self {
        Self {
            query: String::new(),
            expanded: HashSet::new(),
            pools: SearchPools::default(),
            min_visible,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Set the current query. Returns `true` if it changed.
    ///
    /// Content matches of the previous query are dropped until the new
    /// answer arrives. Clearing the query deactivates the overlay, drops
    /// every pool and collapses every section.
    pub fn set_query(&mut self, query: &str) -> bool {
        if query == self.query {
            return false;
        }
        self.query = query.to_string();
        self.pools.messages.clear();
        if self.query.is_empty() {
            self.expanded.clear();
            self.pools = SearchPools::default();
            debug!("Search overlay cleared");
        }
        true
    }

    pub fn set_expanded(&mut self, key: SectionKey, expanded: bool) {
        if expanded {
            self.expanded.insert(key);
        } else {
            self.expanded.remove(&key);
        }
    }

    pub fn is_expanded(&self, key: SectionKey) -> bool {
        self.expanded.contains(&key)
    }

    /// Accept a name search answer. Groups go to the Groups pool, every
    /// other kind to Contacts.
    pub fn accept_name_results(&mut self, query: &str, items: Vec<UiItem>) -> bool {
        if !self.answers_current(query) {
            return false;
        }
        let (groups, contacts): (Vec<UiItem>, Vec<UiItem>) = items
            .into_iter().partition(|i| i.kind == EntityKind::Group);
        self.pools.contacts = contacts;
        self.pools.groups = groups;
        true
    }

    /// Accept a content search answer for the Messages pool.
    pub fn accept_content_results(&mut self, query: &str, items: Vec<UiItem>) -> bool {
        if !self.answers_current(query) {
            return false;
        }
        self.pools.messages = items;
        true
    }

    fn answers_current(&self, query: &str) -> bool {
        let fresh = self.is_active() && query == self.query;
        if !fresh {
            debug!(answered = %query, current = %self.query, "Dropping stale search results");
        }
        fresh
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.expanded.clear();
        self.pools = SearchPools::default();
    }

    /// Matches of one section under the current query.
    ///
    /// Name pools are re-checked locally so an answer to a shorter,
    /// earlier query never shows a name that no longer matches.
    fn matches(&self, key: SectionKey) -> Vec<UiItem> {
        let pool = self.pools.pool(key);
        match key {
            SectionKey::Messages => pool.to_vec(),
            SectionKey::Contacts | SectionKey::Groups => pool
                .iter()
                .filter(|i| i.name_matches(&self.query))
                .cloned()
                .collect(),
        }
    }

    /// Build the sectioned view, or `None` while the overlay is inactive.
    pub fn sections(&self, filter: SearchFilter) -> Option<Vec<SearchSection>> {
        if !self.is_active() {
            return None;
        }

        if let Some(key) = filter.only() {
            let items = self.matches(key);
            if items.is_empty() {
                return Some(Vec::new());
            }
            return Some(vec![SearchSection {
                key,
                header: None,
                items,
                footer: None,
                expanded: true,
            }]);
        }

        let mut sections = Vec::new();
        for key in SectionKey::ORDER {
            let mut items = self.matches(key);
            if items.is_empty() {
                continue;
            }
            let total = items.len();
            let expanded = total <= self.min_visible || self.is_expanded(key);
            let footer = if expanded {
                None
            } else {
                items.truncate(self.min_visible);
                Some(SectionFooter {
                    hidden: total - self.min_visible,
                })
            };
            sections.push(SearchSection {
                key,
                header: Some(SectionHeader { key, total }),
                items,
                footer,
                expanded,
            });
        }
        Some(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_shared::{ActivityDescriptor, ActivityKind, Entity, EntityId};

    fn named(kind: EntityKind, name: &str) -> UiItem {
        UiItem::from_entity(Entity::new(EntityId::new(), kind, name), None)
    }

    fn contacts(n: usize) -> Vec<UiItem> {
        (0..n).map(|i| named(EntityKind::Contact, &format!("Anna {i}"))).collect()
    }

    fn overlay_with(query: &str, names: Vec<UiItem>) -> SearchOverlay {
        let mut overlay = SearchOverlay::default();
        overlay.set_query(query);
        assert!(overlay.accept_name_results(query, names));
        overlay
    }

    #[test]
    fn test_inactive_without_query() {
        let overlay = SearchOverlay::default();
        assert!(overlay.sections(SearchFilter::All).is_none());
    }

    #[test]
    fn test_section_capped_with_footer() {
        let overlay = overlay_with("anna", contacts(5));
        let sections = overlay.sections(SearchFilter::All).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items.len(), 3);
        assert_eq!(sections[0].footer, Some(SectionFooter { hidden: 2 }));
        assert!(!sections[0].expanded);
        assert_eq!(sections[0].header.as_ref().unwrap().total, 5);
    }

    #[test]
    fn test_expanded_section_shows_all() {
        let mut overlay = overlay_with("anna", contacts(5));
        overlay.set_expanded(SectionKey::Contacts, true);
        let sections = overlay.sections(SearchFilter::All).unwrap();

        assert_eq!(sections[0].items.len(), 5);
        assert!(sections[0].footer.is_none());
        assert!(sections[0].expanded);
    }

    #[test]
    fn test_small_section_is_implicitly_expanded() {
        let overlay = overlay_with("anna", contacts(3));
        let sections = overlay.sections(SearchFilter::All).unwrap();

        assert_eq!(sections[0].items.len(), 3);
        assert!(sections[0].footer.is_none());
        assert!(sections[0].expanded);
    }

    #[test]
    fn test_fixed_section_order_and_empty_omitted() {
        let mut overlay = SearchOverlay::default();
        overlay.set_query("te");
        overlay.accept_content_results("te", vec![named(EntityKind::Contact, "Zed")]);
        overlay.accept_name_results("te", vec![named(EntityKind::Group, "Team")]);

        let keys: Vec<SectionKey> = overlay
            .sections(SearchFilter::All)
            .unwrap()
            .iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec![SectionKey::Groups, SectionKey::Messages]);
    }

    #[test]
    fn test_single_filter_has_no_chrome() {
        let overlay = overlay_with("anna", contacts(5));
        let sections = overlay.sections(SearchFilter::Contacts).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].items.len(), 5);
        assert!(sections[0].header.is_none());
        assert!(sections[0].footer.is_none());
        assert!(overlay.sections(SearchFilter::Groups).unwrap().is_empty());
    }

    #[test]
    fn test_expansion_persists_across_keystrokes() {
        let mut overlay = overlay_with("ann", contacts(5));
        overlay.set_expanded(SectionKey::Contacts, true);
        overlay.set_query("anna");

        let sections = overlay.sections(SearchFilter::All).unwrap();
        assert!(sections[0].expanded);
        assert_eq!(sections[0].items.len(), 5);
    }

    #[test]
    fn test_clearing_query_resets_expansion() {
        let mut overlay = overlay_with("anna", contacts(5));
        overlay.set_expanded(SectionKey::Contacts, true);
        overlay.set_query("");

        assert!(!overlay.is_expanded(SectionKey::Contacts));
        assert!(!overlay.is_active());
    }

    #[test]
    fn test_stale_results_dropped() {
        let mut overlay = SearchOverlay::default();
        overlay.set_query("bob");
        assert!(!overlay.accept_name_results("bo", contacts(2)));
        assert!(overlay.sections(SearchFilter::All).unwrap().is_empty());
    }

    #[test]
    fn test_name_pool_refiltered_locally() {
        let mut overlay = SearchOverlay::default();
        overlay.set_query("an");
        overlay.accept_name_results(
            "an",
            vec![named(EntityKind::Contact, "Anna"), named(EntityKind::Contact, "Hans")],
        );
        overlay.set_query("ann");

        let sections = overlay.sections(SearchFilter::All).unwrap();
        assert_eq!(sections[0].items.len(), 1);
        assert_eq!(sections[0].items[0].display_name, "Anna");
    }

    #[test]
    fn test_content_pool_dropped_on_query_change() {
        let mut overlay = SearchOverlay::default();
        overlay.set_query("an");
        let hit = UiItem::from_entity(
            Entity::new(EntityId::new(), EntityKind::Contact, "Zed"),
            Some(ActivityDescriptor::at_millis(ActivityKind::Message, 1).with_payload("banana")),
        );
        assert!(overlay.accept_content_results("an", vec![hit]));
        overlay.set_query("anxq");

        assert!(overlay.sections(SearchFilter::All).unwrap().is_empty());
        assert!(overlay.sections(SearchFilter::Messages).unwrap().is_empty());
    }

    #[test]
    fn test_query_matched_as_typed() {
        let mut overlay = SearchOverlay::default();
        assert!(overlay.set_query(" "));
        assert!(overlay.is_active());

        overlay.set_query("ann ");
        overlay.accept_name_results(
            "ann ",
            vec![named(EntityKind::Contact, "Joanne"), named(EntityKind::Contact, "Ann Lee")],
        );
        let sections = overlay.sections(SearchFilter::All).unwrap();
        assert_eq!(sections[0].items.len(), 1);
        assert_eq!(sections[0].items[0].display_name, "Ann Lee");

        assert!(!overlay.accept_name_results("ann", contacts(2)));
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("Groups".parse::<SearchFilter>().unwrap(), SearchFilter::Groups);
        assert!("nope".parse::<SearchFilter>().is_err());
    }
}
