//! The single entry point that applies backend events to a screen's
//! projection.
//!
//! Every mutation goes through an `on_*` transition. Each transition is
//! synchronous; when it changes the views, the grouped view is recomputed,
//! the revision is bumped and every change listener is called with it.
//! Work the reducer needs from the backend is queued as
//! [`BackendRequest`]s and collected by the host with
//! [`EventReducer::drain_requests`].

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use courier_shared::{ActivityDescriptor, DescriptorId, Entity, EntityId};

use crate::config::ProjectionConfig;
use crate::events::{ApplyOutcome, BackendRequest, EntityEntry, ProjectionEvent};
use crate::grouping::{self, GroupedItem};
use crate::index::EntityIndex;
use crate::item::UiItem;
use crate::order::OrderedProjection;
use crate::search::{SearchFilter, SearchOverlay, SearchSection, SectionKey};
use crate::sweep::{SweepHandle, SweepId, SweepTracker};

/// Called with the new revision after every applied change.
pub type ChangeListener = Box<dyn FnMut(u64) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReducerState {
    /// No bulk query outstanding or completed.
    Idle,
    /// A bulk query was requested and has not been answered.
    Loading,
    /// At least one bulk query has been applied.
    Ready,
}

pub struct EventReducer {
    config: ProjectionConfig,
    state: ReducerState,
    index: EntityIndex,
    order: OrderedProjection,
    grouped: Arc<[GroupedItem]>,
    search: SearchOverlay,
    sweeps: SweepTracker,
    /// Entities whose last activity was deleted and whose replacement has
    /// been requested from the backend.
    awaiting_refresh: HashSet<EntityId>,
    outbox: Vec<BackendRequest>,
    revision: u64,
    listeners: Vec<ChangeListener>,
}

impl EventReducer {
    pub fn new(config: ProjectionConfig) -> Self {
        let search = SearchOverlay::new(config.min_results_visible);
        Self {
            config,
            state: ReducerState::Idle,
            index: EntityIndex::new(),
            order: OrderedProjection::new(),
            grouped: Arc::from(Vec::new()),
            search,
            sweeps: SweepTracker::new(),
            awaiting_refresh: HashSet::new(),
            outbox: Vec::new(),
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn state(&self) -> ReducerState {
        self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&UiItem> {
        self.index.get(id)
    }

    pub fn is_awaiting_refresh(&self, id: &EntityId) -> bool {
        self.awaiting_refresh.contains(id)
    }

    pub fn sweeps(&self) -> &SweepTracker {
        &self.sweeps
    }

    pub fn search(&self) -> &SearchOverlay {
        &self.search
    }

    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    /// Take every request queued since the last call.
    pub fn drain_requests(&mut self) -> Vec<BackendRequest> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn current_ordered_grouped_view(&self) -> Arc<[GroupedItem]> {
        Arc::clone(&self.grouped)
    }

    pub fn ordered_snapshot(&self) -> Arc<[UiItem]> {
        self.order.snapshot()
    }

    /// Sectioned search view for `query`.
    ///
    /// A changed, non-empty query queues a name search and a content
    /// search; their answers re-enter as events. An empty query returns no
    /// sections and the caller shows the base view.
    pub fn current_search_view(&mut self, query: &str, filter: SearchFilter) -> Vec<SearchSection> {
        if self.search.set_query(query) && self.search.is_active() {
            let query = self.search.query().to_string();
            debug!(query = %query, "Search query changed");
            self.outbox.push(BackendRequest::SearchByName {
                query: query.clone(),
            });
            self.outbox.push(BackendRequest::SearchByContent { query });
        }
        self.search.sections(filter).unwrap_or_default()
    }

    pub fn set_section_expanded(&mut self, key: SectionKey, expanded: bool) {
        self.search.set_expanded(key, expanded);
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Dispatch any inbound event to its transition.
    pub fn apply(&mut self, event: ProjectionEvent) -> ApplyOutcome {
        match event {
            ProjectionEvent::BulkLoaded { entries } => self.on_bulk_load(entries),
            ProjectionEvent::EntityCreated { entity, activity } => {
                self.on_entity_created(entity, activity)
            }
            ProjectionEvent::EntityUpdated { entity, activity } => {
                self.on_entity_updated(entity, activity)
            }
            ProjectionEvent::EntityDeleted { entity_id } => self.on_entity_deleted(&entity_id),
            ProjectionEvent::DescriptorsDeleted { descriptor_ids } => {
                self.on_descriptors_deleted(descriptor_ids)
            }
            ProjectionEvent::WorkspaceReset => self.on_workspace_reset(),
            ProjectionEvent::NameSearchResults { query, entries } => {
                self.on_name_search_results(&query, entries)
            }
            ProjectionEvent::ContentSearchResults { query, entries } => {
                self.on_content_search_results(&query, entries)
            }
        }
    }

    /// Ask the backend for the full list.
    pub fn request_bulk_load(&mut self) {
        self.state = ReducerState::Loading;
        self.outbox.push(BackendRequest::LoadAll);
        debug!(screen = %self.config.screen, "Bulk load requested");
    }

    /// Replace everything with the answer to a bulk query.
    pub fn on_bulk_load(&mut self, entries: Vec<EntityEntry>) -> ApplyOutcome {
        self.index.clear();
        self.awaiting_refresh.clear();
        for EntityEntry { entity, activity } in entries {
            self.index.upsert(UiItem::from_entity(entity, activity));
        }
        self.order.rebuild_from(self.index.iter().cloned());
        self.state = ReducerState::Ready;

        // Swept entities missing from the fresh list are gone.
        let vanished: Vec<EntityId> = self
            .sweeps
            .awaited()
            .into_iter()
            .filter(|id| !self.index.contains(id))
            .collect();
        let mut completed = Vec::new();
        for id in vanished {
            completed.extend(self.sweeps.observe_deleted(&id));
        }

        info!(
            screen = %self.config.screen,
            entities = self.index.len(),
            "Bulk load applied"
        );
        self.commit(completed)
    }

    /// Add a newly created entity. A known id keeps its current item, but
    /// the views are still reported as changed.
    pub fn on_entity_created(
        &mut self,
        entity: Entity,
        activity: Option<ActivityDescriptor>,
    ) -> ApplyOutcome {
        if self.index.contains(&entity.id) {
            debug!(entity = %entity.id, "Created entity already known");
        } else {
            debug!(entity = %entity.id, "Entity created");
            self.store(UiItem::from_entity(entity, activity));
        }
        self.commit(Vec::new())
    }

    /// Apply an update, guarded against out-of-order delivery.
    ///
    /// An update carrying an activity older than the stored one only
    /// refreshes display-only fields. An update without an activity keeps
    /// the stored one, unless the entity is awaiting a refresh after its
    /// last activity was deleted.
    pub fn on_entity_updated(
        &mut self,
        entity: Entity,
        activity: Option<ActivityDescriptor>,
    ) -> ApplyOutcome {
        let Some(current) = self.index.get(&entity.id) else {
            debug!(entity = %entity.id, "Update for unknown entity ignored");
            return ApplyOutcome::unchanged();
        };

        if self.awaiting_refresh.remove(&entity.id) {
            debug!(entity = %entity.id, "Refreshed activity after deletion");
            self.store(UiItem::from_entity(entity, activity));
            return self.commit(Vec::new());
        }

        let fresh = match (&activity, &current.last_activity) {
            (Some(new), Some(stored)) => new.timestamp_millis() >= stored.timestamp_millis(),
            _ => true,
        };

        if fresh {
            let activity = activity.or_else(|| current.last_activity.clone());
            self.store(UiItem::from_entity(entity, activity));
            return self.commit(Vec::new());
        }

        debug!(entity = %entity.id, "Stale update, refreshing display fields only");
        if current.avatar == entity.avatar {
            return ApplyOutcome::unchanged();
        }
        let mut item = current.clone();
        item.avatar = entity.avatar;
        self.store(item);
        self.commit(Vec::new())
    }

    pub fn on_entity_deleted(&mut self, id: &EntityId) -> ApplyOutcome {
        self.awaiting_refresh.remove(id);
        let removed = self.discard(id);
        let completed = self.sweeps.observe_deleted(id);

        if !removed && completed.is_empty() {
            debug!(entity = %id, "Delete for unknown entity ignored");
            return ApplyOutcome::unchanged();
        }
        debug!(entity = %id, "Entity deleted");
        self.commit(completed)
    }

    /// Resolve a bulk deletion of activity records.
    ///
    /// On descriptor-backed screens the affected rows are removed. On the
    /// Conversations screen each affected entity's latest remaining
    /// activity is requested from the backend.
    pub fn on_descriptors_deleted<I>(&mut self, descriptor_ids: I) -> ApplyOutcome
    where
        I: IntoIterator<Item = DescriptorId>,
    {
        let deleted: HashSet<DescriptorId> = descriptor_ids.into_iter().collect();
        let affected: Vec<EntityId> = self
            .index
            .iter()
            .filter(|item| {
                item.last_activity
                    .as_ref()
                    .is_some_and(|a| deleted.contains(&a.id))
            })
            .map(|item| item.entity_id)
            .collect();

        if affected.is_empty() {
            debug!(descriptors = deleted.len(), "Deleted descriptors affect no entity");
            return ApplyOutcome::unchanged();
        }

        if self.config.screen.is_descriptor_backed() {
            let mut completed = Vec::new();
            for id in &affected {
                self.discard(id);
                completed.extend(self.sweeps.observe_deleted(id));
            }
            debug!(removed = affected.len(), "Removed rows of deleted descriptors");
            return self.commit(completed);
        }

        for id in affected {
            if self.awaiting_refresh.insert(id) {
                self.outbox.push(BackendRequest::LastDescriptor { entity_id: id });
            }
        }
        debug!(pending = self.awaiting_refresh.len(), "Requested activity refresh");
        ApplyOutcome::unchanged()
    }

    /// Invalidate everything after a workspace switch and request a reload.
    pub fn on_workspace_reset(&mut self) -> ApplyOutcome {
        self.index.clear();
        self.order.clear();
        self.awaiting_refresh.clear();
        self.sweeps.cancel_all();
        self.search.reset();
        self.state = ReducerState::Loading;
        self.outbox.push(BackendRequest::LoadAll);

        info!(screen = %self.config.screen, "Workspace reset");
        self.commit(Vec::new())
    }

    pub fn on_name_search_results(&mut self, query: &str, entries: Vec<EntityEntry>) -> ApplyOutcome {
        let items = entries
            .into_iter()
            .map(|e| UiItem::from_entity(e.entity, e.activity))
            .collect();
        if self.search.accept_name_results(query, items) {
            self.commit(Vec::new())
        } else {
            ApplyOutcome::unchanged()
        }
    }

    pub fn on_content_search_results(
        &mut self,
        query: &str,
        entries: Vec<EntityEntry>,
    ) -> ApplyOutcome {
        let items = entries
            .into_iter()
            .map(|e| UiItem::from_entity(e.entity, e.activity))
            .collect();
        if self.search.accept_content_results(query, items) {
            self.commit(Vec::new())
        } else {
            ApplyOutcome::unchanged()
        }
    }

    // -----------------------------------------------------------------------
    // Delete sweeps
    // -----------------------------------------------------------------------

    /// Start deleting `ids`, one backend request each. Ids not currently
    /// listed are skipped.
    pub fn begin_delete_sweep<I>(&mut self, ids: I) -> SweepHandle
    where
        I: IntoIterator<Item = EntityId>,
    {
        let targets: Vec<EntityId> = ids
            .into_iter()
            .filter(|id| self.index.contains(id))
            .collect();
        for id in &targets {
            self.outbox.push(BackendRequest::Delete { entity_id: *id });
        }
        self.sweeps.begin(targets)
    }

    /// Delete every entity currently listed.
    pub fn begin_delete_all_sweep(&mut self) -> SweepHandle {
        let ids: Vec<EntityId> = self.order.snapshot().iter().map(|i| i.entity_id).collect();
        self.begin_delete_sweep(ids)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Recompute the derived views from the index alone.
    pub fn rebuild(&mut self) -> ApplyOutcome {
        self.order.rebuild_from(self.index.iter().cloned());
        self.commit(Vec::new())
    }

    fn store(&mut self, item: UiItem) {
        self.order.upsert(item.clone());
        self.index.upsert(item);
    }

    fn discard(&mut self, id: &EntityId) -> bool {
        self.order.remove(id);
        self.index.remove(id).is_some()
    }

    fn commit(&mut self, sweeps_completed: Vec<SweepId>) -> ApplyOutcome {
        let snapshot = self.order.snapshot();
        self.grouped = grouping::group(&snapshot, self.config.screen.grouping_rule()).into();
        self.revision += 1;
        for listener in self.listeners.iter_mut() {
            listener(self.revision);
        }
        ApplyOutcome {
            changed: true,
            sweeps_completed,
        }
    }
}

impl Default for EventReducer {
    fn default() -> Self {
        Self::new(ProjectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use courier_shared::{ActivityKind, EntityKind, NotificationType};

    use crate::config::Screen;

    fn contact(name: &str) -> Entity {
        Entity::new(EntityId::new(), EntityKind::Contact, name)
    }

    fn message(ts: i64) -> ActivityDescriptor {
        ActivityDescriptor::at_millis(ActivityKind::Message, ts)
    }

    fn names(reducer: &EventReducer) -> Vec<String> {
        reducer
            .ordered_snapshot()
            .iter()
            .map(|i| i.display_name.clone())
            .collect()
    }

    fn loaded(entries: Vec<(Entity, Option<ActivityDescriptor>)>, screen: Screen) -> EventReducer {
        let mut reducer = EventReducer::new(ProjectionConfig::for_screen(screen));
        reducer.request_bulk_load();
        reducer.on_bulk_load(
            entries
                .into_iter()
                .map(|(e, a)| EntityEntry::new(e, a))
                .collect(),
        );
        reducer.drain_requests();
        reducer
    }

    #[test]
    fn test_state_transitions() {
        let mut reducer = EventReducer::default();
        assert_eq!(reducer.state(), ReducerState::Idle);

        reducer.request_bulk_load();
        assert_eq!(reducer.state(), ReducerState::Loading);
        assert_eq!(reducer.drain_requests(), vec![BackendRequest::LoadAll]);

        reducer.on_bulk_load(Vec::new());
        assert_eq!(reducer.state(), ReducerState::Ready);

        reducer.on_bulk_load(Vec::new());
        assert_eq!(reducer.state(), ReducerState::Ready);

        reducer.on_workspace_reset();
        assert_eq!(reducer.state(), ReducerState::Loading);
        assert_eq!(reducer.drain_requests(), vec![BackendRequest::LoadAll]);
    }

    #[test]
    fn test_tie_break_scenario() {
        let x = contact("X");
        let y = contact("Y").with_score(5.0);
        let z = contact("Z").with_score(10.0);
        let mut reducer = loaded(Vec::new(), Screen::Conversations);

        reducer.on_entity_created(x, Some(message(100)));
        reducer.on_entity_created(y, Some(message(100)));
        reducer.on_entity_created(z, None);

        assert_eq!(names(&reducer), vec!["Y", "X", "Z"]);
    }

    #[test]
    fn test_upsert_replaces_never_duplicates() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = loaded(vec![(alice.clone(), Some(message(10)))], Screen::Conversations);

        let mut renamed = alice;
        renamed.display_name = "Alicia".into();
        reducer.on_entity_updated(renamed, Some(message(20)));

        assert_eq!(reducer.len(), 1);
        assert_eq!(reducer.get(&id).unwrap().display_name, "Alicia");
        assert_eq!(reducer.ordered_snapshot().len(), 1);
        assert_eq!(reducer.current_ordered_grouped_view().len(), 1);
    }

    #[test]
    fn test_monotonicity_guard() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = loaded(vec![(alice.clone(), Some(message(100)))], Screen::Conversations);
        let revision = reducer.revision();

        let outcome = reducer.on_entity_updated(alice, Some(message(99)));

        assert!(!outcome.changed);
        assert_eq!(reducer.revision(), revision);
        let stored = reducer.get(&id).unwrap().last_activity.as_ref().unwrap();
        assert_eq!(stored.timestamp_millis(), 100);
    }

    #[test]
    fn test_stale_update_still_refreshes_avatar() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = loaded(vec![(alice.clone(), Some(message(100)))], Screen::Conversations);

        let outcome = reducer.on_entity_updated(alice.with_avatar("new.png"), Some(message(50)));

        assert!(outcome.changed);
        let item = reducer.get(&id).unwrap();
        assert_eq!(item.avatar.as_deref(), Some("new.png"));
        assert_eq!(item.activity_timestamp(), 100);
    }

    #[test]
    fn test_equal_timestamp_update_is_applied() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = loaded(vec![(alice.clone(), Some(message(100)))], Screen::Conversations);

        reducer.on_entity_updated(alice, Some(message(100).with_payload("edited")));

        let stored = reducer.get(&id).unwrap().last_activity.as_ref().unwrap();
        assert_eq!(stored.payload.as_deref(), Some("edited"));
    }

    #[test]
    fn test_update_without_activity_keeps_stored() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = loaded(vec![(alice.clone(), Some(message(100)))], Screen::Conversations);

        reducer.on_entity_updated(alice.with_score(7.0), None);

        let item = reducer.get(&id).unwrap();
        assert_eq!(item.activity_timestamp(), 100);
        assert_eq!(item.secondary_score, 7.0);
    }

    #[test]
    fn test_unknown_entity_is_noop() {
        let mut reducer = loaded(Vec::new(), Screen::Conversations);
        let revision = reducer.revision();

        assert!(!reducer.on_entity_updated(contact("Ghost"), Some(message(1))).changed);
        assert!(!reducer.on_entity_deleted(&EntityId::new()).changed);
        assert_eq!(reducer.revision(), revision);
        assert!(reducer.is_empty());
    }

    #[test]
    fn test_created_known_entity_still_rerenders() {
        let alice = contact("Alice");
        let mut reducer = loaded(vec![(alice.clone(), Some(message(100)))], Screen::Conversations);
        let revision = reducer.revision();

        let outcome = reducer.on_entity_created(alice, Some(message(1)));

        assert!(outcome.changed);
        assert_eq!(reducer.revision(), revision + 1);
        assert_eq!(reducer.ordered_snapshot()[0].activity_timestamp(), 100);
    }

    #[test]
    fn test_listeners_receive_revision() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        let mut reducer = EventReducer::default();
        reducer.subscribe(Box::new(move |rev| sink.store(rev, Ordering::SeqCst)));

        reducer.on_bulk_load(Vec::new());
        reducer.on_entity_created(contact("a"), None);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(reducer.revision(), 2);
    }

    #[test]
    fn test_bulk_load_replaces_previous_entities() {
        let mut reducer = loaded(vec![(contact("old"), None)], Screen::Conversations);
        reducer.on_bulk_load(vec![EntityEntry::new(contact("new"), None)]);
        assert_eq!(names(&reducer), vec!["new"]);
    }

    #[test]
    fn test_workspace_reset_clears_everything() {
        let a = contact("a");
        let mut reducer = loaded(vec![(a.clone(), None)], Screen::Conversations);
        let sweep = reducer.begin_delete_sweep([a.id]);
        reducer.current_search_view("a", SearchFilter::All);
        reducer.drain_requests();

        reducer.on_workspace_reset();

        assert!(reducer.is_empty());
        assert!(reducer.current_ordered_grouped_view().is_empty());
        assert!(!reducer.sweeps().is_running(sweep.id));
        assert!(!reducer.search().is_active());
    }

    #[test]
    fn test_batch_delete_completes_in_any_order() {
        let (a, b, c) = (contact("a"), contact("b"), contact("c"));
        let ids = [a.id, b.id, c.id];
        let mut reducer = loaded(
            vec![(a, Some(message(3))), (b, Some(message(2))), (c, Some(message(1)))],
            Screen::Conversations,
        );

        let sweep = reducer.begin_delete_sweep(ids);
        assert_eq!(sweep.pending, 3);
        assert_eq!(reducer.drain_requests().len(), 3);

        let d = contact("d");
        let d_id = d.id;
        assert!(reducer.on_entity_created(d, None).sweeps_completed.is_empty());

        assert!(reducer.on_entity_deleted(&ids[2]).sweeps_completed.is_empty());
        assert!(reducer.on_entity_deleted(&ids[0]).sweeps_completed.is_empty());
        let outcome = reducer.on_entity_deleted(&ids[1]);

        assert_eq!(outcome.sweeps_completed, vec![sweep.id]);
        assert_eq!(names(&reducer), vec!["d"]);
        assert!(reducer.get(&d_id).is_some());
    }

    #[test]
    fn test_delete_all_sweep_ignores_later_arrivals() {
        let (a, b) = (contact("a"), contact("b"));
        let (a_id, b_id) = (a.id, b.id);
        let mut reducer = loaded(vec![(a, None), (b, None)], Screen::Conversations);

        let sweep = reducer.begin_delete_all_sweep();
        reducer.on_entity_created(contact("late"), None);

        reducer.on_entity_deleted(&a_id);
        let outcome = reducer.on_entity_deleted(&b_id);

        assert_eq!(outcome.sweeps_completed, vec![sweep.id]);
        assert_eq!(names(&reducer), vec!["late"]);
    }

    #[test]
    fn test_sweep_skips_unknown_ids() {
        let mut reducer = loaded(Vec::new(), Screen::Calls);
        let sweep = reducer.begin_delete_sweep([EntityId::new()]);
        assert_eq!(sweep.pending, 0);
        assert!(reducer.drain_requests().is_empty());
    }

    #[test]
    fn test_bulk_load_completes_sweep_for_vanished_entities() {
        let a = contact("a");
        let mut reducer = loaded(vec![(a.clone(), None)], Screen::Conversations);
        let sweep = reducer.begin_delete_sweep([a.id]);

        let outcome = reducer.on_bulk_load(Vec::new());

        assert_eq!(outcome.sweeps_completed, vec![sweep.id]);
    }

    #[test]
    fn test_descriptor_deletion_requests_refresh() {
        let alice = contact("Alice");
        let bob = contact("Bob");
        let last = message(200);
        let previous = message(100);
        let mut reducer = loaded(
            vec![(alice.clone(), Some(last.clone())), (bob, Some(message(150)))],
            Screen::Conversations,
        );

        let outcome = reducer.on_descriptors_deleted([last.id]);
        assert!(!outcome.changed);
        assert!(reducer.is_awaiting_refresh(&alice.id));
        assert_eq!(
            reducer.drain_requests(),
            vec![BackendRequest::LastDescriptor { entity_id: alice.id }]
        );

        // The older replacement passes the guard because it was requested.
        reducer.on_entity_updated(alice.clone(), Some(previous));
        assert_eq!(names(&reducer), vec!["Bob", "Alice"]);
        assert!(!reducer.is_awaiting_refresh(&alice.id));
    }

    #[test]
    fn test_descriptor_deletion_to_empty_history() {
        let alice = contact("Alice");
        let last = message(200);
        let mut reducer = loaded(vec![(alice.clone(), Some(last.clone()))], Screen::Conversations);

        reducer.on_descriptors_deleted([last.id]);
        reducer.on_entity_updated(alice.clone(), None);

        assert!(reducer.get(&alice.id).unwrap().last_activity.is_none());
    }

    #[test]
    fn test_descriptor_deletion_removes_call_rows() {
        let peer = EntityId::new();
        let call = |ts| {
            (
                Entity::new(EntityId::new(), EntityKind::Call, "Bob").with_subject(peer),
                Some(ActivityDescriptor::at_millis(ActivityKind::Call, ts).incoming()),
            )
        };
        let (first, second) = (call(20), call(10));
        let deleted = first.1.as_ref().unwrap().id;
        let mut reducer = loaded(vec![first, second], Screen::Calls);
        assert_eq!(reducer.current_ordered_grouped_view()[0].count, 2);

        let outcome = reducer.on_descriptors_deleted([deleted]);

        assert!(outcome.changed);
        assert_eq!(reducer.len(), 1);
        assert_eq!(reducer.current_ordered_grouped_view()[0].count, 1);
        assert!(reducer.drain_requests().is_empty());
    }

    #[test]
    fn test_grouped_view_follows_deletes() {
        let subject = EntityId::new();
        let notification = |ts, kind| {
            (
                Entity::new(EntityId::new(), EntityKind::Notification, "Ann").with_subject(subject),
                Some(ActivityDescriptor::at_millis(ActivityKind::Notification(kind), ts)),
            )
        };
        let a = notification(30, NotificationType::NewTextMessage);
        let b = notification(20, NotificationType::MissedAudioCall);
        let c = notification(10, NotificationType::NewTextMessage);
        let b_id = b.0.id;
        let mut reducer = loaded(vec![a, b, c], Screen::Notifications);
        assert_eq!(reducer.current_ordered_grouped_view().len(), 3);

        reducer.on_entity_deleted(&b_id);

        let view = reducer.current_ordered_grouped_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].count, 2);
    }

    #[test]
    fn test_search_round_trip() {
        let mut reducer = loaded(Vec::new(), Screen::Conversations);

        assert!(reducer.current_search_view("an", SearchFilter::All).is_empty());
        assert_eq!(
            reducer.drain_requests(),
            vec![
                BackendRequest::SearchByName { query: "an".into() },
                BackendRequest::SearchByContent { query: "an".into() },
            ]
        );

        let pool: Vec<EntityEntry> = (0..5)
            .map(|i| EntityEntry::new(contact(&format!("Anna {i}")), None))
            .collect();
        assert!(reducer.on_name_search_results("an", pool).changed);

        let sections = reducer.current_search_view("an", SearchFilter::All);
        assert!(reducer.drain_requests().is_empty());
        assert_eq!(sections[0].items.len(), 3);
        assert!(sections[0].footer.is_some());

        reducer.set_section_expanded(SectionKey::Contacts, true);
        let sections = reducer.current_search_view("an", SearchFilter::All);
        assert_eq!(sections[0].items.len(), 5);
        assert!(sections[0].footer.is_none());
    }

    #[test]
    fn test_search_does_not_touch_base_view() {
        let mut reducer = loaded(vec![(contact("Anna"), None)], Screen::Conversations);
        let before = reducer.current_ordered_grouped_view();

        reducer.current_search_view("zzz", SearchFilter::All);
        reducer.on_name_search_results("zzz", Vec::new());

        assert_eq!(&*before, &*reducer.current_ordered_grouped_view());
    }

    #[test]
    fn test_rebuild_reproduces_views() {
        let mut reducer = loaded(
            vec![(contact("a"), Some(message(5))), (contact("b"), Some(message(9)))],
            Screen::Conversations,
        );
        reducer.on_entity_created(contact("c"), Some(message(7)));
        let before = reducer.current_ordered_grouped_view();

        reducer.rebuild();

        assert_eq!(&*before, &*reducer.current_ordered_grouped_view());
    }

    #[test]
    fn test_rebuild_keeps_equal_key_rows_in_place() {
        let mut reducer = EventReducer::default();
        reducer.on_bulk_load(Vec::new());
        for _ in 0..6 {
            reducer.on_entity_created(contact("same"), Some(message(10)));
        }
        let before: Vec<EntityId> = reducer.ordered_snapshot().iter().map(|i| i.entity_id).collect();

        reducer.rebuild();

        let after: Vec<EntityId> = reducer.ordered_snapshot().iter().map(|i| i.entity_id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_apply_dispatches() {
        let alice = contact("Alice");
        let id = alice.id;
        let mut reducer = EventReducer::default();

        reducer.apply(ProjectionEvent::BulkLoaded {
            entries: vec![EntityEntry::new(alice, None)],
        });
        assert_eq!(reducer.len(), 1);

        reducer.apply(ProjectionEvent::EntityDeleted { entity_id: id });
        assert!(reducer.is_empty());

        reducer.apply(ProjectionEvent::WorkspaceReset);
        assert_eq!(reducer.state(), ReducerState::Loading);
    }
}
