//! # courier-projection
//!
//! Event-driven list projection behind the Conversations, Calls and
//! Notifications screens.
//!
//! A single [`EventReducer`] per screen consumes backend events one at a
//! time and keeps an [`EntityIndex`] and an [`OrderedProjection`] in sync.
//! The grouped view is derived from the ordered snapshot by the
//! [`grouping`] pass, and search results are rendered separately by the
//! [`SearchOverlay`] without touching the base projection.

pub mod config;
pub mod events;
pub mod grouping;
pub mod index;
pub mod item;
pub mod order;
pub mod present;
pub mod reducer;
pub mod search;
pub mod sweep;

pub use config::{ProjectionConfig, Screen};
pub use events::{ApplyOutcome, BackendRequest, EntityEntry, ProjectionEvent};
pub use grouping::{GroupKey, GroupedItem, GroupingRule};
pub use index::EntityIndex;
pub use item::UiItem;
pub use order::{OrderedProjection, SortKey};
pub use present::{present, Icon, Presentation};
pub use reducer::{ChangeListener, EventReducer, ReducerState};
pub use search::{
    SearchFilter, SearchOverlay, SearchPools, SearchSection, SectionFooter, SectionHeader, SectionKey,
};
pub use sweep::{SweepHandle, SweepId, SweepTracker};
