//! # courier-shared
//!
//! Domain types shared by the projection engine and its hosts: identity
//! newtypes, the backend-owned [`Entity`](entity::Entity) and its
//! [`ActivityDescriptor`](entity::ActivityDescriptor), and crate-wide
//! constants.

pub mod constants;
pub mod entity;
pub mod error;
pub mod types;

pub use entity::*;
pub use error::{Result, SharedError};
pub use types::{DescriptorId, EntityId};
