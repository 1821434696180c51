//! Teacher resource models and the in-memory resource cache.
//!
//! The cache is not the source of truth - the unit modules are. It only
//! remembers the last successful resolution for each book/unit so repeated
//! navigation does not reload the same module. If it is cleared, every entry
//! can be rebuilt by resolving the unit again.
//!
//! # Architecture
//! - **UnitKey**: identifies a book/unit pair and derives every name used to
//!   find its resources (cache key, module names, export names).
//! - **TeacherResource**: one video, game, PDF or lesson attached to a unit.
//! - **ResourceCache**: `UnitKey -> Arc<[TeacherResource]>`, owned by whoever
//!   owns the resolver. No TTL, no size bound, no eviction.

pub mod error;
pub mod models;
mod store;

pub use crate::models::{LessonPlan, Location, ResourceType, TeacherResource, UnitKey};
pub use crate::store::{EntryInfo, ResourceCache};
