//! Unit resource resolution.
//!
//! Given a book/unit [`UnitKey`](vela_cache::UnitKey), the [`Resolver`]
//! finds the unit's teacher resources by trying, in order, the resource
//! cache, the primary module export, the legacy export and finally the
//! implementation module getter. Modules come from a [`ModuleSource`]: an
//! in-process [`ModuleRegistry`] (optionally loaded from a directory of JSON
//! modules) or the asset bucket through [`BucketModuleSource`].

mod bucket;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod module;
mod registry;
mod resolve;

pub use crate::bucket::{BucketModuleSource, DEFAULT_MODULE_PREFIX};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockModuleSource;
pub use crate::module::{
    ExportValue, ImplementationModule, ModuleSource, ModuleSourceHandle, RESOURCES_EXPORT, ResourceGetter,
    ResourceModule,
};
pub use crate::registry::ModuleRegistry;
pub use crate::resolve::{EVENT_CHANNEL_CAPACITY, PreloadEvent, PreloadHandle, ResolveEvent, Resolver, Strategy};
