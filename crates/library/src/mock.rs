//! Test double for [`ModuleSource`].
//!
//! ```ignore
//! let source = MockModuleSource::default()
//!     .with_resources(key.clone(), vec![resource])
//!     .with_delay(Duration::from_millis(50));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vela_cache::{TeacherResource, UnitKey};

use crate::error::{ErrorKind, Result};
use crate::module::{ExportValue, ImplementationModule, ModuleSource, RESOURCES_EXPORT, ResourceModule};

/// In-memory [`ModuleSource`] that counts every load.
///
/// An optional delay is slept (on the Tokio clock) before each load, after
/// the call has been counted.
#[derive(Debug, Default)]
pub struct MockModuleSource {
    resources: HashMap<UnitKey, ResourceModule>,
    implementations: HashMap<UnitKey, ImplementationModule>,
    fail_resources: bool,
    fail_implementations: bool,
    delay: Option<Duration>,
    resource_loads: AtomicUsize,
    implementation_loads: AtomicUsize,
}

impl MockModuleSource {
    pub fn with_module(mut self, key: UnitKey, module: ResourceModule) -> Self {
        self.resources.insert(key, module);
        self
    }

    /// Shorthand for a module with only the primary `resources` export.
    pub fn with_resources(self, key: UnitKey, resources: Vec<TeacherResource>) -> Self {
        let module = ResourceModule::new().with_export(RESOURCES_EXPORT, ExportValue::Resources(resources));
        self.with_module(key, module)
    }

    pub fn with_implementation(mut self, key: UnitKey, module: ImplementationModule) -> Self {
        self.implementations.insert(key, module);
        self
    }

    /// Every `load_resources` call fails.
    pub fn failing_resources(mut self) -> Self {
        self.fail_resources = true;
        self
    }

    /// Every `load_implementation` call fails.
    pub fn failing_implementations(mut self) -> Self {
        self.fail_implementations = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn resource_loads(&self) -> usize {
        self.resource_loads.load(Ordering::SeqCst)
    }

    pub fn implementation_loads(&self) -> usize {
        self.implementation_loads.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ModuleSource for MockModuleSource {
    async fn load_resources(&self, key: &UnitKey) -> Result<Option<ResourceModule>> {
        self.resource_loads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_resources {
            exn::bail!(ErrorKind::SourceUnavailable(key.resources_module()));
        }
        Ok(self.resources.get(key).cloned())
    }

    async fn load_implementation(&self, key: &UnitKey) -> Result<Option<ImplementationModule>> {
        self.implementation_loads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_implementations {
            exn::bail!(ErrorKind::SourceUnavailable(key.implementation_module()));
        }
        Ok(self.implementations.get(key).cloned())
    }
}
