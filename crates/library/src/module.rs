//! The module-loading boundary.
//!
//! Unit data lives in two conventionally named modules per unit:
//! `book{b}-unit{u}-resources`, exporting a `resources` list (or, in older
//! modules, a `book{b}Unit{u}Resources` list), and
//! `book{b}-unit{u}-implementation`, exporting a `getBook{b}Unit{u}Resources`
//! getter. A [`ModuleSource`] hands those modules to the resolver.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use vela_cache::{TeacherResource, UnitKey};

use crate::error::{ErrorKind, Result};

/// Export name of the primary resource list.
pub const RESOURCES_EXPORT: &str = "resources";

/// Loads unit modules by [`UnitKey`].
///
/// `Ok(None)` means the module does not exist, which is an ordinary outcome.
/// `Err` means the source itself failed; the resolver logs it and moves on
/// to the next strategy.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn load_resources(&self, key: &UnitKey) -> Result<Option<ResourceModule>>;
    async fn load_implementation(&self, key: &UnitKey) -> Result<Option<ImplementationModule>>;
}

pub type ModuleSourceHandle = Arc<dyn ModuleSource + Send + Sync>;

/// Value of a named export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Resources(Vec<TeacherResource>),
    /// Anything that is not a resource list. Kept so the export is known to
    /// exist, but never used as data.
    Unrecognised(Value),
}

impl From<Value> for ExportValue {
    fn from(value: Value) -> Self {
        match serde_json::from_value::<Vec<TeacherResource>>(value.clone()) {
            Ok(resources) => Self::Resources(resources),
            Err(error) => {
                tracing::debug!(%error, "Export is not a resource list");
                Self::Unrecognised(value)
            },
        }
    }
}

/// A loaded `-resources` module: named exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceModule {
    exports: HashMap<String, ExportValue>,
}

impl ResourceModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export(mut self, name: impl Into<String>, value: ExportValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ExportValue) {
        self.exports.insert(name.into(), value);
    }

    pub fn export(&self, name: &str) -> Option<&ExportValue> {
        self.exports.get(name)
    }

    /// The named export, if it is a resource list.
    pub fn resources(&self, name: &str) -> Option<&[TeacherResource]> {
        match self.exports.get(name)? {
            ExportValue::Resources(resources) => Some(resources),
            ExportValue::Unrecognised(_) => None,
        }
    }

    /// Build a module from a JSON object of named exports. `name` only
    /// labels the error.
    pub fn from_json(name: &str, value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            exn::bail!(ErrorKind::MalformedModule(name.to_string()));
        };
        Ok(Self {
            exports: map.into_iter().map(|(export, value)| (export, ExportValue::from(value))).collect(),
        })
    }
}

/// Getter exported by an `-implementation` module.
pub type ResourceGetter = Arc<dyn Fn() -> Vec<TeacherResource> + Send + Sync>;

/// A loaded `-implementation` module: named getter functions.
#[derive(Clone, Default)]
pub struct ImplementationModule {
    getters: HashMap<String, ResourceGetter>,
}

impl ImplementationModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn() -> Vec<TeacherResource> + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    pub fn getter(&self, name: &str) -> Option<&ResourceGetter> {
        self.getters.get(name)
    }
}

impl Debug for ImplementationModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut names: Vec<&str> = self.getters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ImplementationModule").field("getters", &names).finish()
    }
}
