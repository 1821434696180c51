use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use exn::ResultExt;
use tracing::instrument;
use vela_cache::{TeacherResource, UnitKey};

use crate::error::{ErrorKind, Result};
use crate::module::{ExportValue, ImplementationModule, ModuleSource, RESOURCES_EXPORT, ResourceModule};

/// File name suffix of resource modules on disk.
const MODULE_FILE_SUFFIX: &str = "-resources.json";

/// In-process registry of unit modules.
///
/// Modules are registered explicitly, or read from a directory of
/// `book{b}-unit{u}-resources.json` files at start-up.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    resources: HashMap<UnitKey, ResourceModule>,
    implementations: HashMap<UnitKey, ImplementationModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary `resources` export of a unit.
    pub fn register_resources(&mut self, key: UnitKey, resources: Vec<TeacherResource>) -> &mut Self {
        self.register_export(key, RESOURCES_EXPORT, ExportValue::Resources(resources))
    }

    /// Set the legacy `book{b}Unit{u}Resources` export of a unit.
    pub fn register_legacy(&mut self, key: UnitKey, resources: Vec<TeacherResource>) -> &mut Self {
        let name = key.legacy_export();
        self.register_export(key, name, ExportValue::Resources(resources))
    }

    /// Set an arbitrary export on a unit's resource module.
    pub fn register_export(&mut self, key: UnitKey, name: impl Into<String>, value: ExportValue) -> &mut Self {
        self.resources.entry(key).or_default().insert(name, value);
        self
    }

    /// Register the `getBook{b}Unit{u}Resources` getter of a unit.
    pub fn register_implementation<F>(&mut self, key: UnitKey, getter: F) -> &mut Self
    where
        F: Fn() -> Vec<TeacherResource> + Send + Sync + 'static,
    {
        let name = key.getter_export();
        let module = self.implementations.remove(&key).unwrap_or_default().with_getter(name, getter);
        self.implementations.insert(key, module);
        self
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitKey> {
        self.resources.keys().chain(self.implementations.keys().filter(|key| !self.resources.contains_key(*key)))
    }

    pub fn len(&self) -> usize {
        self.units().count()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.implementations.is_empty()
    }

    /// Register every `book{b}-unit{u}-resources.json` file in `dir`.
    ///
    /// Other files are ignored. A file that is not a JSON object fails the
    /// whole load; exports with an unexpected shape are kept as
    /// [`ExportValue::Unrecognised`]. Returns the number of modules loaded.
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub async fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut entries =
            tokio::fs::read_dir(dir).await.or_raise(|| ErrorKind::Read(dir.display().to_string()))?;
        let mut loaded = 0;
        while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Read(dir.display().to_string()))? {
            let path = entry.path();
            let Some(key) = path.file_name().and_then(|name| name.to_str()).and_then(module_key) else {
                tracing::debug!(path = %path.display(), "Skipping non-module file");
                continue;
            };
            let bytes = tokio::fs::read(&path).await.or_raise(|| ErrorKind::Read(path.display().to_string()))?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .or_raise(|| ErrorKind::MalformedModule(path.display().to_string()))?;
            let module = ResourceModule::from_json(&key.resources_module(), value)?;
            tracing::debug!(key = %key, path = %path.display(), "Loaded resource module");
            self.resources.insert(key, module);
            loaded += 1;
        }
        tracing::info!(loaded, "Loaded resource modules");
        Ok(loaded)
    }
}

/// `book1-unit2-resources.json` -> `book1-unit2`.
fn module_key(file_name: &str) -> Option<UnitKey> {
    file_name.strip_suffix(MODULE_FILE_SUFFIX)?.parse().ok()
}

#[async_trait]
impl ModuleSource for ModuleRegistry {
    async fn load_resources(&self, key: &UnitKey) -> Result<Option<ResourceModule>> {
        Ok(self.resources.get(key).cloned())
    }

    async fn load_implementation(&self, key: &UnitKey) -> Result<Option<ImplementationModule>> {
        Ok(self.implementations.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vela_cache::ResourceType;

    fn key(book: &str, unit: &str) -> UnitKey {
        UnitKey::new(book, unit).unwrap()
    }

    #[rstest]
    #[case("book1-unit2-resources.json", Some("book1-unit2"))]
    #[case("book0a-unit10-resources.json", Some("book0a-unit10"))]
    #[case("book1-unit2-implementation.json", None)]
    #[case("book1-unit2-resources.json.bak", None)]
    #[case("notes-resources.json", None)]
    fn test_module_key(#[case] file_name: &str, #[case] expected: Option<&str>) {
        assert_eq!(module_key(file_name).map(|k| k.to_string()).as_deref(), expected);
    }

    #[tokio::test]
    async fn test_registrations_are_visible_to_source() {
        let k = key("3", "1");
        let mut registry = ModuleRegistry::new();
        registry
            .register_resources(k.clone(), vec![TeacherResource::new(&k, ResourceType::Video, 1, "Song")])
            .register_legacy(k.clone(), Vec::new())
            .register_implementation(key("3", "2"), Vec::new);

        let module = registry.load_resources(&k).await.unwrap().unwrap();
        assert_eq!(module.resources(RESOURCES_EXPORT).unwrap().len(), 1);
        assert_eq!(module.resources("book3Unit1Resources").unwrap().len(), 0);
        assert!(registry.load_implementation(&k).await.unwrap().is_none());
        assert!(registry.load_implementation(&key("3", "2")).await.unwrap().is_some());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("book2-unit5-resources.json"),
            r#"{"resources": [{"id": "book2-unit5-game1", "bookId": "2", "unitId": "5", "title": "Wordwall", "resourceType": "game"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("book2-unit6-resources.json"),
            r#"{"book2Unit6Resources": [{"id": "x", "title": "Old", "resourceType": "pdf", "fileUrl": "a.pdf"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let mut registry = ModuleRegistry::new();
        assert_eq!(registry.load_dir(dir.path()).await.unwrap(), 2);
        let legacy = registry.load_resources(&key("2", "6")).await.unwrap().unwrap();
        assert_eq!(legacy.resources("book2Unit6Resources").unwrap()[0].title, "Old");
    }

    #[tokio::test]
    async fn test_load_dir_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("book1-unit1-resources.json"), "[not json").unwrap();
        let err = ModuleRegistry::new().load_dir(dir.path()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedModule(_)));
    }

    #[tokio::test]
    async fn test_load_dir_missing() {
        let err = ModuleRegistry::new().load_dir("/nonexistent/vela/modules").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
    }
}
