use async_trait::async_trait;
use exn::ResultExt;
use serde_json::Value;
use tracing::instrument;
use vela_cache::UnitKey;
use vela_storage::AssetClient;
use vela_storage::error::ErrorKind as StorageErrorKind;

use crate::error::{ErrorKind, Result};
use crate::module::{ImplementationModule, ModuleSource, ResourceModule};

/// Default bucket directory holding `-resources.json` modules.
pub const DEFAULT_MODULE_PREFIX: &str = "modules";

/// [`ModuleSource`] reading `{prefix}/book{b}-unit{u}-resources.json` from
/// the asset bucket.
///
/// Implementation modules are code, so the bucket never has one.
#[derive(Clone)]
pub struct BucketModuleSource {
    client: AssetClient,
    prefix: String,
}

impl BucketModuleSource {
    pub fn new(client: AssetClient) -> Self {
        Self::with_prefix(client, DEFAULT_MODULE_PREFIX)
    }

    pub fn with_prefix(client: AssetClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    fn module_path(&self, key: &UnitKey) -> String {
        match self.prefix.as_str() {
            "" => format!("{}.json", key.resources_module()),
            prefix => format!("{prefix}/{}.json", key.resources_module()),
        }
    }
}

#[async_trait]
impl ModuleSource for BucketModuleSource {
    #[instrument(skip(self), fields(key = %key))]
    async fn load_resources(&self, key: &UnitKey) -> Result<Option<ResourceModule>> {
        let path = self.module_path(key);
        // A missing module is settled by one HEAD. Probe failures fall
        // through to the retried fetch.
        match self.client.probe(&path).await {
            Ok(true) => {},
            Ok(false) => {
                tracing::debug!(path = %path, "No resource module in bucket");
                return Ok(None);
            },
            Err(error) => tracing::debug!(path = %path, error = %*error, "Module probe failed, fetching anyway"),
        }
        let value = match self.client.fetch_json::<Value>(&path).await {
            Ok(value) => value,
            Err(error) if matches!(&*error, StorageErrorKind::NotFound(_)) => {
                tracing::debug!(path = %path, "No resource module in bucket");
                return Ok(None);
            },
            Err(error) => return Err(error).or_raise(|| ErrorKind::SourceUnavailable(path)),
        };
        ResourceModule::from_json(&path, value).map(Some)
    }

    async fn load_implementation(&self, _key: &UnitKey) -> Result<Option<ImplementationModule>> {
        Ok(None)
    }
}
