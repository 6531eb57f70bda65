use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cabinet_core::{Config, ObjectStorageProvider, StorageConnection};

use crate::error::ObjectStorageResult;
use crate::lakefs::LakeFsStorage;
use crate::memory::InMemoryObjectStorage;
use crate::retry::RetryPolicy;
use crate::s3::S3CompatibleStorage;
use crate::traits::ObjectStorage;

const LAKEFS_TIMEOUT: Duration = Duration::from_secs(30);

/// One adapter per provider; connections are routed by their `provider`.
#[derive(Clone, Default)]
pub struct ObjectStorageRegistry {
    adapters: HashMap<ObjectStorageProvider, Arc<dyn ObjectStorage>>,
}

impl ObjectStorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, adapter: Arc<dyn ObjectStorage>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    /// S3-compatible adapters for Garage, OxiCloud and MinIO plus LakeFS.
    pub fn from_config(config: &Config) -> ObjectStorageResult<Self> {
        let retry = RetryPolicy::from_config(config);
        let mut registry = Self::new();
        for flavor in [
            ObjectStorageProvider::Garage,
            ObjectStorageProvider::OxiCloud,
            ObjectStorageProvider::Minio,
        ] {
            registry = registry.register(Arc::new(S3CompatibleStorage::new(flavor, retry)?));
        }
        registry = registry.register(Arc::new(LakeFsStorage::new(retry, LAKEFS_TIMEOUT)));

        tracing::info!(
            attempts = retry.attempts,
            base_delay_ms = retry.base_delay.as_millis() as u64,
            "Object storage adapters registered"
        );
        Ok(registry)
    }

    /// Every provider backed by [`InMemoryObjectStorage`].
    pub fn in_memory() -> Self {
        [
            ObjectStorageProvider::Garage,
            ObjectStorageProvider::OxiCloud,
            ObjectStorageProvider::Minio,
            ObjectStorageProvider::LakeFs,
        ]
        .into_iter()
        .fold(Self::new(), |registry, provider| {
            registry.register(Arc::new(InMemoryObjectStorage::new(provider)))
        })
    }

    pub fn get(&self, provider: ObjectStorageProvider) -> Option<Arc<dyn ObjectStorage>> {
        self.adapters.get(&provider).cloned()
    }

    pub fn for_connection(&self, conn: &StorageConnection) -> Option<Arc<dyn ObjectStorage>> {
        self.get(conn.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinet_core::CabinetConfig;

    #[test]
    fn test_from_config_registers_every_provider() {
        let config = Config(Box::new(CabinetConfig::default()));
        let registry = ObjectStorageRegistry::from_config(&config).unwrap();
        for provider in [
            ObjectStorageProvider::Garage,
            ObjectStorageProvider::OxiCloud,
            ObjectStorageProvider::Minio,
            ObjectStorageProvider::LakeFs,
        ] {
            assert_eq!(registry.get(provider).unwrap().provider(), provider);
        }
    }

    #[test]
    fn test_empty_registry_has_no_adapter() {
        assert!(ObjectStorageRegistry::new()
            .get(ObjectStorageProvider::Minio)
            .is_none());
    }
}
