//! Storage backend registry
//!
//! Backends are looked up by the `backend` name of a storage configuration.
//! The built-in names are `filesystem` and `objectstore`; further backends can
//! be registered under their own names.

#[cfg(feature = "storage-filesystem")]
use crate::FilesystemStorage;
#[cfg(feature = "storage-objectstore")]
use crate::ObjectStoreStorage;
use crate::{Storage, StorageBackend, StorageResult};
use affix_core::{ConfigError, RuntimeConfig, StorageConfig};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor registered for a backend name.
pub type StorageFactory =
    Arc<dyn Fn(&StorageConfig, &RuntimeConfig) -> StorageResult<Arc<dyn Storage>> + Send + Sync>;

/// Registry mapping backend names to constructors.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    factories: HashMap<String, StorageFactory>,
}

impl StorageRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend compiled into this build.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "storage-filesystem")]
        registry.register(StorageBackend::Filesystem.as_str(), |config, runtime| {
            let root = config
                .root
                .clone()
                .unwrap_or_else(|| runtime.storage_root.clone());
            Ok(Arc::new(FilesystemStorage::new(root)) as Arc<dyn Storage>)
        });

        #[cfg(feature = "storage-objectstore")]
        registry.register(StorageBackend::ObjectStore.as_str(), |config, runtime| {
            Ok(Arc::new(ObjectStoreStorage::new(config, runtime)?) as Arc<dyn Storage>)
        });

        registry
    }

    /// Register a constructor, replacing any previous one under the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&StorageConfig, &RuntimeConfig) -> StorageResult<Arc<dyn Storage>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into().to_lowercase(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered backend names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct the backend named by `config.backend`.
    pub fn create(
        &self,
        config: &StorageConfig,
        runtime: &RuntimeConfig,
    ) -> StorageResult<Arc<dyn Storage>> {
        let factory = self
            .factories
            .get(&config.backend.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownStorageBackend {
                name: config.backend.clone(),
            })?;

        let storage = factory(config, runtime)?;

        tracing::debug!(
            backend = %config.backend,
            "Storage backend created"
        );

        Ok(storage)
    }
}

/// Create a storage backend from the built-in registry
pub fn create_storage(
    config: &StorageConfig,
    runtime: &RuntimeConfig,
) -> StorageResult<Arc<dyn Storage>> {
    StorageRegistry::with_builtins().create(config, runtime)
}
