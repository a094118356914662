use anyhow::{Context, Result, bail};
use std::{path::PathBuf, sync::Arc};

use alertmap::{AlertService, AppConfig, CategoryCatalog, MemoryStore, RedisStore, StorageBackend};

/// Effective configuration for one CLI invocation: the config file plus flag overrides.
pub struct RuntimeContext {
    pub config: AppConfig,
    pub config_path: Option<PathBuf>,
}

/// A service wired to whichever backend the configuration selects.
pub enum Backend {
    Memory(AlertService<MemoryStore>),
    Redis(AlertService<RedisStore>),
}

impl RuntimeContext {
    pub fn load(config_path: Option<PathBuf>, backend: Option<StorageBackend>) -> Result<Self> {
        let mut config = AppConfig::load_or_default(config_path.as_deref())?;
        if let Some(backend) = backend {
            config.storage.backend = backend;
        }
        Ok(Self { config, config_path })
    }

    pub fn catalog(&self) -> Arc<CategoryCatalog> {
        Arc::new(CategoryCatalog::builtin())
    }

    pub fn backend(&self) -> StorageBackend {
        self.config.storage.backend
    }

    pub async fn redis_store(&self) -> Result<RedisStore> {
        let url = self.config.storage.redis_url()?;
        RedisStore::connect(&url, self.config.storage.prefix.clone())
            .await
            .with_context(|| format!("Failed to connect to Redis at {url}"))
    }

    /// Fails unless the configured backend keeps data between invocations.
    pub fn ensure_persistent(&self, command: &str) -> Result<()> {
        if self.backend() == StorageBackend::Memory {
            bail!("'{command}' reads stored data; the in-memory backend starts empty on every run. Use --backend redis");
        }
        Ok(())
    }

    /// Service over Redis for commands that read stored data.
    pub async fn persistent_service(&self, command: &str) -> Result<AlertService<RedisStore>> {
        self.ensure_persistent(command)?;
        Ok(AlertService::new(self.redis_store().await?, self.catalog()))
    }

    pub async fn open(&self) -> Result<Backend> {
        Ok(match self.backend() {
            StorageBackend::Memory => Backend::Memory(AlertService::new(MemoryStore::new(), self.catalog())),
            StorageBackend::Redis => Backend::Redis(AlertService::new(self.redis_store().await?, self.catalog())),
        })
    }
}
