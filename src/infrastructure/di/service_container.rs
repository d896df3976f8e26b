//! Service container for dependency injection
//!
//! Wires up the code store, the root cache and the code service.

use std::sync::Arc;

use crate::application::services::CodeService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::CodeTree;
use crate::infrastructure::traits::{CodeRepository, FileSystem, RealFileSystem};
use crate::infrastructure::{FileCodeRepository, InMemoryCodeRepository, TtlCache};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Code store
    pub repository: Arc<dyn CodeRepository>,

    /// Root-code cache shared by every service instance
    pub cache: Arc<TtlCache<CodeTree>>,

    /// Code management service
    pub codes: CodeService,
}

impl ServiceContainer {
    /// Create a container backed by the configured data file.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        Self::with_fs(settings, Arc::new(RealFileSystem))
    }

    /// Create a container backed by the data file, read through `fs`.
    pub fn with_fs(settings: Settings, fs: Arc<dyn FileSystem>) -> ApplicationResult<Self> {
        let repository = FileCodeRepository::open(fs, &settings.data_file)?;
        Ok(Self::with_deps(settings, Arc::new(repository)))
    }

    /// Create a container with an in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(InMemoryCodeRepository::new()))
    }

    /// Create a container with a custom store (for testing).
    pub fn with_deps(settings: Settings, repository: Arc<dyn CodeRepository>) -> Self {
        let cache = Arc::new(TtlCache::from_settings(&settings.cache));
        let codes = CodeService::new(repository.clone(), cache.clone());
        let settings = Arc::new(settings);

        Self {
            settings,
            repository,
            cache,
            codes,
        }
    }
}
