use std::sync::Arc;
use std::time::Instant;

use crate::batch::BatchProcessor;
use crate::config::Settings;
use crate::error::AppError;
use crate::functions::FunctionRegistry;
use crate::store::{create_object_store, ObjectStore};
use crate::template::{TemplateCache, TemplateEngine, TemplateResolver};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub cache: Arc<TemplateCache>,
    pub processor: Arc<BatchProcessor>,
    pub start_time: Instant,
}

impl AppState {
    /// Build state with the store backend named in `settings`.
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let store = create_object_store(&settings.store)?;
        Ok(Self::with_store(settings, store))
    }

    /// Build state around an existing store.
    pub fn with_store(settings: Settings, store: Arc<dyn ObjectStore>) -> Self {
        let cache = Arc::new(TemplateCache::new(store, settings.templates.cache_ttl()));
        let resolver = Arc::new(TemplateResolver::from_settings(cache.clone(), &settings));
        let engine = TemplateEngine::new(&FunctionRegistry::default());
        let processor = Arc::new(BatchProcessor::new(
            resolver,
            engine,
            settings.application_version.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            cache,
            processor,
            start_time: Instant::now(),
        }
    }
}
