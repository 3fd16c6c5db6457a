use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::sessions::{AttemptService, ResultViewService};

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    attempts: Arc<AttemptService>,
    results: Arc<ResultViewService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.tests)));
        let attempts = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.tests),
            Arc::clone(&storage.results),
        ));
        let results = Arc::new(ResultViewService::new(
            clock,
            Arc::clone(&storage.tests),
            Arc::clone(&storage.results),
        ));

        Self {
            catalog,
            attempts,
            results,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultViewService> {
        Arc::clone(&self.results)
    }
}
