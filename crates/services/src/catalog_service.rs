use std::sync::Arc;

use exam_core::model::{TestDefinition, TestId};
use storage::repository::TestRepository;
use tracing::debug;

use crate::error::CatalogError;

/// Lightweight catalog entry for the browse view: everything a test card
/// shows without loading the question list into the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub id: TestId,
    pub title: String,
    pub category: String,
    pub level: String,
    pub question_count: usize,
    pub duration_seconds: u32,
}

impl TestSummary {
    #[must_use]
    pub fn from_definition(test: &TestDefinition) -> Self {
        Self {
            id: test.id(),
            title: test.title().to_owned(),
            category: test.category().to_owned(),
            level: test.level().to_owned(),
            question_count: test.question_count(),
            duration_seconds: test.duration_seconds(),
        }
    }
}

/// Read access to the test catalog for the browse/overview surfaces.
#[derive(Clone)]
pub struct CatalogService {
    tests: Arc<dyn TestRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(tests: Arc<dyn TestRepository>) -> Self {
        Self { tests }
    }

    /// List catalog entries ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_tests(&self, limit: u32) -> Result<Vec<TestSummary>, CatalogError> {
        let tests = self.tests.list_tests(limit).await?;
        debug!(count = tests.len(), "listed catalog");
        Ok(tests.iter().map(TestSummary::from_definition).collect())
    }

    /// List catalog entries in one category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_tests_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<TestSummary>, CatalogError> {
        let tests = self.tests.list_tests_by_category(category).await?;
        Ok(tests.iter().map(TestSummary::from_definition).collect())
    }

    /// Fetch a full test definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TestNotFound` for an unknown id, or
    /// `CatalogError::Storage` on repository failures.
    pub async fn get_test(&self, id: TestId) -> Result<TestDefinition, CatalogError> {
        self.tests
            .get_test(id)
            .await?
            .ok_or(CatalogError::TestNotFound(id))
    }
}
