use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{OptionId, QuestionId, ResultRecord, TestDefinition, TestId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a completed attempt.
///
/// This is the flat record the results view needs: the finalized answer set
/// and the time spent. Score and breakdown are recomputed from the test's
/// answer key on read, so the stored artifact stays minimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub test_id: TestId,
    pub answers: BTreeMap<QuestionId, OptionId>,
    pub time_spent_seconds: u32,
    pub completed_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Flatten a scored result into its persisted shape.
    #[must_use]
    pub fn from_result(record: &ResultRecord, completed_at: DateTime<Utc>) -> Self {
        Self {
            test_id: record.test_id(),
            answers: record.answers().clone(),
            time_spent_seconds: record.time_spent_seconds(),
            completed_at,
        }
    }
}

/// A persisted attempt together with its storage row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: i64,
    pub record: AttemptRecord,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: i64, record: AttemptRecord) -> Self {
        Self { id, record }
    }
}

/// Repository contract for the test catalog.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Persist or update a test definition, replacing its question set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the definition cannot be stored.
    async fn upsert_test(&self, test: &TestDefinition) -> Result<(), StorageError>;

    /// Fetch a test definition by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing test is `Ok(None)`.
    async fn get_test(&self, id: TestId) -> Result<Option<TestDefinition>, StorageError>;

    /// List test definitions ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_tests(&self, limit: u32) -> Result<Vec<TestDefinition>, StorageError>;

    /// List test definitions in a category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_tests_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<TestDefinition>, StorageError>;
}

/// Repository contract for completed attempt results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a completed attempt and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_result(&self, record: &AttemptRecord) -> Result<i64, StorageError>;

    /// Fetch a persisted attempt by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<AttemptRecord, StorageError>;

    /// The most recently completed attempt for a test, if any.
    ///
    /// This is the durable "latest result" slot the results view reads.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn latest_result(&self, test_id: TestId) -> Result<Option<AttemptRow>, StorageError>;

    /// List attempts for a test, most recent first, within an optional
    /// completion range.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_results(
        &self,
        test_id: TestId,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tests: Arc<Mutex<HashMap<TestId, TestDefinition>>>,
    results: Arc<Mutex<Vec<AttemptRow>>>,
    next_result_id: Arc<AtomicI64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tests: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            next_result_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn upsert_test(&self, test: &TestDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(test.id(), test.clone());
        Ok(())
    }

    async fn get_test(&self, id: TestId) -> Result<Option<TestDefinition>, StorageError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_tests(&self, limit: u32) -> Result<Vec<TestDefinition>, StorageError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut tests: Vec<TestDefinition> = guard.values().cloned().collect();
        tests.sort_by_key(TestDefinition::id);
        tests.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(tests)
    }

    async fn list_tests_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<TestDefinition>, StorageError> {
        let guard = self
            .tests
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut tests: Vec<TestDefinition> = guard
            .values()
            .filter(|test| test.category() == category)
            .cloned()
            .collect();
        tests.sort_by_key(TestDefinition::id);
        Ok(tests)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, record: &AttemptRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = self.next_result_id.fetch_add(1, Ordering::SeqCst);
        guard.push(AttemptRow::new(id, record.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<AttemptRecord, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.record.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn latest_result(&self, test_id: TestId) -> Result<Option<AttemptRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|row| row.record.test_id == test_id)
            .max_by_key(|row| (row.record.completed_at, row.id))
            .cloned())
    }

    async fn list_results(
        &self,
        test_id: TestId,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|row| row.record.test_id == test_id)
            .filter(|row| completed_from.is_none_or(|from| row.record.completed_at >= from))
            .filter(|row| completed_until.is_none_or(|until| row.record.completed_at <= until))
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse((row.record.completed_at, row.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates catalog and result repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let tests: Arc<dyn TestRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { tests, results }
    }
}
