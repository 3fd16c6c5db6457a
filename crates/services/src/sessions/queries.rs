use chrono::{DateTime, Utc};

use exam_core::model::TestId;
use storage::repository::{AttemptRecord, AttemptRow, ResultRepository, TestRepository};

use super::service::ExamSession;
use crate::error::SessionError;

/// Storage-backed session and result queries.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Build a fresh session from a stored test definition.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TestNotFound` if the id is unknown, or
    /// `SessionError::Storage` when repository access fails. A malformed
    /// stored definition surfaces as a storage serialization error, before
    /// any session state exists.
    pub async fn start_from_storage(
        test_id: TestId,
        tests: &dyn TestRepository,
    ) -> Result<ExamSession, SessionError> {
        let test = tests
            .get_test(test_id)
            .await?
            .ok_or(SessionError::TestNotFound(test_id))?;
        Ok(ExamSession::new(test))
    }

    /// Fetch the most recent persisted attempt for a test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn latest_result(
        test_id: TestId,
        results: &dyn ResultRepository,
    ) -> Result<Option<AttemptRow>, SessionError> {
        let row = results.latest_result(test_id).await?;
        Ok(row)
    }

    /// Fetch a persisted attempt by row id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the attempt is missing or storage
    /// fails.
    pub async fn get_result(
        id: i64,
        results: &dyn ResultRepository,
    ) -> Result<AttemptRecord, SessionError> {
        let record = results.get_result(id).await?;
        Ok(record)
    }

    /// List persisted attempts for a test within a default time window,
    /// most recent first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent_results(
        test_id: TestId,
        results: &dyn ResultRepository,
        now: DateTime<Utc>,
        days: i64,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, SessionError> {
        let from = now - chrono::Duration::days(days);
        let rows = results
            .list_results(test_id, Some(from), Some(now), limit)
            .await?;
        Ok(rows)
    }
}
