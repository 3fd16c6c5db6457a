use chrono::{DateTime, Utc};
use std::sync::Arc;

use exam_core::model::{ResultRecord, TestDefinition, TestId};
use exam_core::scorer::score_answers;
use storage::repository::{AttemptRow, ResultRepository, TestRepository};

use super::queries::SessionQueries;
use crate::Clock;
use crate::error::SessionError;

/// Storage identifier for a persisted attempt result.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type ResultId = i64;

/// Presentation-agnostic list item for a persisted result.
///
/// No pre-formatted strings and no localization assumptions; the UI formats
/// timestamps and durations as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultListItem {
    pub id: ResultId,
    pub test_id: TestId,
    pub completed_at: DateTime<Utc>,

    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
    pub time_spent_seconds: u32,
}

/// A persisted attempt re-scored against its test definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub id: ResultId,
    pub completed_at: DateTime<Utc>,
    pub record: ResultRecord,
}

/// Presentation-facing results facade that hides repositories and time from
/// the UI.
///
/// Only the flat answer set is persisted, so every read re-scores the stored
/// answers against the test's answer key — the detailed breakdown always
/// reflects the current definition.
#[derive(Clone)]
pub struct ResultViewService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    results: Arc<dyn ResultRepository>,
}

impl ResultViewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tests: Arc<dyn TestRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            tests,
            results,
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The most recent result for a test, fully re-scored, if any exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TestNotFound` if the attempt references a test
    /// that no longer exists, or `SessionError::Storage` on repository
    /// failures.
    pub async fn latest_result(
        &self,
        test_id: TestId,
    ) -> Result<Option<ResultView>, SessionError> {
        let Some(row) = SessionQueries::latest_result(test_id, self.results.as_ref()).await?
        else {
            return Ok(None);
        };
        let test = self.load_test(test_id).await?;
        Ok(Some(rescore_row(&test, row)))
    }

    /// Fetch one persisted result by id, fully re-scored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the attempt is missing, or
    /// `SessionError::TestNotFound` if its test no longer exists.
    pub async fn get_result(&self, id: ResultId) -> Result<ResultView, SessionError> {
        let record = SessionQueries::get_result(id, self.results.as_ref()).await?;
        let test = self.load_test(record.test_id).await?;
        Ok(rescore_row(&test, AttemptRow::new(id, record)))
    }

    /// Recent results for a test as lightweight list items.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TestNotFound` or `SessionError::Storage` as for
    /// [`ResultViewService::latest_result`].
    pub async fn list_recent_results(
        &self,
        test_id: TestId,
        days: i64,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, SessionError> {
        let now = self.clock.now();
        let rows = SessionQueries::list_recent_results(
            test_id,
            self.results.as_ref(),
            now,
            days,
            limit,
        )
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let test = self.load_test(test_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let view = rescore_row(&test, row);
                let score = view.record.score();
                ResultListItem {
                    id: view.id,
                    test_id,
                    completed_at: view.completed_at,
                    correct: score.correct(),
                    total: score.total(),
                    percentage: score.percentage(),
                    time_spent_seconds: view.record.time_spent_seconds(),
                }
            })
            .collect())
    }

    async fn load_test(&self, test_id: TestId) -> Result<TestDefinition, SessionError> {
        self.tests
            .get_test(test_id)
            .await?
            .ok_or(SessionError::TestNotFound(test_id))
    }
}

fn rescore_row(test: &TestDefinition, row: AttemptRow) -> ResultView {
    let record = score_answers(test, &row.record.answers, row.record.time_spent_seconds);
    ResultView {
        id: row.id,
        completed_at: row.record.completed_at,
        record,
    }
}
