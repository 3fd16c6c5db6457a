use std::sync::Arc;

use exam_core::model::{OptionId, QuestionId, ResultRecord, SessionStatus, TestId};
use exam_core::scorer::ScoreError;
use storage::repository::{AttemptRecord, ResultRepository, TestRepository};
use tracing::{info, warn};

use super::queries::SessionQueries;
use super::service::ExamSession;
use crate::Clock;
use crate::error::SessionError;

/// Result of driving a session through an operation that may finish it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub status: SessionStatus,
    /// Storage row id of the persisted result, set once completed.
    pub result_id: Option<i64>,
    /// The scored record, present once the session is completed.
    pub record: Option<ResultRecord>,
}

/// Orchestrates attempt start, completion, and result persistence.
///
/// Navigation and answer recording go straight to [`ExamSession`]; this
/// service wraps the operations that can finish a session so the scored
/// result is persisted exactly once on the transition into `Completed`.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    results: Arc<dyn ResultRepository>,
}

impl AttemptService {
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

    /// Start a new attempt for the given test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TestNotFound` for an unknown id, or
    /// `SessionError::Storage` on repository failures.
    pub async fn start_attempt(&self, test_id: TestId) -> Result<ExamSession, SessionError> {
        let session = SessionQueries::start_from_storage(test_id, self.tests.as_ref()).await?;
        info!(test = %test_id, questions = session.test().question_count(), "attempt started");
        Ok(session)
    }

    /// Record an answer on the session.
    ///
    /// Thin delegate kept for symmetry with the completing operations.
    ///
    /// # Errors
    ///
    /// Propagates [`ExamSession::record_answer`] errors.
    pub fn record_answer(
        &self,
        session: &mut ExamSession,
        question: QuestionId,
        option: OptionId,
    ) -> Result<SessionStatus, SessionError> {
        session.record_answer(question, option)
    }

    /// Submit the attempt, persisting the result if it completes.
    ///
    /// # Errors
    ///
    /// Propagates session transition errors and persistence failures.
    pub async fn submit(&self, session: &mut ExamSession) -> Result<AttemptOutcome, SessionError> {
        session.submit()?;
        self.seal_if_completed(session).await
    }

    /// Confirm a pending submission, persisting the result.
    ///
    /// # Errors
    ///
    /// Propagates session transition errors and persistence failures.
    pub async fn confirm_submit(
        &self,
        session: &mut ExamSession,
    ) -> Result<AttemptOutcome, SessionError> {
        session.confirm_submit()?;
        self.seal_if_completed(session).await
    }

    /// Advance the countdown by one second, persisting the result on timeout.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the timeout result cannot be
    /// persisted; the tick itself never fails.
    pub async fn tick(&self, session: &mut ExamSession) -> Result<AttemptOutcome, SessionError> {
        let was_complete = session.is_complete();
        session.tick();
        if session.is_complete() && !was_complete {
            warn!(test = %session.test().id(), "attempt timed out");
        }
        self.seal_if_completed(session).await
    }

    /// Retry result persistence for a completed session.
    ///
    /// This is useful when the append at completion failed (e.g. a transient
    /// storage error).
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFinalized` (wrapped) if the session is
    /// not complete, or `SessionError::Storage` if persistence fails again.
    pub async fn finalize(&self, session: &mut ExamSession) -> Result<i64, SessionError> {
        if let Some(id) = session.result_id() {
            return Ok(id);
        }
        if !session.is_complete() {
            return Err(ScoreError::SessionNotFinalized {
                status: session.status(),
            }
            .into());
        }

        let outcome = self.seal_if_completed(session).await?;
        outcome.result_id.ok_or(SessionError::Closed)
    }

    async fn seal_if_completed(
        &self,
        session: &mut ExamSession,
    ) -> Result<AttemptOutcome, SessionError> {
        if !session.is_complete() {
            return Ok(AttemptOutcome {
                status: session.status(),
                result_id: None,
                record: None,
            });
        }

        let record = session.score()?;
        if session.result_id().is_none() {
            let stored = AttemptRecord::from_result(&record, self.clock.now());
            let id = self.results.append_result(&stored).await?;
            session.set_result_id(id);
            info!(
                test = %record.test_id(),
                result_id = id,
                correct = record.score().correct(),
                total = record.score().total(),
                "attempt result persisted"
            );
        }

        Ok(AttemptOutcome {
            status: session.status(),
            result_id: session.result_id(),
            record: Some(record),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
