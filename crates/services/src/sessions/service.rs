use std::collections::BTreeMap;
use std::fmt;

use exam_core::model::{
    OptionId, Question, QuestionId, ResultRecord, SessionSnapshot, SessionStatus, TestDefinition,
};
use exam_core::scorer::{ScoreError, score_session};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One exam attempt over a fixed, ordered question list.
///
/// The session exclusively owns its mutable state for the attempt's lifetime:
/// the current position, the accumulated answer set, and the remaining time
/// budget. Every user action and timer tick goes through one of the methods
/// below, which enforce the legal transitions between `InProgress`,
/// `AwaitingConfirmation`, and the terminal `Completed` status.
///
/// Once `Completed` (explicit submit or timeout), the session is frozen:
/// mutating calls fail with `SessionError::Closed` and leave no trace.
pub struct ExamSession {
    test: TestDefinition,
    current_index: usize,
    answers: BTreeMap<QuestionId, OptionId>,
    remaining_seconds: u32,
    status: SessionStatus,
    result_id: Option<i64>,
}

impl ExamSession {
    /// Start a fresh attempt at the first question with a full time budget.
    ///
    /// The definition is already validated by construction, so this cannot
    /// fail; loading a malformed definition fails earlier, in storage.
    #[must_use]
    pub fn new(test: TestDefinition) -> Self {
        let remaining_seconds = test.duration_seconds();
        Self {
            test,
            current_index: 0,
            answers: BTreeMap::new(),
            remaining_seconds,
            status: SessionStatus::InProgress,
            result_id: None,
        }
    }

    // Accessors
    #[must_use]
    pub fn test(&self) -> &TestDefinition {
        &self.test
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question at the current navigation position.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        // current_index stays in [0, question_count) by construction and
        // clamped navigation, and the question list is non-empty.
        &self.test.questions()[self.current_index]
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Seconds consumed so far out of the test's budget.
    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.test.duration_seconds() - self.remaining_seconds
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> Option<&OptionId> {
        self.answers.get(&question)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// Row id of the persisted result, once the workflow has stored it.
    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    pub(crate) fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            current: self.current_index + 1,
            total: self.test.question_count(),
            answered: self.answered_count(),
            remaining_seconds: self.remaining_seconds,
            is_complete: self.is_complete(),
        }
    }

    /// Read-only view of the session state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            answers: self.answers.clone(),
            remaining_seconds: self.remaining_seconds,
            status: self.status,
        }
    }

    /// Score this session.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::SessionNotFinalized` unless the session is
    /// `Completed`.
    pub fn score(&self) -> Result<ResultRecord, ScoreError> {
        score_session(&self.test, &self.snapshot())
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Record (or overwrite) the answer for a question.
    ///
    /// Does not move the current position. If a submission was awaiting
    /// confirmation, the session drops back to `InProgress` since the user is
    /// still editing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after completion, or
    /// `UnknownQuestion`/`UnknownOption` if the ids do not reference the test;
    /// in every error case the state is unchanged.
    pub fn record_answer(
        &mut self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<SessionStatus, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Closed);
        }
        let Some(target) = self.test.question(question) else {
            return Err(SessionError::UnknownQuestion {
                test: self.test.id(),
                question,
            });
        };
        if !target.has_option(&option) {
            return Err(SessionError::UnknownOption { question, option });
        }

        self.answers.insert(question, option);
        if self.status == SessionStatus::AwaitingConfirmation {
            self.status = SessionStatus::InProgress;
        }
        Ok(self.status)
    }

    /// Move to the next question; a no-op at the last one.
    ///
    /// There is deliberately no auto-submit here: at the last question the
    /// caller must invoke `submit()` explicitly.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after completion or
    /// `SessionError::ConfirmationPending` while a submission awaits
    /// confirmation.
    pub fn advance(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure_in_progress()?;
        if self.current_index + 1 < self.test.question_count() {
            self.current_index += 1;
        }
        Ok(self.status)
    }

    /// Move to the previous question; a no-op at the first one.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ExamSession::advance`].
    pub fn retreat(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure_in_progress()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.status)
    }

    /// Count down one second; called once per real second by an external
    /// scheduler.
    ///
    /// The countdown keeps running while a submission awaits confirmation.
    /// Reaching zero forces `Completed` regardless of answer coverage — the
    /// timeout path bypasses confirmation. After completion this is a no-op,
    /// never an error.
    pub fn tick(&mut self) -> SessionStatus {
        if self.is_complete() {
            return self.status;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = SessionStatus::Completed;
        }
        self.status
    }

    /// Attempt to finish the session.
    ///
    /// With every question answered this transitions straight to `Completed`.
    /// With gaps it transitions to `AwaitingConfirmation` and takes no other
    /// action; the caller must follow up with [`ExamSession::confirm_submit`]
    /// or [`ExamSession::cancel_confirmation`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after completion or
    /// `SessionError::ConfirmationPending` if already awaiting confirmation.
    pub fn submit(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure_in_progress()?;
        self.status = if self.all_answered() {
            SessionStatus::Completed
        } else {
            SessionStatus::AwaitingConfirmation
        };
        Ok(self.status)
    }

    /// Finalize a submission despite unanswered questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after completion or
    /// `SessionError::NoPendingConfirmation` unless a submission is awaiting
    /// confirmation.
    pub fn confirm_submit(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure_awaiting_confirmation()?;
        self.status = SessionStatus::Completed;
        Ok(self.status)
    }

    /// Return to editing without finalizing; answers are untouched.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ExamSession::confirm_submit`].
    pub fn cancel_confirmation(&mut self) -> Result<SessionStatus, SessionError> {
        self.ensure_awaiting_confirmation()?;
        self.status = SessionStatus::InProgress;
        Ok(self.status)
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::InProgress => Ok(()),
            SessionStatus::AwaitingConfirmation => Err(SessionError::ConfirmationPending),
            SessionStatus::Completed => Err(SessionError::Closed),
        }
    }

    fn ensure_awaiting_confirmation(&self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::AwaitingConfirmation => Ok(()),
            SessionStatus::InProgress => Err(SessionError::NoPendingConfirmation),
            SessionStatus::Completed => Err(SessionError::Closed),
        }
    }

    fn all_answered(&self) -> bool {
        self.test
            .questions()
            .iter()
            .all(|question| self.answers.contains_key(&question.id()))
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("test_id", &self.test.id())
            .field("current_index", &self.current_index)
            .field("answered", &self.answers.len())
            .field("remaining_seconds", &self.remaining_seconds)
            .field("status", &self.status)
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
