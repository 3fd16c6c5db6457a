use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, TestId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("stored percentage ({stored}) does not match recomputation ({expected})")]
    PercentageMismatch { stored: u8, expected: u8 },
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Aggregate score of one completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    correct: u32,
    total: u32,
    percentage: u8,
}

impl Score {
    /// Build a score from counts.
    ///
    /// The percentage is `100 * correct / total`, rounded half-up on the `.5`
    /// boundary in integer arithmetic. An empty total yields 0.
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self {
            correct,
            total,
            percentage: percentage_of(correct, total),
        }
    }

    /// Rehydrate a score from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::CorrectExceedsTotal` if the counts are
    /// inconsistent, or `ResultError::PercentageMismatch` if the stored
    /// percentage does not match the rounding rule.
    pub fn from_persisted(correct: u32, total: u32, percentage: u8) -> Result<Self, ResultError> {
        if correct > total {
            return Err(ResultError::CorrectExceedsTotal { correct, total });
        }
        let expected = percentage_of(correct, total);
        if percentage != expected {
            return Err(ResultError::PercentageMismatch {
                stored: percentage,
                expected,
            });
        }
        Ok(Self {
            correct,
            total,
            percentage,
        })
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }
}

/// Integer round-half-up percentage: `2/3 -> 67`, `1/8 -> 13`.
#[allow(clippy::cast_possible_truncation)]
fn percentage_of(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    // floor((100*correct + total/2) / total), computed without the halving
    // losing the .5 boundary; clamped to 100.
    (((200 * correct + total) / (2 * total)).min(100)) as u8
}

//
// ─── PER-QUESTION BREAKDOWN ────────────────────────────────────────────────────
//

/// How one question was answered.
///
/// `Unanswered` counts as incorrect for the percentage but stays a distinct
/// tag so a breakdown view can render it differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerVerdict {
    Correct,
    Incorrect,
    Unanswered,
}

impl AnswerVerdict {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerVerdict::Correct)
    }
}

/// Verdict for one question, in test definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    /// The option the user selected, if any.
    pub selected: Option<OptionId>,
    pub verdict: AnswerVerdict,
}

//
// ─── RESULT RECORD ─────────────────────────────────────────────────────────────
//

/// The single artifact that outlives an attempt: the finalized answer set,
/// time spent, aggregate score, and per-question breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    test_id: TestId,
    answers: BTreeMap<QuestionId, OptionId>,
    time_spent_seconds: u32,
    score: Score,
    breakdown: Vec<QuestionOutcome>,
}

impl ResultRecord {
    pub(crate) fn new(
        test_id: TestId,
        answers: BTreeMap<QuestionId, OptionId>,
        time_spent_seconds: u32,
        score: Score,
        breakdown: Vec<QuestionOutcome>,
    ) -> Self {
        Self {
            test_id,
            answers,
            time_spent_seconds,
            score,
            breakdown,
        }
    }

    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Snapshot of the finalized answer set.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.answers
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Per-question verdicts in test definition order.
    #[must_use]
    pub fn breakdown(&self) -> &[QuestionOutcome] {
        &self.breakdown
    }

    /// Breakdown entry for a specific question.
    #[must_use]
    pub fn outcome_for(&self, question: QuestionId) -> Option<&QuestionOutcome> {
        self.breakdown
            .iter()
            .find(|outcome| outcome.question_id == question)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
