use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{OptionId, QuestionId};

/// Lifecycle state of one exam attempt.
///
/// `Completed` is terminal: a completed session is frozen and only readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The attempt is running and accepts answers and navigation.
    InProgress,
    /// A submit was attempted with unanswered questions; an explicit second
    /// action (confirm or cancel) is required.
    AwaitingConfirmation,
    /// The attempt finished, either by explicit submit or by timeout.
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Read-only view of an attempt's state, handed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Zero-based position within the test's question order.
    pub current_index: usize,
    /// Selected option per question; at most one entry per question.
    pub answers: BTreeMap<QuestionId, OptionId>,
    /// Seconds left on the countdown.
    pub remaining_seconds: u32,
    pub status: SessionStatus,
}

impl SessionSnapshot {
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> Option<&OptionId> {
        self.answers.get(&question)
    }

    /// Seconds consumed so far, given the test's total budget.
    #[must_use]
    pub fn time_spent_seconds(&self, duration_seconds: u32) -> u32 {
        duration_seconds.saturating_sub(self.remaining_seconds)
    }
}
