//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{OptionId, QuestionId, TestDefinitionError, TestId};
use exam_core::scorer::ScoreError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by exam sessions and the attempt workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question {question} is not part of test {test}")]
    UnknownQuestion { test: TestId, question: QuestionId },

    #[error("option {option} is not an option of question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("session is already completed")]
    Closed,

    #[error("submission is awaiting confirmation")]
    ConfirmationPending,

    #[error("no submission is awaiting confirmation")]
    NoPendingConfirmation,

    #[error("test {0} not found")]
    TestNotFound(TestId),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Test(#[from] TestDefinitionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("test {0} not found")]
    TestNotFound(TestId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
