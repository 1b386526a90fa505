//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId, TestResultError};
use quiz_core::selection::SelectionError;
use storage::repository::StorageError;

/// Errors emitted by an in-progress `TestSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for test")]
    Empty,
    #[error("test already finished")]
    Completed,
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error("question {0} has already been answered")]
    AlreadyAnswered(QuestionId),
    #[error("option {selected} does not exist, question has {len} options")]
    InvalidOption { selected: usize, len: usize },
    #[error(transparent)]
    Result(#[from] TestResultError),
}

/// Errors emitted by `TestService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestServiceError {
    #[error("no questions available")]
    NoQuestions,
    #[error("random source unavailable: {0}")]
    RandomSource(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
