//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use tutor_core::model::{ContentError, ExerciseId, QuestionId};

/// A progress write that reached memory but not durable storage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors loading the built-in content.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("content data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("reading text of {exercise} is too short to practise with")]
    ReadingTooShort { exercise: ExerciseId },
}

/// Errors emitted by `ExerciseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise not found: {0}")]
    ExerciseNotFound(ExerciseId),
    #[error("question {question} not found in exercise {exercise}")]
    QuestionNotFound {
        exercise: ExerciseId,
        question: QuestionId,
    },
    #[error("option {index} is out of range, question has {options} options")]
    OptionOutOfRange { index: usize, options: usize },
    #[error("{} question(s) still unanswered", missing.len())]
    Unanswered { missing: Vec<QuestionId> },
}

/// Errors emitted by the verb quiz.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerbQuizError {
    #[error("quiz needs at least one question and one target form")]
    EmptySettings,
    #[error("no verb has any of the requested forms")]
    NoCandidates,
    #[error("quiz is already finished")]
    Finished,
}
