//! Shared error types for the services crate.

use thiserror::Error;

use portal_core::model::TrainingError;
use portal_core::scoring::ScoringError;
use storage::repository::StorageError;

/// Errors emitted by the training session and tracker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainingServiceError {
    #[error("training module has no steps")]
    Empty,
    #[error("training module not found")]
    UnknownModule,
    #[error("current step is not a quiz step")]
    NotAQuizStep,
    #[error("answer index {index} out of range for {options} options")]
    AnswerOutOfRange { index: usize, options: usize },
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the assessment run workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentServiceError {
    #[error("quiz not found")]
    UnknownQuiz,
    #[error("quiz is not visible to agents")]
    Hidden,
    #[error("answer index {index} out of range for {options} options")]
    AnswerOutOfRange { index: usize, options: usize },
    #[error("question not in this quiz")]
    UnknownQuestion,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the ranking service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RankingServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the analytics service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsServiceError {
    #[error("cross-agent analytics require the manager role")]
    Forbidden,
    #[error("quiz not found")]
    UnknownQuiz,
    #[error("training module not found")]
    UnknownModule,
    #[error("agent not found")]
    UnknownAgent,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
