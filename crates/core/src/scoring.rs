//! Scoring engine: turns a finished quiz run into an `AssessmentResult`.
//!
//! Scoring is a pure, total function over well-formed input: any answer map
//! is accepted as long as every entry references a question in the quiz and
//! an option that exists. Absent entries count as unanswered (incorrect).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::derive_percentage;
use crate::model::{Agent, AssessmentResult, Question, QuestionId, Quiz, ResultError, ResultId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("answer references unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("answer index {index} out of range for question {question} with {options} options")]
    AnswerOutOfRange {
        question: QuestionId,
        index: usize,
        options: usize,
    },

    #[error(transparent)]
    Result(#[from] ResultError),
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Counts correctly answered questions.
///
/// Questions without a recorded answer count as incorrect. Entries that
/// reference unknown questions or out-of-range options are caller contract
/// violations and fail fast rather than skewing the score.
///
/// # Errors
///
/// Returns `ScoringError::UnknownQuestion` or `ScoringError::AnswerOutOfRange`
/// for malformed answer maps.
pub fn score_answers(
    questions: &[Question],
    answers: &HashMap<QuestionId, usize>,
) -> Result<u32, ScoringError> {
    for (question_id, index) in answers {
        let Some(question) = questions.iter().find(|q| q.id() == *question_id) else {
            return Err(ScoringError::UnknownQuestion(*question_id));
        };
        if *index >= question.options().len() {
            return Err(ScoringError::AnswerOutOfRange {
                question: *question_id,
                index: *index,
                options: question.options().len(),
            });
        }
    }

    let score = questions
        .iter()
        .filter(|q| answers.get(&q.id()).is_some_and(|idx| q.is_correct(*idx)))
        .count();
    // question count bounded well below u32::MAX in practice
    Ok(u32::try_from(score).unwrap_or(u32::MAX))
}

/// `score / total * 100`, degenerating to 0 for an empty quiz.
#[must_use]
pub fn percentage(score: u32, total: u32) -> f64 {
    derive_percentage(score, total)
}

/// Whole seconds between run start and submission, clamped to zero when the
/// clock skews backwards.
#[must_use]
pub fn duration_secs(started_at: DateTime<Utc>, submitted_at: DateTime<Utc>) -> u32 {
    let elapsed = (submitted_at - started_at).num_seconds();
    u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX)
}

/// Produces the single immutable `AssessmentResult` for a completed run.
///
/// Quiz title and agent name are snapshotted here and never re-synced.
///
/// # Errors
///
/// Returns `ScoringError` for malformed answer maps; record assembly errors
/// are wrapped transparently.
pub fn grade_submission(
    quiz: &Quiz,
    agent: &Agent,
    answers: HashMap<QuestionId, usize>,
    started_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
) -> Result<AssessmentResult, ScoringError> {
    let score = score_answers(quiz.questions(), &answers)?;
    let total = u32::try_from(quiz.question_count()).unwrap_or(u32::MAX);

    Ok(AssessmentResult::new(
        ResultId::generate(),
        quiz.id(),
        quiz.title(),
        agent.id(),
        agent.name(),
        score,
        total,
        submitted_at,
        duration_secs(started_at, submitted_at),
        answers,
    )?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
