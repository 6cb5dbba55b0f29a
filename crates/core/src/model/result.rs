use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AgentId, QuestionId, QuizId, ResultId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score {score} exceeds total question count {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("result quiz title cannot be empty")]
    EmptyQuizTitle,

    #[error("result agent name cannot be empty")]
    EmptyAgentName,
}

//
// ─── ASSESSMENT RESULT ─────────────────────────────────────────────────────────
//

/// One completed run of a quiz by one agent, immutable once recorded.
///
/// Quiz title and agent name are snapshots taken at submission time and are
/// deliberately never re-synced if the quiz or agent is later renamed or
/// deleted; a result must stay interpretable on its own. The percentage is
/// always recomputed from `score / total_questions` so a drifted value can
/// never enter the system through rehydration.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentResult {
    id: ResultId,
    quiz_id: QuizId,
    quiz_title: String,
    agent_id: AgentId,
    agent_name: String,
    score: u32,
    total_questions: u32,
    percentage: f64,
    completed_at: DateTime<Utc>,
    duration_secs: u32,
    answers: HashMap<QuestionId, usize>,
}

impl AssessmentResult {
    /// Assembles a result from its parts, recomputing the percentage.
    ///
    /// Used both when the scoring engine emits a fresh record and when
    /// storage rehydrates a persisted one; the stored percentage column is
    /// ignored on read in favor of this recomputation.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::ScoreExceedsTotal` when `score > total_questions`
    /// and `EmptyQuizTitle`/`EmptyAgentName` for blank snapshots.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ResultId,
        quiz_id: QuizId,
        quiz_title: impl Into<String>,
        agent_id: AgentId,
        agent_name: impl Into<String>,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
        duration_secs: u32,
        answers: HashMap<QuestionId, usize>,
    ) -> Result<Self, ResultError> {
        if score > total_questions {
            return Err(ResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        let quiz_title = quiz_title.into();
        if quiz_title.trim().is_empty() {
            return Err(ResultError::EmptyQuizTitle);
        }
        let agent_name = agent_name.into();
        if agent_name.trim().is_empty() {
            return Err(ResultError::EmptyAgentName);
        }

        Ok(Self {
            id,
            quiz_id,
            quiz_title: quiz_title.trim().to_owned(),
            agent_id,
            agent_name: agent_name.trim().to_owned(),
            score,
            total_questions,
            percentage: derive_percentage(score, total_questions),
            completed_at,
            duration_secs,
            answers,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// Quiz title as it read at submission time.
    #[must_use]
    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Agent display name as it read at submission time.
    #[must_use]
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// `score / total_questions * 100`, or 0 for an empty quiz.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wall-clock seconds spent on the run.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Map of question id to the selected option index; absent = unanswered.
    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, usize> {
        &self.answers
    }

    /// Selected option index for one question, if any was recorded.
    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    /// True when the attempt meets or exceeds the given percentage threshold.
    #[must_use]
    pub fn passed(&self, threshold_pct: f64) -> bool {
        self.percentage >= threshold_pct
    }
}

pub(crate) fn derive_percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total) * 100.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_result(score: u32, total: u32) -> Result<AssessmentResult, ResultError> {
        AssessmentResult::new(
            ResultId::generate(),
            QuizId::new(1),
            "Vector Identification",
            AgentId::new(2),
            "Silva",
            score,
            total,
            fixed_now(),
            120,
            HashMap::new(),
        )
    }

    #[test]
    fn percentage_is_recomputed_from_score() {
        let result = build_result(1, 2).unwrap();
        assert!((result.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_quiz_degenerates_to_zero_percent() {
        let result = build_result(0, 0).unwrap();
        assert!((result.percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_score_above_total() {
        let err = build_result(3, 2).unwrap_err();
        assert_eq!(err, ResultError::ScoreExceedsTotal { score: 3, total: 2 });
    }

    #[test]
    fn rejects_blank_snapshots() {
        let err = AssessmentResult::new(
            ResultId::generate(),
            QuizId::new(1),
            "  ",
            AgentId::new(2),
            "Silva",
            0,
            1,
            fixed_now(),
            0,
            HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::EmptyQuizTitle);
    }

    #[test]
    fn answer_lookup_distinguishes_unanswered() {
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new(1), 2);
        let result = AssessmentResult::new(
            ResultId::generate(),
            QuizId::new(1),
            "Quiz",
            AgentId::new(2),
            "Silva",
            0,
            2,
            fixed_now(),
            30,
            answers,
        )
        .unwrap();

        assert_eq!(result.answer_for(QuestionId::new(1)), Some(2));
        assert_eq!(result.answer_for(QuestionId::new(2)), None);
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let result = build_result(7, 10).unwrap();
        assert!(result.passed(70.0));
        let result = build_result(6, 10).unwrap();
        assert!(!result.passed(70.0));
    }
}
