use std::sync::Arc;

use portal_core::Clock;
use portal_core::model::{Agent, AssessmentResult, QuizId};
use portal_core::scoring::grade_submission;
use storage::repository::{QuizRepository, ResultRepository};

use super::run::AssessmentRun;
use crate::error::AssessmentServiceError;

/// Orchestrates assessment attempts: start on a visible quiz, grade on
/// submission, persist exactly one result per completed run.
#[derive(Clone)]
pub struct AssessmentRunService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn ResultRepository>,
}

impl AssessmentRunService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            results,
        }
    }

    /// Starts a new attempt for the given agent.
    ///
    /// The identity layer supplies the authenticated `Agent`; the run
    /// snapshots it together with the quiz.
    ///
    /// # Errors
    ///
    /// Returns `UnknownQuiz` when the quiz does not exist and `Hidden` when
    /// it is not offered for new attempts.
    pub async fn start(
        &self,
        quiz_id: QuizId,
        agent: Agent,
    ) -> Result<AssessmentRun, AssessmentServiceError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(AssessmentServiceError::UnknownQuiz)?;

        if !quiz.is_visible() {
            return Err(AssessmentServiceError::Hidden);
        }

        Ok(AssessmentRun::start(quiz, agent, self.clock.now()))
    }

    /// Restarts an attempt at the current clock time, discarding answers.
    pub fn restart(&self, run: &mut AssessmentRun) {
        run.restart(self.clock.now());
    }

    /// Grades the run and appends the result to the immutable history.
    ///
    /// Unanswered questions count as incorrect. The run is consumed; a new
    /// attempt requires `start`.
    ///
    /// # Errors
    ///
    /// Returns a scoring error for a corrupted answer map or a storage error
    /// if the result cannot be appended.
    pub async fn submit(
        &self,
        run: AssessmentRun,
    ) -> Result<AssessmentResult, AssessmentServiceError> {
        let submitted_at = self.clock.now();
        let result = grade_submission(
            run.quiz(),
            run.agent(),
            run.answers().clone(),
            run.started_at(),
            submitted_at,
        )?;

        self.results.append_result(&result).await?;
        Ok(result)
    }

    /// Quizzes currently offered for new attempts, in storage order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the quiz list cannot be loaded.
    pub async fn offered_quizzes(
        &self,
    ) -> Result<Vec<portal_core::model::Quiz>, AssessmentServiceError> {
        let quizzes = self.quizzes.list_quizzes().await?;
        Ok(quizzes.into_iter().filter(|q| q.is_visible()).collect())
    }
}
