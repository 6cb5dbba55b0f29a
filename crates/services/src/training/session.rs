use portal_core::model::{TrainingMaterial, TrainingProgress, TrainingStep};

use crate::error::TrainingServiceError;

//
// ─── STEP OUTCOME ──────────────────────────────────────────────────────────────
//

/// Result of attempting a navigation transition.
///
/// `Blocked` is the rejected-transition signal: the cursor did not move and
/// the caller may retry after the gating condition clears. It is not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The cursor moved to the contained step index.
    Moved(usize),
    /// Advancing from the final step marked the module completed.
    Completed,
    /// The transition was refused; the cursor did not move.
    Blocked,
}

impl StepOutcome {
    #[must_use]
    pub fn did_move(self) -> bool {
        !matches!(self, StepOutcome::Blocked)
    }
}

//
// ─── TRAINING SESSION ──────────────────────────────────────────────────────────
//

/// An in-memory cursor over one module's steps for one agent.
///
/// States are the step indices `0..N-1` plus the sticky `completed` flag.
/// A quiz step gates `advance()` until its embedded question has been
/// answered with the correct option during the current visit; every
/// transition into a quiz step clears that correctness state, so revisiting
/// forces a re-answer.
#[derive(Debug, Clone)]
pub struct TrainingSession {
    material: TrainingMaterial,
    current: usize,
    completed: bool,
    quiz_passed: bool,
}

impl TrainingSession {
    /// Opens a session positioned according to stored progress.
    ///
    /// Incomplete progress resumes at its `current_step` (clamped to the
    /// last step if the module shrank since the progress was written).
    /// A completed module reopens at step 0 in review mode; the stored
    /// `completed` flag stays set.
    ///
    /// # Errors
    ///
    /// Returns `TrainingServiceError::Empty` for a module with no steps.
    pub fn open(
        material: TrainingMaterial,
        progress: TrainingProgress,
    ) -> Result<Self, TrainingServiceError> {
        if material.step_count() == 0 {
            return Err(TrainingServiceError::Empty);
        }

        let current = if progress.is_completed() {
            0
        } else {
            progress.current_step().min(material.step_count() - 1)
        };

        Ok(Self {
            material,
            current,
            completed: progress.is_completed(),
            quiz_passed: false,
        })
    }

    #[must_use]
    pub fn material(&self) -> &TrainingMaterial {
        &self.material
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The step the cursor currently sits on.
    #[must_use]
    pub fn current_step(&self) -> &TrainingStep {
        // `open` rejects empty modules and the cursor never leaves 0..N-1.
        &self.material.steps()[self.current]
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// True while the current step is a quiz whose question has not been
    /// answered correctly during this visit.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.current_step().is_quiz() && !self.quiz_passed
    }

    /// Records an answer for the current quiz step.
    ///
    /// Returns whether the chosen option is correct; a correct answer lifts
    /// the gate for this visit. An incorrect answer leaves the gate in
    /// place and the agent may try again.
    ///
    /// # Errors
    ///
    /// Returns `TrainingServiceError::NotAQuizStep` when the current step is
    /// content, or `AnswerOutOfRange` for an impossible option index.
    pub fn answer_quiz(&mut self, index: usize) -> Result<bool, TrainingServiceError> {
        let question = self
            .current_step()
            .question()
            .ok_or(TrainingServiceError::NotAQuizStep)?;

        if index >= question.options().len() {
            return Err(TrainingServiceError::AnswerOutOfRange {
                index,
                options: question.options().len(),
            });
        }

        let correct = question.is_correct(index);
        if correct {
            self.quiz_passed = true;
        }
        Ok(correct)
    }

    /// Moves the cursor forward one step.
    ///
    /// Refused (`Blocked`) while a quiz step gates. Advancing from the last
    /// step marks the module completed and freezes the cursor there.
    pub fn advance(&mut self) -> StepOutcome {
        if self.is_gated() {
            return StepOutcome::Blocked;
        }

        if self.current + 1 < self.material.step_count() {
            self.current += 1;
            self.quiz_passed = false;
            StepOutcome::Moved(self.current)
        } else {
            self.completed = true;
            StepOutcome::Completed
        }
    }

    /// Moves the cursor back one step; refused at step 0 and while a quiz
    /// step gates.
    ///
    /// Backward navigation is only available from content steps already
    /// passed; an unanswered quiz holds the cursor in both directions.
    /// Re-entering a quiz step clears its correctness state, forcing a
    /// re-answer before the agent can pass it again.
    pub fn retreat(&mut self) -> StepOutcome {
        if self.current == 0 || self.is_gated() {
            return StepOutcome::Blocked;
        }

        self.current -= 1;
        self.quiz_passed = false;
        StepOutcome::Moved(self.current)
    }

    /// Progress snapshot for persistence after a successful transition.
    #[must_use]
    pub fn progress(&self) -> TrainingProgress {
        TrainingProgress::at_step(self.current, self.material.step_count(), self.completed)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{Question, QuestionId, TrainingId};

    fn quiz_question() -> Question {
        Question::new(
            QuestionId::new(1),
            "Where does the vector breed?",
            vec!["Rivers".into(), "Standing water".into()],
            1,
            None,
        )
        .unwrap()
    }

    fn module() -> TrainingMaterial {
        TrainingMaterial::new(
            TrainingId::new(1),
            "Vector Control",
            None,
            vec![
                TrainingStep::content("Intro", "", None).unwrap(),
                TrainingStep::quiz("Check", "", quiz_question()).unwrap(),
                TrainingStep::content("Routine", "", None).unwrap(),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn open_rejects_empty_module() {
        let empty =
            TrainingMaterial::new(TrainingId::new(1), "Draft", None, vec![], true).unwrap();
        let err = TrainingSession::open(empty, TrainingProgress::start()).unwrap_err();
        assert!(matches!(err, TrainingServiceError::Empty));
    }

    #[test]
    fn quiz_step_gates_until_correct_answer() {
        let mut session = TrainingSession::open(module(), TrainingProgress::start()).unwrap();

        assert_eq!(session.advance(), StepOutcome::Moved(1));
        assert!(session.is_gated());
        assert_eq!(session.advance(), StepOutcome::Blocked);
        assert_eq!(session.current_index(), 1);

        assert!(!session.answer_quiz(0).unwrap());
        assert_eq!(session.advance(), StepOutcome::Blocked);

        assert!(session.answer_quiz(1).unwrap());
        assert_eq!(session.advance(), StepOutcome::Moved(2));
    }

    #[test]
    fn advancing_from_last_step_completes_and_freezes_cursor() {
        let mut session = TrainingSession::open(
            module(),
            TrainingProgress::at_step(2, 3, false),
        )
        .unwrap();

        assert_eq!(session.advance(), StepOutcome::Completed);
        assert!(session.is_completed());
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.progress().percent(), 100);
    }

    #[test]
    fn retreat_refused_at_step_zero() {
        let mut session = TrainingSession::open(module(), TrainingProgress::start()).unwrap();
        assert_eq!(session.retreat(), StepOutcome::Blocked);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn unanswered_quiz_step_blocks_retreat_too() {
        let mut session = TrainingSession::open(module(), TrainingProgress::start()).unwrap();
        assert_eq!(session.advance(), StepOutcome::Moved(1));

        // The gate holds in both directions until the question is answered.
        assert_eq!(session.retreat(), StepOutcome::Blocked);
        assert_eq!(session.current_index(), 1);

        assert!(!session.answer_quiz(0).unwrap());
        assert_eq!(session.retreat(), StepOutcome::Blocked);

        assert!(session.answer_quiz(1).unwrap());
        assert_eq!(session.retreat(), StepOutcome::Moved(0));
    }

    #[test]
    fn reentering_quiz_step_forces_reanswer() {
        let mut session = TrainingSession::open(module(), TrainingProgress::start()).unwrap();

        session.advance();
        session.answer_quiz(1).unwrap();
        session.advance();

        // Going back onto the quiz step drops the earlier correct answer.
        assert_eq!(session.retreat(), StepOutcome::Moved(1));
        assert!(session.is_gated());
        assert_eq!(session.advance(), StepOutcome::Blocked);
    }

    #[test]
    fn completed_module_reopens_in_review_mode() {
        let stored = TrainingProgress::at_step(2, 3, true);
        let session = TrainingSession::open(module(), stored).unwrap();

        assert_eq!(session.current_index(), 0);
        assert!(session.is_completed());
        assert_eq!(session.progress().percent(), 100);
    }

    #[test]
    fn resume_clamps_stale_cursor_to_last_step() {
        let stored = TrainingProgress::from_persisted(9, 50, false).unwrap();
        let session = TrainingSession::open(module(), stored).unwrap();
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn answer_on_content_step_is_rejected() {
        let mut session = TrainingSession::open(module(), TrainingProgress::start()).unwrap();
        let err = session.answer_quiz(0).unwrap_err();
        assert!(matches!(err, TrainingServiceError::NotAQuizStep));
    }
}
