use std::collections::HashMap;

use chrono::{DateTime, Utc};

use portal_core::model::{Agent, Question, QuestionId, Quiz};

use crate::error::AssessmentServiceError;

/// One in-flight attempt at a quiz by one agent.
///
/// The run works on a snapshot of the quiz taken at start; edits or deletion
/// of the quiz mid-run do not affect it. Answers may be changed freely until
/// submission, and the whole run may be restarted without leaving a record.
#[derive(Debug, Clone)]
pub struct AssessmentRun {
    quiz: Quiz,
    agent: Agent,
    answers: HashMap<QuestionId, usize>,
    started_at: DateTime<Utc>,
    current: usize,
}

impl AssessmentRun {
    pub(crate) fn start(quiz: Quiz, agent: Agent, started_at: DateTime<Utc>) -> Self {
        Self {
            quiz,
            agent,
            answers: HashMap::new(),
            started_at,
            current: 0,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, usize> {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question the cursor currently sits on; `None` for an empty quiz.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions().get(self.current)
    }

    /// Count of questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Records (or overwrites) the answer for one question.
    ///
    /// # Errors
    ///
    /// Returns `UnknownQuestion` for a question not in this quiz and
    /// `AnswerOutOfRange` for an impossible option index.
    pub fn answer(
        &mut self,
        question: QuestionId,
        index: usize,
    ) -> Result<(), AssessmentServiceError> {
        let target = self
            .quiz
            .question(question)
            .ok_or(AssessmentServiceError::UnknownQuestion)?;

        if index >= target.options().len() {
            return Err(AssessmentServiceError::AnswerOutOfRange {
                index,
                options: target.options().len(),
            });
        }

        self.answers.insert(question, index);
        Ok(())
    }

    /// Records the answer for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `UnknownQuestion` when the quiz has no questions.
    pub fn answer_current(&mut self, index: usize) -> Result<(), AssessmentServiceError> {
        let id = self
            .current_question()
            .map(Question::id)
            .ok_or(AssessmentServiceError::UnknownQuestion)?;
        self.answer(id, index)
    }

    /// Moves the cursor to the next question; false at the end.
    pub fn next_question(&mut self) -> bool {
        if self.current + 1 < self.quiz.question_count() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor to the previous question; false at the start.
    pub fn previous_question(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Discards all answers and restarts the attempt at the given time.
    ///
    /// No record of the abandoned attempt is created.
    pub fn restart(&mut self, started_at: DateTime<Utc>) {
        self.answers.clear();
        self.current = 0;
        self.started_at = started_at;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{AgentId, AgentRole, QuizId};
    use portal_core::time::fixed_now;

    fn build_quiz() -> Quiz {
        let questions = vec![
            Question::new(
                QuestionId::new(1),
                "Main vector of dengue?",
                vec!["Aedes aegypti".into(), "Culex".into()],
                0,
                None,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                "Best community measure?",
                vec!["Spraying".into(), "Removing standing water".into()],
                1,
                None,
            )
            .unwrap(),
        ];
        Quiz::new(QuizId::new(1), "Vector Identification", None, questions, true).unwrap()
    }

    fn build_agent() -> Agent {
        Agent::new(
            AgentId::new(1),
            "Maria Souza",
            "maria@health.example.org",
            AgentRole::Agent,
        )
        .unwrap()
    }

    #[test]
    fn answers_can_be_revised_before_submission() {
        let mut run = AssessmentRun::start(build_quiz(), build_agent(), fixed_now());

        run.answer(QuestionId::new(1), 1).unwrap();
        run.answer(QuestionId::new(1), 0).unwrap();

        assert_eq!(run.answers().get(&QuestionId::new(1)), Some(&0));
        assert_eq!(run.answered_count(), 1);
    }

    #[test]
    fn answer_rejects_unknown_question_and_bad_index() {
        let mut run = AssessmentRun::start(build_quiz(), build_agent(), fixed_now());

        let err = run.answer(QuestionId::new(99), 0).unwrap_err();
        assert!(matches!(err, AssessmentServiceError::UnknownQuestion));

        let err = run.answer(QuestionId::new(1), 5).unwrap_err();
        assert!(matches!(
            err,
            AssessmentServiceError::AnswerOutOfRange { index: 5, options: 2 }
        ));
    }

    #[test]
    fn cursor_walks_questions_in_order() {
        let mut run = AssessmentRun::start(build_quiz(), build_agent(), fixed_now());

        assert!(!run.previous_question());
        assert_eq!(run.current_question().unwrap().id(), QuestionId::new(1));
        assert!(run.next_question());
        assert_eq!(run.current_question().unwrap().id(), QuestionId::new(2));
        assert!(!run.next_question());
    }

    #[test]
    fn restart_discards_answers_and_resets_clock() {
        let mut run = AssessmentRun::start(build_quiz(), build_agent(), fixed_now());
        run.answer(QuestionId::new(1), 0).unwrap();
        run.next_question();

        let later = fixed_now() + chrono::Duration::seconds(90);
        run.restart(later);

        assert!(run.answers().is_empty());
        assert_eq!(run.current_index(), 0);
        assert_eq!(run.started_at(), later);
    }
}
