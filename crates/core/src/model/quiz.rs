use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("duplicate question id within quiz: {0}")]
    DuplicateQuestionId(QuestionId),
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An assessment: an ordered list of questions plus a visibility flag.
///
/// Question order is significant; it defines the numbering used by the
/// analytics views. A hidden quiz must not be offered for new attempts, but
/// historical results that reference it stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: Option<String>,
    questions: Vec<Question>,
    visible: bool,
}

impl Quiz {
    /// Creates a new Quiz.
    ///
    /// An empty question list is allowed (a quiz being drafted); scoring
    /// degenerates to 0% for it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` for a blank title and
    /// `QuizError::DuplicateQuestionId` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: Option<String>,
        questions: Vec<Question>,
        visible: bool,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestionId(question.id()));
            }
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            questions,
            visible,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Looks up a question by its id.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Whether this quiz may be offered for new attempts.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn quiz_new_happy_path() {
        let quiz = Quiz::new(
            QuizId::new(1),
            "Vector Identification",
            Some("  Know your vectors  ".into()),
            vec![build_question(1), build_question(2)],
            true,
        )
        .unwrap();

        assert_eq!(quiz.question_count(), 2);
        assert_eq!(quiz.description(), Some("Know your vectors"));
        assert!(quiz.question(QuestionId::new(2)).is_some());
        assert!(quiz.question(QuestionId::new(9)).is_none());
    }

    #[test]
    fn quiz_rejects_blank_title() {
        let err = Quiz::new(QuizId::new(1), "  ", None, Vec::new(), true).unwrap_err();
        assert_eq!(err, QuizError::EmptyTitle);
    }

    #[test]
    fn quiz_rejects_duplicate_question_ids() {
        let err = Quiz::new(
            QuizId::new(1),
            "Title",
            None,
            vec![build_question(1), build_question(1)],
            true,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::DuplicateQuestionId(QuestionId::new(1)));
    }

    #[test]
    fn quiz_allows_empty_question_list() {
        let quiz = Quiz::new(QuizId::new(1), "Draft", None, Vec::new(), false).unwrap();
        assert_eq!(quiz.question_count(), 0);
        assert!(!quiz.is_visible());
    }
}
