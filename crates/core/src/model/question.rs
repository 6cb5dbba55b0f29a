use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::media::MediaRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("option text cannot be empty (option {0})")]
    EmptyOption(usize),

    #[error("correct option index {index} out of range for {options} options")]
    CorrectOptionOutOfRange { index: usize, options: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
///
/// Options are an ordered list; `correct_option` indexes into it. Invariants
/// (at least two options, index in range) are enforced at construction so the
/// scoring and analytics layers never have to re-validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
    media: Option<MediaRef>,
}

impl Question {
    /// Creates a new Question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options
    /// are given, any option is blank, or the correct index is out of range.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        media: Option<MediaRef>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        for (idx, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionError::EmptyOption(idx));
            }
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index: correct_option,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt: prompt.trim().to_owned(),
            options,
            correct_option,
            media,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }

    /// True when `index` selects the correct option.
    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_option
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn question_new_happy_path() {
        let q = Question::new(
            QuestionId::new(1),
            "Main vector of dengue?",
            options(&["Aedes aegypti", "Culex", "Anopheles"]),
            0,
            None,
        )
        .unwrap();

        assert_eq!(q.options().len(), 3);
        assert!(q.is_correct(0));
        assert!(!q.is_correct(2));
    }

    #[test]
    fn question_rejects_single_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Prompt",
            options(&["only one"]),
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn question_rejects_out_of_range_correct_index() {
        let err = Question::new(QuestionId::new(1), "Prompt", options(&["a", "b"]), 2, None)
            .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectOptionOutOfRange {
                index: 2,
                options: 2
            }
        );
    }

    #[test]
    fn question_rejects_blank_prompt_and_option() {
        let err =
            Question::new(QuestionId::new(1), "  ", options(&["a", "b"]), 0, None).unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);

        let err =
            Question::new(QuestionId::new(1), "Prompt", options(&["a", " "]), 0, None).unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption(1));
    }
}
