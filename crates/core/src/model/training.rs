use thiserror::Error;

use crate::model::ids::TrainingId;
use crate::model::media::MediaRef;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("training title cannot be empty")]
    EmptyTitle,

    #[error("training step title cannot be empty")]
    EmptyStepTitle,

    #[error("progress percent must be <= 100, got {0}")]
    PercentOutOfRange(u8),
}

//
// ─── TRAINING STEP ─────────────────────────────────────────────────────────────
//

/// One step in a training module.
///
/// A `Content` step is read-and-continue material; a `Quiz` step embeds
/// exactly one question and blocks forward navigation until it is answered
/// correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingStep {
    Content {
        title: String,
        body: String,
        media: Option<MediaRef>,
    },
    Quiz {
        title: String,
        body: String,
        question: Question,
    },
}

impl TrainingStep {
    /// Creates a content step.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::EmptyStepTitle` for a blank title.
    pub fn content(
        title: impl Into<String>,
        body: impl Into<String>,
        media: Option<MediaRef>,
    ) -> Result<Self, TrainingError> {
        let title = non_blank_title(title.into())?;
        Ok(Self::Content {
            title,
            body: body.into(),
            media,
        })
    }

    /// Creates a quiz step around one embedded question.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::EmptyStepTitle` for a blank title.
    pub fn quiz(
        title: impl Into<String>,
        body: impl Into<String>,
        question: Question,
    ) -> Result<Self, TrainingError> {
        let title = non_blank_title(title.into())?;
        Ok(Self::Quiz {
            title,
            body: body.into(),
            question,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            TrainingStep::Content { title, .. } | TrainingStep::Quiz { title, .. } => title,
        }
    }

    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            TrainingStep::Content { body, .. } | TrainingStep::Quiz { body, .. } => body,
        }
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        matches!(self, TrainingStep::Quiz { .. })
    }

    /// The embedded question, for quiz steps.
    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        match self {
            TrainingStep::Quiz { question, .. } => Some(question),
            TrainingStep::Content { .. } => None,
        }
    }
}

fn non_blank_title(title: String) -> Result<String, TrainingError> {
    if title.trim().is_empty() {
        return Err(TrainingError::EmptyStepTitle);
    }
    Ok(title.trim().to_owned())
}

//
// ─── TRAINING MATERIAL ─────────────────────────────────────────────────────────
//

/// A training module: an ordered sequence of steps an agent works through.
///
/// Step order is significant and defines step-index addressing. Per-agent
/// progress is deliberately NOT embedded here; repositories hand it out per
/// (agent, module) pair so trackers work on explicit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingMaterial {
    id: TrainingId,
    title: String,
    description: Option<String>,
    steps: Vec<TrainingStep>,
    visible: bool,
}

impl TrainingMaterial {
    /// Creates a new training module.
    ///
    /// An empty step list is allowed while a module is being drafted; opening
    /// a tracker session over it is rejected at the services layer.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::EmptyTitle` for a blank title.
    pub fn new(
        id: TrainingId,
        title: impl Into<String>,
        description: Option<String>,
        steps: Vec<TrainingStep>,
        visible: bool,
    ) -> Result<Self, TrainingError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TrainingError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            steps,
            visible,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TrainingId {
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
    pub fn steps(&self) -> &[TrainingStep] {
        &self.steps
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&TrainingStep> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

//
// ─── TRAINING PROGRESS ─────────────────────────────────────────────────────────
//

/// Per-(agent, module) cursor state.
///
/// Progress "does not exist" until first touched; `TrainingProgress::start()`
/// is the explicit default-construction rule for that case. Once `completed`
/// is set it is never cleared, even when the agent reopens the module for
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingProgress {
    current_step: usize,
    percent: u8,
    completed: bool,
}

impl TrainingProgress {
    /// Default progress for an agent that has never opened the module.
    #[must_use]
    pub fn start() -> Self {
        Self {
            current_step: 0,
            percent: 0,
            completed: false,
        }
    }

    /// Rehydrates progress from storage.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::PercentOutOfRange` when `percent > 100`.
    pub fn from_persisted(
        current_step: usize,
        percent: u8,
        completed: bool,
    ) -> Result<Self, TrainingError> {
        if percent > 100 {
            return Err(TrainingError::PercentOutOfRange(percent));
        }
        Ok(Self {
            current_step,
            percent,
            completed,
        })
    }

    /// Progress positioned at `current_step` of a module with `total_steps`
    /// steps, with the percent derived from the position.
    #[must_use]
    pub fn at_step(current_step: usize, total_steps: usize, completed: bool) -> Self {
        Self {
            current_step,
            percent: percent_for(current_step, total_steps, completed),
            completed,
        }
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Default for TrainingProgress {
    fn default() -> Self {
        Self::start()
    }
}

/// Percent shown for a cursor at `step` of `total` steps.
///
/// A completed module always reports 100 regardless of where the review
/// cursor currently sits.
#[must_use]
pub fn percent_for(step: usize, total: usize, completed: bool) -> u8 {
    if completed {
        return 100;
    }
    if total == 0 {
        return 0;
    }
    let step = step.min(total) as f64;
    let pct = (step / total as f64 * 100.0).round();
    // round() of a value in [0, 100] always fits u8
    pct as u8
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
