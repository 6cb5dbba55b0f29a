//! Assessment run workflow: one in-memory attempt at a quiz, graded and
//! persisted exactly once on submission.

mod run;
mod workflow;

pub use run::AssessmentRun;
pub use workflow::AssessmentRunService;
