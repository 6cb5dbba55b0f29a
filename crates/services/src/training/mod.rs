//! Training session state machine and the persisted tracker over it.

mod session;
mod workflow;

pub use session::{StepOutcome, TrainingSession};
pub use workflow::TrainingTrackerService;
