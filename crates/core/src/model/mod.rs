mod agent;
mod ids;
mod media;
mod question;
mod quiz;
mod result;
mod training;

pub use ids::{AgentId, ParseIdError, QuestionId, QuizId, ResultId, TrainingId};

pub use agent::{Agent, AgentError, AgentRole};
pub use media::{MediaError, MediaRef};
pub use question::{Question, QuestionError};
pub use quiz::{Quiz, QuizError};
pub use result::{AssessmentResult, ResultError};
pub(crate) use result::derive_percentage;
pub use training::{
    percent_for, TrainingError, TrainingMaterial, TrainingProgress, TrainingStep,
};
