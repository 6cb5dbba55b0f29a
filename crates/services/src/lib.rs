#![forbid(unsafe_code)]

pub mod analytics_service;
pub mod assessment;
pub mod error;
pub mod ranking_service;
pub mod training;

pub use portal_core::Clock;

pub use error::{
    AnalyticsServiceError, AssessmentServiceError, RankingServiceError, TrainingServiceError,
};

pub use analytics_service::{AnalyticsService, OverviewReport, QuizReport};
pub use assessment::{AssessmentRun, AssessmentRunService};
pub use ranking_service::RankingService;
pub use training::{StepOutcome, TrainingSession, TrainingTrackerService};
