use std::sync::Arc;

use portal_core::analytics::{
    AgentStats, AssessmentStats, QuestionStats, TrainingCompletionStats, agent_performance,
    assessment_performance, question_breakdown, training_completion,
};
use portal_core::model::{Agent, AgentId, QuizId, TrainingId};
use storage::repository::{
    AgentRepository, QuizRepository, ResultRepository, TrainingRepository,
};

use crate::error::AnalyticsServiceError;

//
// ─── REPORT SHAPES ─────────────────────────────────────────────────────────────
//

/// Assessment figures plus the per-question distribution table.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub stats: AssessmentStats,
    pub questions: Vec<QuestionStats>,
}

/// Portal-wide counters shown on the manager dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewReport {
    pub agent_count: usize,
    pub module_count: usize,
    pub quiz_count: usize,
    pub total_attempts: usize,
    pub overall_avg_pct: f64,
}

//
// ─── ANALYTICS SERVICE ─────────────────────────────────────────────────────────
//

/// Read-only projections over full snapshots, recomputed per request.
///
/// Cross-agent views are gated behind the manager role; an agent may still
/// fetch their own performance report.
#[derive(Clone)]
pub struct AnalyticsService {
    agents: Arc<dyn AgentRepository>,
    quizzes: Arc<dyn QuizRepository>,
    trainings: Arc<dyn TrainingRepository>,
    results: Arc<dyn ResultRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        quizzes: Arc<dyn QuizRepository>,
        trainings: Arc<dyn TrainingRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            agents,
            quizzes,
            trainings,
            results,
        }
    }

    fn require_manager(viewer: &Agent) -> Result<(), AnalyticsServiceError> {
        if viewer.is_manager() {
            Ok(())
        } else {
            Err(AnalyticsServiceError::Forbidden)
        }
    }

    /// Completion figures for one training module.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-managers, `UnknownModule` when the module
    /// does not exist, or a storage error.
    pub async fn training_report(
        &self,
        viewer: &Agent,
        training: TrainingId,
    ) -> Result<TrainingCompletionStats, AnalyticsServiceError> {
        Self::require_manager(viewer)?;

        let material = self
            .trainings
            .get_training(training)
            .await?
            .ok_or(AnalyticsServiceError::UnknownModule)?;
        let progress = self.trainings.progress_map(training).await?;
        let total_agents = self.agents.list_agents().await?.len();

        Ok(training_completion(&material, &progress, total_agents))
    }

    /// Performance figures and question distributions for one quiz.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-managers, `UnknownQuiz` when the quiz
    /// does not exist, or a storage error.
    pub async fn quiz_report(
        &self,
        viewer: &Agent,
        quiz: QuizId,
    ) -> Result<QuizReport, AnalyticsServiceError> {
        Self::require_manager(viewer)?;

        let quiz = self
            .quizzes
            .get_quiz(quiz)
            .await?
            .ok_or(AnalyticsServiceError::UnknownQuiz)?;
        let history = self.results.results_for_quiz(quiz.id()).await?;

        let stats = assessment_performance(&quiz, &history);
        let questions = quiz
            .questions()
            .iter()
            .map(|q| question_breakdown(q, &history))
            .collect();

        Ok(QuizReport { stats, questions })
    }

    /// Per-agent performance figures.
    ///
    /// Managers may inspect any agent; an agent may only inspect themselves.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when a non-manager asks about someone else,
    /// `UnknownAgent` for a missing subject, or a storage error.
    pub async fn agent_report(
        &self,
        viewer: &Agent,
        subject: AgentId,
    ) -> Result<AgentStats, AnalyticsServiceError> {
        if !viewer.is_manager() && viewer.id() != subject {
            return Err(AnalyticsServiceError::Forbidden);
        }

        let agent = self
            .agents
            .get_agent(subject)
            .await?
            .ok_or(AnalyticsServiceError::UnknownAgent)?;
        let history = self.results.results_for_agent(subject).await?;

        Ok(agent_performance(&agent, &history))
    }

    /// Per-agent table for every registered agent.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-managers or a storage error.
    pub async fn agent_table(
        &self,
        viewer: &Agent,
    ) -> Result<Vec<AgentStats>, AnalyticsServiceError> {
        Self::require_manager(viewer)?;

        let agents = self.agents.list_agents().await?;
        let history = self.results.list_results().await?;

        Ok(agents
            .iter()
            .map(|a| agent_performance(a, &history))
            .collect())
    }

    /// Portal-wide counters for the dashboard header.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-managers or a storage error.
    pub async fn overview(&self, viewer: &Agent) -> Result<OverviewReport, AnalyticsServiceError> {
        Self::require_manager(viewer)?;

        let agents = self.agents.list_agents().await?;
        let quizzes = self.quizzes.list_quizzes().await?;
        let modules = self.trainings.list_trainings().await?;
        let history = self.results.list_results().await?;

        let overall_avg_pct = if history.is_empty() {
            0.0
        } else {
            history.iter().map(|r| r.percentage()).sum::<f64>() / history.len() as f64
        };

        Ok(OverviewReport {
            agent_count: agents.len(),
            module_count: modules.len(),
            quiz_count: quizzes.len(),
            total_attempts: history.len(),
            overall_avg_pct,
        })
    }
}
