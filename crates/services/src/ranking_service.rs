use std::sync::Arc;

use portal_core::model::{AssessmentResult, QuizId};
use portal_core::ranking::{GeneralRankingEntry, assessment_ranking, general_ranking};
use storage::repository::{AgentRepository, ResultRepository};

use crate::error::RankingServiceError;

/// Loads fresh snapshots from storage and delegates to the pure ranking
/// functions. Nothing is cached; every call recomputes from full history.
#[derive(Clone)]
pub struct RankingService {
    agents: Arc<dyn AgentRepository>,
    results: Arc<dyn ResultRepository>,
}

impl RankingService {
    #[must_use]
    pub fn new(agents: Arc<dyn AgentRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self { agents, results }
    }

    /// General leaderboard across all quizzes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if agents or history cannot be loaded.
    pub async fn general(&self) -> Result<Vec<GeneralRankingEntry>, RankingServiceError> {
        let agents = self.agents.list_agents().await?;
        let history = self.results.list_results().await?;
        Ok(general_ranking(&agents, &history))
    }

    /// Personal-best leaderboard for one quiz.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the history cannot be loaded.
    pub async fn for_quiz(
        &self,
        quiz: QuizId,
    ) -> Result<Vec<AssessmentResult>, RankingServiceError> {
        let history = self.results.results_for_quiz(quiz).await?;
        Ok(assessment_ranking(quiz, &history))
    }
}
