use std::sync::Arc;

use portal_core::model::{AgentId, TrainingId, TrainingProgress};
use storage::repository::TrainingRepository;

use super::session::{StepOutcome, TrainingSession};
use crate::error::TrainingServiceError;

/// Orchestrates training sessions against persisted progress.
///
/// Loads the module and the agent's progress (defaulting lazily when the
/// agent has never opened it), and writes the new progress back after every
/// successful transition. The upsert is idempotent, so a retried write of
/// the same step is harmless.
#[derive(Clone)]
pub struct TrainingTrackerService {
    trainings: Arc<dyn TrainingRepository>,
}

impl TrainingTrackerService {
    #[must_use]
    pub fn new(trainings: Arc<dyn TrainingRepository>) -> Self {
        Self { trainings }
    }

    /// Opens a session for one (agent, module) pair.
    ///
    /// # Errors
    ///
    /// Returns `TrainingServiceError::UnknownModule` when the module does not
    /// exist, `Empty` when it has no steps, or a storage error.
    pub async fn open_session(
        &self,
        training: TrainingId,
        agent: AgentId,
    ) -> Result<TrainingSession, TrainingServiceError> {
        let material = self
            .trainings
            .get_training(training)
            .await?
            .ok_or(TrainingServiceError::UnknownModule)?;

        let progress = self
            .trainings
            .get_progress(training, agent)
            .await?
            .unwrap_or_else(TrainingProgress::start);

        let session = TrainingSession::open(material, progress)?;

        // First touch materializes the lazily-defaulted progress row.
        self.trainings
            .set_progress(training, agent, &session.progress())
            .await?;

        Ok(session)
    }

    /// Advances the session and persists the new cursor position.
    ///
    /// A `Blocked` outcome writes nothing; the stored progress still
    /// matches the unchanged cursor.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new progress cannot be persisted.
    pub async fn advance(
        &self,
        session: &mut TrainingSession,
        agent: AgentId,
    ) -> Result<StepOutcome, TrainingServiceError> {
        let outcome = session.advance();
        if outcome.did_move() {
            self.persist(session, agent).await?;
        }
        Ok(outcome)
    }

    /// Retreats the session and persists the new cursor position.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new progress cannot be persisted.
    pub async fn retreat(
        &self,
        session: &mut TrainingSession,
        agent: AgentId,
    ) -> Result<StepOutcome, TrainingServiceError> {
        let outcome = session.retreat();
        if outcome.did_move() {
            self.persist(session, agent).await?;
        }
        Ok(outcome)
    }

    async fn persist(
        &self,
        session: &TrainingSession,
        agent: AgentId,
    ) -> Result<(), TrainingServiceError> {
        self.trainings
            .set_progress(session.material().id(), agent, &session.progress())
            .await?;
        Ok(())
    }
}
