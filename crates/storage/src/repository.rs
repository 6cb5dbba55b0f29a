use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use portal_core::model::{
    Agent, AgentId, AssessmentResult, Quiz, QuizId, ResultId, TrainingId, TrainingMaterial,
    TrainingProgress,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for agent identities.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Persist or update an agent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the agent cannot be stored.
    async fn upsert_agent(&self, agent: &Agent) -> Result<(), StorageError>;

    /// Fetch an agent by ID, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, StorageError>;

    /// List all agents, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn list_agents(&self) -> Result<Vec<Agent>, StorageError>;

    /// Remove an agent. Historical assessment results are left untouched;
    /// they carry their own name snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the agent does not exist.
    async fn delete_agent(&self, id: AgentId) -> Result<(), StorageError>;
}

/// Repository contract for quizzes.
///
/// Implementations may store the question list as a single encoded blob;
/// callers always see the decoded `Quiz` with its canonical `Vec<Question>`.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist or update a quiz, questions included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List all quizzes (visible or not), ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;

    /// Remove a quiz. Historical results referencing it persist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;
}

/// Repository contract for training modules and per-agent progress.
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Persist or update a training module, steps included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn upsert_training(&self, material: &TrainingMaterial) -> Result<(), StorageError>;

    /// Fetch a training module by ID, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn get_training(&self, id: TrainingId) -> Result<Option<TrainingMaterial>, StorageError>;

    /// List all training modules, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn list_trainings(&self) -> Result<Vec<TrainingMaterial>, StorageError>;

    /// Remove a training module and all progress recorded against it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn delete_training(&self, id: TrainingId) -> Result<(), StorageError>;

    /// Stored progress for one (agent, module) pair. `None` means the agent
    /// has never opened the module; defaulting is the tracker's job.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn get_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
    ) -> Result<Option<TrainingProgress>, StorageError>;

    /// Upsert progress for one (agent, module) pair. Writing the same state
    /// twice is harmless; trackers rely on that for retry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn set_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
        progress: &TrainingProgress,
    ) -> Result<(), StorageError>;

    /// Full progress map for a module, keyed by agent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn progress_map(
        &self,
        training: TrainingId,
    ) -> Result<HashMap<AgentId, TrainingProgress>, StorageError>;
}

/// Repository contract for the append-only assessment history.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append one immutable result. There is no update path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result with the same id already
    /// exists (retry of an already-applied submission).
    async fn append_result(&self, result: &AssessmentResult) -> Result<(), StorageError>;

    /// Full history, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn list_results(&self) -> Result<Vec<AssessmentResult>, StorageError>;

    /// History filtered to one quiz, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn results_for_quiz(&self, quiz: QuizId) -> Result<Vec<AssessmentResult>, StorageError>;

    /// History filtered to one agent, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or decoding failures.
    async fn results_for_agent(
        &self,
        agent: AgentId,
    ) -> Result<Vec<AssessmentResult>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    agents: Arc<Mutex<HashMap<AgentId, Agent>>>,
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    trainings: Arc<Mutex<HashMap<TrainingId, TrainingMaterial>>>,
    progress: Arc<Mutex<HashMap<(TrainingId, AgentId), TrainingProgress>>>,
    results: Arc<Mutex<Vec<AssessmentResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        mutex
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl AgentRepository for InMemoryRepository {
    async fn upsert_agent(&self, agent: &Agent) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.agents)?;
        guard.insert(agent.id(), agent.clone());
        Ok(())
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, StorageError> {
        let guard = Self::lock(&self.agents)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, StorageError> {
        let guard = Self::lock(&self.agents)?;
        let mut agents: Vec<Agent> = guard.values().cloned().collect();
        agents.sort_by_key(Agent::id);
        Ok(agents)
    }

    async fn delete_agent(&self, id: AgentId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.agents)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.quizzes)?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        let mut quizzes: Vec<Quiz> = guard.values().cloned().collect();
        quizzes.sort_by_key(Quiz::id);
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.quizzes)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl TrainingRepository for InMemoryRepository {
    async fn upsert_training(&self, material: &TrainingMaterial) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.trainings)?;
        guard.insert(material.id(), material.clone());
        Ok(())
    }

    async fn get_training(&self, id: TrainingId) -> Result<Option<TrainingMaterial>, StorageError> {
        let guard = Self::lock(&self.trainings)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_trainings(&self) -> Result<Vec<TrainingMaterial>, StorageError> {
        let guard = Self::lock(&self.trainings)?;
        let mut trainings: Vec<TrainingMaterial> = guard.values().cloned().collect();
        trainings.sort_by_key(TrainingMaterial::id);
        Ok(trainings)
    }

    async fn delete_training(&self, id: TrainingId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.trainings)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        // cascade: progress rows die with the module
        let mut progress = Self::lock(&self.progress)?;
        progress.retain(|(training, _), _| *training != id);
        Ok(())
    }

    async fn get_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
    ) -> Result<Option<TrainingProgress>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard.get(&(training, agent)).copied())
    }

    async fn set_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
        progress: &TrainingProgress,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        guard.insert((training, agent), *progress);
        Ok(())
    }

    async fn progress_map(
        &self,
        training: TrainingId,
    ) -> Result<HashMap<AgentId, TrainingProgress>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        Ok(guard
            .iter()
            .filter(|((t, _), _)| *t == training)
            .map(|((_, agent), progress)| (*agent, *progress))
            .collect())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &AssessmentResult) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.results)?;
        if guard.iter().any(|r| r.id() == result.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(result.clone());
        Ok(())
    }

    async fn list_results(&self) -> Result<Vec<AssessmentResult>, StorageError> {
        let guard = Self::lock(&self.results)?;
        Ok(guard.clone())
    }

    async fn results_for_quiz(&self, quiz: QuizId) -> Result<Vec<AssessmentResult>, StorageError> {
        let guard = Self::lock(&self.results)?;
        Ok(guard.iter().filter(|r| r.quiz_id() == quiz).cloned().collect())
    }

    async fn results_for_agent(
        &self,
        agent: AgentId,
    ) -> Result<Vec<AssessmentResult>, StorageError> {
        let guard = Self::lock(&self.results)?;
        Ok(guard
            .iter()
            .filter(|r| r.agent_id() == agent)
            .cloned()
            .collect())
    }
}

/// Aggregates the portal repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub agents: Arc<dyn AgentRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub trainings: Arc<dyn TrainingRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let agents: Arc<dyn AgentRepository> = Arc::new(repo.clone());
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let trainings: Arc<dyn TrainingRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            agents,
            quizzes,
            trainings,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{AgentRole, Question, QuestionId, ResultError, ResultId, TrainingStep};
    use portal_core::time::fixed_now;
    use std::collections::HashMap;

    fn build_agent(id: u64) -> Agent {
        Agent::new(
            AgentId::new(id),
            format!("Agent {id}"),
            format!("agent{id}@example.org"),
            AgentRole::Agent,
        )
        .unwrap()
    }

    fn build_quiz(id: u64) -> Quiz {
        let question = Question::new(
            QuestionId::new(1),
            "Main vector of dengue?",
            vec!["Aedes aegypti".into(), "Culex".into()],
            0,
            None,
        )
        .unwrap();
        Quiz::new(QuizId::new(id), format!("Quiz {id}"), None, vec![question], true).unwrap()
    }

    fn build_result(agent: u64, quiz: u64) -> Result<AssessmentResult, ResultError> {
        AssessmentResult::new(
            ResultId::generate(),
            QuizId::new(quiz),
            "Quiz",
            AgentId::new(agent),
            format!("Agent {agent}"),
            1,
            2,
            fixed_now(),
            60,
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn round_trips_agents_and_quizzes() {
        let repo = InMemoryRepository::new();
        let agent = build_agent(1);
        repo.upsert_agent(&agent).await.unwrap();
        assert_eq!(repo.get_agent(agent.id()).await.unwrap(), Some(agent));

        let quiz = build_quiz(1);
        repo.upsert_quiz(&quiz).await.unwrap();
        let fetched = repo.get_quiz(quiz.id()).await.unwrap().unwrap();
        assert_eq!(fetched.question_count(), 1);
    }

    #[tokio::test]
    async fn missing_progress_reads_as_none() {
        let repo = InMemoryRepository::new();
        let got = repo
            .get_progress(TrainingId::new(1), AgentId::new(1))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn progress_upsert_is_idempotent() {
        let repo = InMemoryRepository::new();
        let progress = TrainingProgress::at_step(2, 4, false);
        repo.set_progress(TrainingId::new(1), AgentId::new(1), &progress)
            .await
            .unwrap();
        repo.set_progress(TrainingId::new(1), AgentId::new(1), &progress)
            .await
            .unwrap();

        let got = repo
            .get_progress(TrainingId::new(1), AgentId::new(1))
            .await
            .unwrap();
        assert_eq!(got, Some(progress));
    }

    #[tokio::test]
    async fn deleting_training_cascades_progress() {
        let repo = InMemoryRepository::new();
        let material = TrainingMaterial::new(
            TrainingId::new(1),
            "Vector Control",
            None,
            vec![TrainingStep::content("Intro", "", None).unwrap()],
            true,
        )
        .unwrap();
        repo.upsert_training(&material).await.unwrap();
        repo.set_progress(material.id(), AgentId::new(1), &TrainingProgress::start())
            .await
            .unwrap();

        repo.delete_training(material.id()).await.unwrap();

        assert!(repo.get_training(material.id()).await.unwrap().is_none());
        assert!(repo
            .get_progress(material.id(), AgentId::new(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn results_are_append_only_with_id_conflict() {
        let repo = InMemoryRepository::new();
        let result = build_result(1, 1).unwrap();
        repo.append_result(&result).await.unwrap();

        let err = repo.append_result(&result).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.list_results().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn results_survive_quiz_deletion() {
        let repo = InMemoryRepository::new();
        let quiz = build_quiz(1);
        repo.upsert_quiz(&quiz).await.unwrap();
        repo.append_result(&build_result(1, 1).unwrap()).await.unwrap();

        repo.delete_quiz(quiz.id()).await.unwrap();

        let history = repo.results_for_quiz(QuizId::new(1)).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn result_filters_by_agent_and_quiz() {
        let repo = InMemoryRepository::new();
        repo.append_result(&build_result(1, 1).unwrap()).await.unwrap();
        repo.append_result(&build_result(2, 1).unwrap()).await.unwrap();
        repo.append_result(&build_result(1, 2).unwrap()).await.unwrap();

        assert_eq!(repo.results_for_agent(AgentId::new(1)).await.unwrap().len(), 2);
        assert_eq!(repo.results_for_quiz(QuizId::new(1)).await.unwrap().len(), 2);
    }
}
