use portal_core::model::{
    AgentId, Question, QuestionId, TrainingId, TrainingMaterial, TrainingStep,
};
use services::{StepOutcome, TrainingServiceError, TrainingTrackerService};
use storage::repository::{Storage, TrainingRepository};

fn check_question() -> Question {
    Question::new(
        QuestionId::new(1),
        "Where does Aedes aegypti lay its eggs?",
        vec!["Rivers".into(), "Clean standing water".into()],
        1,
        None,
    )
    .unwrap()
}

fn vector_control_module() -> TrainingMaterial {
    TrainingMaterial::new(
        TrainingId::new(1),
        "Vector Control: Aedes aegypti",
        None,
        vec![
            TrainingStep::content("Knowing the vector", "", None).unwrap(),
            TrainingStep::content("Breeding sites", "", None).unwrap(),
            TrainingStep::quiz("Quick check", "", check_question()).unwrap(),
            TrainingStep::content("Field inspection routine", "", None).unwrap(),
        ],
        true,
    )
    .unwrap()
}

async fn storage_with_module() -> Storage {
    let storage = Storage::in_memory();
    storage
        .trainings
        .upsert_training(&vector_control_module())
        .await
        .unwrap();
    storage
}

#[tokio::test]
async fn full_walkthrough_persists_every_transition() {
    let storage = storage_with_module().await;
    let tracker = TrainingTrackerService::new(storage.trainings.clone());
    let agent = AgentId::new(1);
    let training = TrainingId::new(1);

    let mut session = tracker.open_session(training, agent).await.unwrap();
    assert_eq!(session.current_index(), 0);

    // Opening materializes the default progress row.
    let stored = storage
        .trainings
        .get_progress(training, agent)
        .await
        .unwrap()
        .expect("progress row");
    assert_eq!(stored.current_step(), 0);
    assert!(!stored.is_completed());

    assert_eq!(tracker.advance(&mut session, agent).await.unwrap(), StepOutcome::Moved(1));
    assert_eq!(tracker.advance(&mut session, agent).await.unwrap(), StepOutcome::Moved(2));

    // The quiz step gates until answered correctly.
    assert_eq!(tracker.advance(&mut session, agent).await.unwrap(), StepOutcome::Blocked);
    assert!(!session.answer_quiz(0).unwrap());
    assert_eq!(tracker.advance(&mut session, agent).await.unwrap(), StepOutcome::Blocked);
    assert!(session.answer_quiz(1).unwrap());
    assert_eq!(tracker.advance(&mut session, agent).await.unwrap(), StepOutcome::Moved(3));

    // A blocked advance never wrote; the stored cursor tracks actual moves.
    let stored = storage
        .trainings
        .get_progress(training, agent)
        .await
        .unwrap()
        .expect("progress row");
    assert_eq!(stored.current_step(), 3);
    assert_eq!(stored.percent(), 75);

    assert_eq!(
        tracker.advance(&mut session, agent).await.unwrap(),
        StepOutcome::Completed
    );
    let stored = storage
        .trainings
        .get_progress(training, agent)
        .await
        .unwrap()
        .expect("progress row");
    assert!(stored.is_completed());
    assert_eq!(stored.percent(), 100);
    assert_eq!(stored.current_step(), 3);
}

#[tokio::test]
async fn resume_continues_at_stored_step() {
    let storage = storage_with_module().await;
    let tracker = TrainingTrackerService::new(storage.trainings.clone());
    let agent = AgentId::new(1);
    let training = TrainingId::new(1);

    let mut session = tracker.open_session(training, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    drop(session);

    let resumed = tracker.open_session(training, agent).await.unwrap();
    assert_eq!(resumed.current_index(), 1);
    assert!(!resumed.is_completed());
}

#[tokio::test]
async fn completed_module_reopens_for_review_without_losing_completion() {
    let storage = storage_with_module().await;
    let tracker = TrainingTrackerService::new(storage.trainings.clone());
    let agent = AgentId::new(1);
    let training = TrainingId::new(1);

    let mut session = tracker.open_session(training, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    session.answer_quiz(1).unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    assert!(session.is_completed());

    let mut review = tracker.open_session(training, agent).await.unwrap();
    assert_eq!(review.current_index(), 0);
    assert!(review.is_completed());

    // Moving around in review mode keeps the completed flag set.
    tracker.advance(&mut review, agent).await.unwrap();
    let stored = storage
        .trainings
        .get_progress(training, agent)
        .await
        .unwrap()
        .expect("progress row");
    assert!(stored.is_completed());
    assert_eq!(stored.percent(), 100);
}

#[tokio::test]
async fn retreat_onto_quiz_step_forces_reanswer() {
    let storage = storage_with_module().await;
    let tracker = TrainingTrackerService::new(storage.trainings.clone());
    let agent = AgentId::new(1);
    let training = TrainingId::new(1);

    let mut session = tracker.open_session(training, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    tracker.advance(&mut session, agent).await.unwrap();
    session.answer_quiz(1).unwrap();
    tracker.advance(&mut session, agent).await.unwrap();

    assert_eq!(
        tracker.retreat(&mut session, agent).await.unwrap(),
        StepOutcome::Moved(2)
    );
    assert!(session.is_gated());
    assert_eq!(
        tracker.advance(&mut session, agent).await.unwrap(),
        StepOutcome::Blocked
    );
}

#[tokio::test]
async fn progress_is_independent_per_agent() {
    let storage = storage_with_module().await;
    let tracker = TrainingTrackerService::new(storage.trainings.clone());
    let training = TrainingId::new(1);

    let mut first = tracker.open_session(training, AgentId::new(1)).await.unwrap();
    tracker.advance(&mut first, AgentId::new(1)).await.unwrap();

    let second = tracker.open_session(training, AgentId::new(2)).await.unwrap();
    assert_eq!(second.current_index(), 0);

    let map = storage.trainings.progress_map(training).await.unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map[&AgentId::new(1)].current_step(), 1);
    assert_eq!(map[&AgentId::new(2)].current_step(), 0);
}

#[tokio::test]
async fn unknown_module_is_reported() {
    let storage = Storage::in_memory();
    let tracker = TrainingTrackerService::new(storage.trainings.clone());

    let err = tracker
        .open_session(TrainingId::new(42), AgentId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, TrainingServiceError::UnknownModule));
}

/// Repository whose progress writes always fail, for error propagation.
struct BrokenProgressRepo;

#[async_trait::async_trait]
impl TrainingRepository for BrokenProgressRepo {
    async fn upsert_training(
        &self,
        _material: &TrainingMaterial,
    ) -> Result<(), storage::repository::StorageError> {
        Ok(())
    }

    async fn get_training(
        &self,
        _id: TrainingId,
    ) -> Result<Option<TrainingMaterial>, storage::repository::StorageError> {
        Ok(Some(vector_control_module()))
    }

    async fn list_trainings(
        &self,
    ) -> Result<Vec<TrainingMaterial>, storage::repository::StorageError> {
        Ok(vec![vector_control_module()])
    }

    async fn delete_training(
        &self,
        _id: TrainingId,
    ) -> Result<(), storage::repository::StorageError> {
        Ok(())
    }

    async fn get_progress(
        &self,
        _training: TrainingId,
        _agent: AgentId,
    ) -> Result<Option<portal_core::model::TrainingProgress>, storage::repository::StorageError>
    {
        Ok(None)
    }

    async fn set_progress(
        &self,
        _training: TrainingId,
        _agent: AgentId,
        _progress: &portal_core::model::TrainingProgress,
    ) -> Result<(), storage::repository::StorageError> {
        Err(storage::repository::StorageError::Connection(
            "write refused".into(),
        ))
    }

    async fn progress_map(
        &self,
        _training: TrainingId,
    ) -> Result<
        std::collections::HashMap<AgentId, portal_core::model::TrainingProgress>,
        storage::repository::StorageError,
    > {
        Ok(std::collections::HashMap::new())
    }
}

#[tokio::test]
async fn progress_write_failures_surface_as_storage_errors() {
    let tracker = TrainingTrackerService::new(std::sync::Arc::new(BrokenProgressRepo));

    let err = tracker
        .open_session(TrainingId::new(1), AgentId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, TrainingServiceError::Storage(_)));
}
