use portal_core::model::{AgentId, AssessmentResult, QuizId};

use super::SqliteRepository;
use super::mapping::{encode_answers, id_to_i64, map_result_row};
use crate::repository::{ResultRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

const SELECT_COLUMNS: &str = "id, quiz_id, quiz_title, agent_id, agent_name, score, \
     total_questions, percentage, completed_at, duration_secs, answers";

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &AssessmentResult) -> Result<(), StorageError> {
        let answers = encode_answers(result.answers())?;

        let res = sqlx::query(
            r"
            INSERT INTO results
                (id, quiz_id, quiz_title, agent_id, agent_name, score, total_questions,
                 percentage, completed_at, duration_secs, answers)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(result.id().to_string())
        .bind(id_to_i64("quiz id", result.quiz_id().value())?)
        .bind(result.quiz_title())
        .bind(id_to_i64("agent id", result.agent_id().value())?)
        .bind(result.agent_name())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(result.percentage())
        .bind(result.completed_at())
        .bind(i64::from(result.duration_secs()))
        .bind(answers)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(e) => Err(conn(e)),
        }
    }

    async fn list_results(&self) -> Result<Vec<AssessmentResult>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM results ORDER BY rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn results_for_quiz(&self, quiz: QuizId) -> Result<Vec<AssessmentResult>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM results WHERE quiz_id = ?1 ORDER BY rowid ASC"
        ))
        .bind(id_to_i64("quiz id", quiz.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn results_for_agent(
        &self,
        agent: AgentId,
    ) -> Result<Vec<AssessmentResult>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM results WHERE agent_id = ?1 ORDER BY rowid ASC"
        ))
        .bind(id_to_i64("agent id", agent.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
