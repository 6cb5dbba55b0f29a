use portal_core::model::{Quiz, QuizId};

use super::SqliteRepository;
use super::mapping::{encode_questions, id_to_i64, map_quiz_row};
use crate::repository::{QuizRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let questions = encode_questions(quiz.questions())?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, description, visible, questions)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                visible = excluded.visible,
                questions = excluded.questions
            ",
        )
        .bind(id_to_i64("quiz id", quiz.id().value())?)
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(i64::from(quiz.is_visible()))
        .bind(questions)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, visible, questions
            FROM quizzes WHERE id = ?1
            ",
        )
        .bind(id_to_i64("quiz id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_quiz_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, visible, questions
            FROM quizzes
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(map_quiz_row(&row)?);
        }
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id_to_i64("quiz id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
