use std::collections::HashMap;

use sqlx::Row;

use portal_core::model::{AgentId, TrainingId, TrainingMaterial, TrainingProgress};

use super::SqliteRepository;
use super::mapping::{
    agent_id_from_i64, encode_steps, id_to_i64, map_progress_row, map_training_row,
};
use crate::repository::{StorageError, TrainingRepository};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl TrainingRepository for SqliteRepository {
    async fn upsert_training(&self, material: &TrainingMaterial) -> Result<(), StorageError> {
        let steps = encode_steps(material.steps())?;

        sqlx::query(
            r"
            INSERT INTO trainings (id, title, description, visible, steps)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                visible = excluded.visible,
                steps = excluded.steps
            ",
        )
        .bind(id_to_i64("training id", material.id().value())?)
        .bind(material.title())
        .bind(material.description())
        .bind(i64::from(material.is_visible()))
        .bind(steps)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_training(&self, id: TrainingId) -> Result<Option<TrainingMaterial>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, visible, steps
            FROM trainings WHERE id = ?1
            ",
        )
        .bind(id_to_i64("training id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_training_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_trainings(&self) -> Result<Vec<TrainingMaterial>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, visible, steps
            FROM trainings
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut materials = Vec::with_capacity(rows.len());
        for row in rows {
            materials.push(map_training_row(&row)?);
        }
        Ok(materials)
    }

    async fn delete_training(&self, id: TrainingId) -> Result<(), StorageError> {
        // Progress rows go with the module via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM trainings WHERE id = ?1")
            .bind(id_to_i64("training id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
    ) -> Result<Option<TrainingProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current_step, percent, completed
            FROM training_progress
            WHERE training_id = ?1 AND agent_id = ?2
            ",
        )
        .bind(id_to_i64("training id", training.value())?)
        .bind(id_to_i64("agent id", agent.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_progress_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn set_progress(
        &self,
        training: TrainingId,
        agent: AgentId,
        progress: &TrainingProgress,
    ) -> Result<(), StorageError> {
        let current_step = i64::try_from(progress.current_step())
            .map_err(|_| StorageError::Serialization("current_step overflow".into()))?;

        sqlx::query(
            r"
            INSERT INTO training_progress (training_id, agent_id, current_step, percent, completed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(training_id, agent_id) DO UPDATE SET
                current_step = excluded.current_step,
                percent = excluded.percent,
                completed = excluded.completed
            ",
        )
        .bind(id_to_i64("training id", training.value())?)
        .bind(id_to_i64("agent id", agent.value())?)
        .bind(current_step)
        .bind(i64::from(progress.percent()))
        .bind(i64::from(progress.is_completed()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn progress_map(
        &self,
        training: TrainingId,
    ) -> Result<HashMap<AgentId, TrainingProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT agent_id, current_step, percent, completed
            FROM training_progress
            WHERE training_id = ?1
            ",
        )
        .bind(id_to_i64("training id", training.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in rows {
            let agent = agent_id_from_i64(
                row.try_get("agent_id")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            )?;
            map.insert(agent, map_progress_row(&row)?);
        }
        Ok(map)
    }
}
