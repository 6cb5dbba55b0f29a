use portal_core::model::{Agent, AgentId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_agent_row};
use crate::repository::{AgentRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl AgentRepository for SqliteRepository {
    async fn upsert_agent(&self, agent: &Agent) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO agents (id, name, email, role)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role
            ",
        )
        .bind(id_to_i64("agent id", agent.id().value())?)
        .bind(agent.name())
        .bind(agent.email())
        .bind(agent.role().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, role
            FROM agents WHERE id = ?1
            ",
        )
        .bind(id_to_i64("agent id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_agent_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, role
            FROM agents
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut agents = Vec::with_capacity(rows.len());
        for row in rows {
            agents.push(map_agent_row(&row)?);
        }
        Ok(agents)
    }

    async fn delete_agent(&self, id: AgentId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM agents WHERE id = ?1")
            .bind(id_to_i64("agent id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
