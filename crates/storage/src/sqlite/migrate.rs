use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema (agents, quizzes with encoded questions, training
/// modules with encoded steps, per-agent progress, the append-only result
/// history, and indexes).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS agents (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    role TEXT NOT NULL CHECK (role IN ('agent', 'manager'))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Questions live in a single encoded JSON column; decoding back to
        // the canonical Vec<Question> happens in the row mapper.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quizzes (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    visible INTEGER NOT NULL CHECK (visible IN (0, 1)),
                    questions TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS trainings (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    visible INTEGER NOT NULL CHECK (visible IN (0, 1)),
                    steps TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS training_progress (
                    training_id INTEGER NOT NULL,
                    agent_id INTEGER NOT NULL,
                    current_step INTEGER NOT NULL CHECK (current_step >= 0),
                    percent INTEGER NOT NULL CHECK (percent BETWEEN 0 AND 100),
                    completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
                    PRIMARY KEY (training_id, agent_id),
                    FOREIGN KEY (training_id) REFERENCES trainings(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Results deliberately carry no foreign keys: history must outlive
        // quiz and agent deletion, interpreted via its own snapshots.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS results (
                    id TEXT PRIMARY KEY,
                    quiz_id INTEGER NOT NULL,
                    quiz_title TEXT NOT NULL,
                    agent_id INTEGER NOT NULL,
                    agent_name TEXT NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    percentage REAL NOT NULL,
                    completed_at TEXT NOT NULL,
                    duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
                    answers TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_results_quiz ON results(quiz_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_results_agent ON results(agent_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (1, ?1)")
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
