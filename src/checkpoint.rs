//! Postgres checkpoint adapter.
//!
//! This is deliberately a thin adapter: it decides *when* a checkpoint row is
//! written ([`CheckpointAt`]) and handles the serialization and upsert, nothing
//! more. Construction uses a lazy pool so a graph can be wired up before the
//! database container has even started.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::instrument;

use crate::config::PgSettings;
use crate::message::Message;

/// When checkpoints are persisted during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckpointAt {
    /// Persist after every execution step.
    #[default]
    EndOfStep,
    /// Persist once, when the run finishes or pauses.
    EndOfRun,
}

/// A snapshot of a thread's transcript after a given step.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub thread_id: String,
    pub step: u64,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(thread_id: &str, step: u64, messages: &[Message]) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            step,
            messages: messages.to_vec(),
            created_at: Utc::now(),
        }
    }
}

/// Serde-friendly persisted shape, decoupled from the in-memory checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedCheckpoint {
    pub thread_id: String,
    pub step: u64,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// RFC3339 string form of creation time.
    pub created_at: String,
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            thread_id: cp.thread_id.clone(),
            step: cp.step,
            messages: cp.messages.clone(),
            created_at: cp.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointError {
    #[error("checkpoint serialization failed: {source}")]
    #[diagnostic(code(graphstudio::checkpoint::serde))]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint backend error: {message}")]
    #[diagnostic(
        code(graphstudio::checkpoint::backend),
        help("Is the postgres service from docker/docker-compose.yml running?")
    )]
    Backend { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Postgres-backed checkpoint writer attached to a compiled graph at startup.
pub struct PostgresCheckpoint {
    pool: PgPool,
    at: CheckpointAt,
}

impl std::fmt::Debug for PostgresCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCheckpoint")
            .field("at", &self.at)
            .finish()
    }
}

impl PostgresCheckpoint {
    /// Build the adapter without touching the database; the first `save`
    /// establishes the connection.
    pub fn new(settings: &PgSettings, at: CheckpointAt) -> Result<Self> {
        let pool = PgPool::connect_lazy(&settings.url()).map_err(|e| CheckpointError::Backend {
            message: format!("invalid connection settings: {e}"),
        })?;
        Ok(Self { pool, at })
    }

    #[must_use]
    pub fn at(&self) -> CheckpointAt {
        self.at
    }

    /// Upsert the checkpoint row for `(thread_id, step)`.
    #[instrument(skip(self, checkpoint), err)]
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let persisted = PersistedCheckpoint::from(checkpoint);
        let state_json =
            serde_json::to_string(&persisted).map_err(|source| CheckpointError::Serde { source })?;

        sqlx::query(
            r#"
            INSERT INTO steps (thread_id, step, state_json)
            VALUES ($1, $2, $3::jsonb)
            ON CONFLICT (thread_id, step) DO UPDATE SET
                state_json = EXCLUDED.state_json,
                created_at = NOW()
            "#,
        )
        .bind(&checkpoint.thread_id)
        .bind(checkpoint.step as i64)
        .bind(&state_json)
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointError::Backend {
            message: format!("insert step: {e}"),
        })?;

        Ok(())
    }

    /// Load the latest persisted checkpoint for a thread, if any.
    #[instrument(skip(self), err)]
    pub async fn load_latest(&self, thread_id: &str) -> Result<Option<PersistedCheckpoint>> {
        let row = sqlx::query(
            r#"
            SELECT state_json
            FROM steps
            WHERE thread_id = $1
            ORDER BY step DESC
            LIMIT 1
            "#,
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CheckpointError::Backend {
            message: format!("select latest step: {e}"),
        })?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: serde_json::Value =
            row.try_get("state_json")
                .map_err(|e| CheckpointError::Backend {
                    message: format!("decode state_json: {e}"),
                })?;
        let persisted = serde_json::from_value(value)
            .map_err(|source| CheckpointError::Serde { source })?;
        Ok(Some(persisted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape_round_trips() {
        let cp = Checkpoint::new("t1", 3, &[Message::user("hi"), Message::assistant("hello")]);
        let persisted = PersistedCheckpoint::from(&cp);
        let json = serde_json::to_string(&persisted).unwrap();
        let back: PersistedCheckpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, persisted);
        assert_eq!(back.step, 3);
        assert_eq!(back.messages.len(), 2);
    }

    #[tokio::test]
    async fn lazy_construction_needs_no_database() {
        let cp = PostgresCheckpoint::new(&PgSettings::local_stack(), CheckpointAt::EndOfStep)
            .expect("lazy pool construction should not connect");
        assert_eq!(cp.at(), CheckpointAt::EndOfStep);
    }
}
